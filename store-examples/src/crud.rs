use std::sync::Arc;

use repository::{Repository, StoreRepository};
use serde::{Deserialize, Serialize};
use store_memory::{InMemoryFactory, StoreSchema};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Customer {
    id: Option<u32>,
    name: String,
    city: String,
}

fn customer(name: &str, city: &str) -> Customer {
    Customer {
        id: None,
        name: name.to_string(),
        city: city.to_string(),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_target(false)
        .init();

    let factory = Arc::new(InMemoryFactory::new());
    factory
        .register("crm", &[StoreSchema::with_auto_key("Customer", "id")])
        .await;

    let repo = StoreRepository::<Customer, Option<u32>>::new(
        "crm",
        "id",
        |customer: &Customer| customer.id,
        true,
        factory,
    );

    let ada = repo
        .insert(&customer("Ada", "London"))
        .await
        .expect("Insert failed")
        .expect("Store rejected the record");
    info!(id = ?ada.id, name = %ada.name, "Inserted customer");

    let grace = repo
        .insert(&customer("Grace", "Arlington"))
        .await
        .expect("Insert failed")
        .expect("Store rejected the record");
    info!(id = ?grace.id, name = %grace.name, "Inserted customer");

    let all = repo.get_all().await.expect("Get all failed");
    info!(count = all.len(), "Customers in store");

    let londoners = repo
        .get(&|customer: &Customer| customer.city == "London")
        .await
        .expect("Query failed");
    info!(count = londoners.len(), "Customers in London");

    let moved = Customer {
        city: "Cambridge".to_string(),
        ..ada.clone()
    };
    repo.update(&moved).await.expect("Update failed");
    let found = repo
        .get_by_id(&ada.id)
        .await
        .expect("Get by id failed")
        .expect("Customer disappeared");
    info!(id = ?found.id, city = %found.city, "Customer after update");

    let deleted = repo.delete(&grace).await.expect("Delete failed");
    info!(deleted, "Deleted Grace");

    let remaining = repo.get_all().await.expect("Get all failed");
    info!(count = remaining.len(), "Customers left");
}
