//! Query filters for repository scans.

/// Narrows, reorders or otherwise reshapes a full store scan.
///
/// Any `Fn(&E) -> bool` predicate is a filter for free; implement the trait
/// directly when a query also needs to sort or paginate.
pub trait QueryFilter<E>: Send + Sync {
    /// Consumes the scanned entities and returns the selected ones.
    fn apply(&self, entities: Vec<E>) -> Vec<E>;
}

impl<E, F> QueryFilter<E> for F
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn apply(&self, entities: Vec<E>) -> Vec<E> {
        entities.into_iter().filter(|entity| self(entity)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_keeps_matching_entities() {
        let even = |n: &i32| n % 2 == 0;
        assert_eq!(even.apply(vec![1, 2, 3, 4]), vec![2, 4]);
    }

    #[test]
    fn test_filter_can_reorder() {
        struct Reverse;

        impl QueryFilter<i32> for Reverse {
            fn apply(&self, entities: Vec<i32>) -> Vec<i32> {
                entities.into_iter().rev().collect()
            }
        }

        assert_eq!(Reverse.apply(vec![1, 2, 3]), vec![3, 2, 1]);
    }
}
