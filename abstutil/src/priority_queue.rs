use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Use with `BinaryHeap`. Since it's a max-heap, reverse the comparison to get the smallest cost
/// first.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PriorityQueueItem<K, V> {
    pub cost: K,
    pub value: V,
}

impl<K: Ord, V: Ord> PartialOrd for PriorityQueueItem<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, V: Ord> Ord for PriorityQueueItem<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        let ord = other.cost.cmp(&self.cost);
        if ord != Ordering::Equal {
            return ord;
        }
        // The tie-breaker is arbitrary, based on the value
        self.value.cmp(&other.value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BinaryHeap;

    use super::*;

    #[test]
    fn cheapest_first() {
        let mut queue = BinaryHeap::new();
        queue.push(PriorityQueueItem { cost: 5, value: 'a' });
        queue.push(PriorityQueueItem { cost: 1, value: 'b' });
        queue.push(PriorityQueueItem { cost: 3, value: 'c' });
        let order: Vec<char> = std::iter::from_fn(|| queue.pop().map(|item| item.value)).collect();
        assert_eq!(order, vec!['b', 'c', 'a']);
    }
}
