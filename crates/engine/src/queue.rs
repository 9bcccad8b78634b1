use assemblage_kernel::Transform;

/// A candidate placement waiting in the field queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub part_name: String,
    pub parent_id: usize,
    pub parent_conn: usize,
    pub conn: usize,
    pub transform: Transform,
}

/// Candidates sorted by field value, ascending. The best candidate sits at
/// the tail so popping it is O(1).
#[derive(Debug, Clone, Default)]
pub struct AggregationQueue {
    values: Vec<f64>,
    entries: Vec<QueueEntry>,
}

impl AggregationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert left of any equal values (bisect-left).
    pub fn insert(&mut self, value: f64, entry: QueueEntry) {
        let index = self.values.partition_point(|v| *v < value);
        self.values.insert(index, value);
        self.entries.insert(index, entry);
    }

    /// Remove and return the best candidate.
    pub fn pop_max(&mut self) -> Option<(f64, QueueEntry)> {
        let value = self.values.pop()?;
        let entry = self.entries.pop()?;
        Some((value, entry))
    }

    /// Best candidate without removing it.
    pub fn peek_max(&self) -> Option<(f64, &QueueEntry)> {
        Some((*self.values.last()?, self.entries.last()?))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.entries.clear();
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(parent_id: usize) -> QueueEntry {
        QueueEntry {
            part_name: "P".into(),
            parent_id,
            parent_conn: 0,
            conn: 1,
            transform: Transform::identity(),
        }
    }

    #[test]
    fn test_values_stay_sorted_and_max_pops_first() {
        let mut q = AggregationQueue::new();
        for (i, v) in [0.5, 2.0, -1.0, 1.0].into_iter().enumerate() {
            q.insert(v, entry(i));
        }
        assert_eq!(q.values(), &[-1.0, 0.5, 1.0, 2.0]);
        let (v, e) = q.pop_max().unwrap();
        assert_eq!(v, 2.0);
        assert_eq!(e.parent_id, 1);
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_ties_pop_latest_insert_last() {
        let mut q = AggregationQueue::new();
        q.insert(1.0, entry(0));
        q.insert(1.0, entry(1));
        // bisect-left puts the newer entry in front of the older one
        assert_eq!(q.pop_max().unwrap().1.parent_id, 0);
        assert_eq!(q.pop_max().unwrap().1.parent_id, 1);
        assert!(q.pop_max().is_none());
    }
}
