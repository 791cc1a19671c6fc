//! Sum tree for prioritized sampling.
//!
//! Code is adapted from https://github.com/jaromiru/AI-blog/blob/master/SumTree.py and
//! https://github.com/openai/baselines/blob/master/baselines/deepq/replay_buffer.py
use crate::error::HaliteError;
use anyhow::{bail, Result};
use segment_tree::{
    ops::{MaxIgnoreNaN, MinIgnoreNaN},
    SegmentPoint,
};

/// A fixed-capacity binary tree of priorities stored in a flat array, together
/// with a ring buffer of payloads.
///
/// The last `capacity` entries of the array are leaves holding the priority of
/// each payload slot; every internal node holds the sum of its two children, so
/// the root is the total priority. The leaf of slot `i` is `i + capacity - 1`.
///
/// Minimum and maximum leaf priorities are tracked with segment trees over the
/// written slots only.
///
/// Every write stamps its slot with a generation number that is unique over the
/// life of the tree, so a leaf index held across later writes can be checked
/// against the payload currently in the slot.
#[derive(Debug)]
pub struct PrioritySumTree<T> {
    capacity: usize,
    tree: Vec<f32>,
    data: Vec<Option<T>>,
    write_cursor: usize,
    len: usize,
    generations: Vec<u64>,
    n_writes: u64,
    min_tree: SegmentPoint<f32, MinIgnoreNaN>,
    max_tree: SegmentPoint<f32, MaxIgnoreNaN>,
}

impl<T> PrioritySumTree<T> {
    /// Creates an empty tree with `capacity` slots.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            bail!(HaliteError::InvalidArgument(
                "capacity must be positive".to_string()
            ));
        }

        Ok(Self {
            capacity,
            tree: vec![0f32; 2 * capacity - 1],
            data: (0..capacity).map(|_| None).collect(),
            write_cursor: 0,
            len: 0,
            generations: vec![0; capacity],
            n_writes: 0,
            min_tree: SegmentPoint::build(vec![f32::MAX; capacity], MinIgnoreNaN),
            max_tree: SegmentPoint::build(vec![0f32; capacity], MaxIgnoreNaN),
        })
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of written slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot has been written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of the priorities of all leaves, held at the root.
    pub fn total_priority(&self) -> f32 {
        self.tree[0]
    }

    /// All nodes of the tree, root first.
    pub fn nodes(&self) -> &[f32] {
        &self.tree
    }

    /// Leaf index of the given slot.
    pub fn leaf_index(&self, slot: usize) -> usize {
        slot + self.capacity - 1
    }

    /// Slot of the given leaf index.
    ///
    /// Fails if `leaf_index` is not a leaf.
    pub fn slot(&self, leaf_index: usize) -> Result<usize> {
        if leaf_index + 1 < self.capacity || leaf_index >= self.tree.len() {
            bail!(HaliteError::InvalidArgument(format!(
                "{} is not a leaf index of a tree with capacity {}",
                leaf_index, self.capacity
            )));
        }
        Ok(leaf_index + 1 - self.capacity)
    }

    /// Priority held at `leaf_index`.
    pub fn priority(&self, leaf_index: usize) -> Result<f32> {
        self.slot(leaf_index)?;
        Ok(self.tree[leaf_index])
    }

    /// Payload stored in `slot`, if it has been written.
    pub fn data(&self, slot: usize) -> Option<&T> {
        self.data.get(slot).and_then(Option::as_ref)
    }

    /// Returns `true` if the slot of `leaf_index` holds a payload.
    pub fn is_written(&self, leaf_index: usize) -> bool {
        match self.slot(leaf_index) {
            Ok(slot) => self.data[slot].is_some(),
            Err(_) => false,
        }
    }

    /// Generation of the payload held at `leaf_index`. Slots never written have
    /// generation 0.
    pub fn generation(&self, leaf_index: usize) -> Result<u64> {
        let slot = self.slot(leaf_index)?;
        Ok(self.generations[slot])
    }

    /// Largest priority among written slots.
    pub fn max_priority(&self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.max_tree.query(0, self.capacity))
        }
    }

    /// Smallest priority among written slots.
    pub fn min_priority(&self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.min_tree.query(0, self.capacity))
        }
    }

    /// Writes `data` to the slot under the write cursor with priority `p` and
    /// advances the cursor, overwriting the oldest slot once the tree is full.
    ///
    /// Returns the leaf index written.
    pub fn add(&mut self, p: f32, data: T) -> Result<usize> {
        check_priority(p)?;
        let slot = self.write_cursor;
        let leaf_index = self.leaf_index(slot);
        self.data[slot] = Some(data);
        self.n_writes += 1;
        self.generations[slot] = self.n_writes;
        self.set_priority(leaf_index, slot, p);

        self.write_cursor = (self.write_cursor + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }

        Ok(leaf_index)
    }

    /// Sets the priority at `leaf_index` and propagates the change to the root.
    ///
    /// Only leaves of written slots can hold a priority.
    pub fn update(&mut self, leaf_index: usize, p: f32) -> Result<()> {
        check_priority(p)?;
        let slot = self.slot(leaf_index)?;
        if self.data[slot].is_none() {
            bail!(HaliteError::InvalidArgument(format!(
                "slot {} of leaf {} has not been written",
                slot, leaf_index
            )));
        }
        self.set_priority(leaf_index, slot, p);
        Ok(())
    }

    fn set_priority(&mut self, leaf_index: usize, slot: usize, p: f32) {
        self.tree[leaf_index] = p;
        self.min_tree.modify(slot, p);
        self.max_tree.modify(slot, p);
        self.propagate(leaf_index);
    }

    // Ancestors are re-summed from their children rather than shifted by the
    // delta, so rounding error does not accumulate across updates.
    fn propagate(&mut self, ix: usize) {
        let mut ix = ix;
        while ix != 0 {
            ix = (ix - 1) / 2;
            let left = 2 * ix + 1;
            self.tree[ix] = self.tree[left] + self.tree[left + 1];
        }
    }

    /// Finds the leaf where the cumulative priority reaches `value`.
    ///
    /// Slot `i` owns the half-open range `(c_i, c_i + p_i]` of the cumulative
    /// priority, so a value exactly on a boundary resolves to the left. Empty
    /// subtrees are never entered while the total priority is positive.
    ///
    /// Returns `(leaf_index, priority, payload)`.
    pub fn get(&self, value: f32) -> Result<(usize, f32, &T)> {
        let total = self.total_priority();
        if value.is_nan() || value < 0.0 || value > total || total <= 0.0 {
            bail!(HaliteError::OutOfRange { value, total });
        }

        let mut v = value;
        let mut ix = 0;
        loop {
            let left = 2 * ix + 1;
            if left >= self.tree.len() {
                break;
            }
            let right = left + 1;
            let left_sum = self.tree[left];

            if self.tree[right] <= 0.0 || (left_sum > 0.0 && v <= left_sum) {
                ix = left;
            } else {
                v -= left_sum;
                ix = right;
            }
        }

        let slot = ix + 1 - self.capacity;
        match self.data[slot].as_ref() {
            Some(data) => Ok((ix, self.tree[ix], data)),
            None => bail!(HaliteError::OutOfRange { value, total }),
        }
    }
}

fn check_priority(p: f32) -> Result<()> {
    if !p.is_finite() || p < 0.0 {
        bail!(HaliteError::InvalidArgument(format!(
            "priority must be finite and non-negative, got {}",
            p
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn assert_sums(tree: &PrioritySumTree<usize>) {
        let nodes = tree.nodes();
        let n_internal = tree.capacity() - 1;
        for ix in 0..n_internal {
            assert_eq!(nodes[ix], nodes[2 * ix + 1] + nodes[2 * ix + 2]);
        }
        let leaf_sum: f32 = nodes[n_internal..].iter().sum();
        assert!((tree.total_priority() - leaf_sum).abs() < 1e-4);
    }

    #[test]
    fn test_sum_tree_odd() -> Result<()> {
        let data = vec![0.5f32, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9];
        let mut sum_tree = PrioritySumTree::new(8)?;
        for (i, &p) in data.iter().enumerate() {
            sum_tree.add(p, i)?;
        }

        let slot = |v: f32| -> usize { *sum_tree.get(v).unwrap().2 };
        assert_eq!(slot(0.0), 0);
        assert_eq!(slot(0.4), 0);
        assert_eq!(slot(0.5), 0);
        assert_eq!(slot(0.6), 1);
        assert_eq!(slot(1.2), 2);
        assert_eq!(slot(1.6), 3);
        assert_eq!(slot(2.0), 4);
        assert_eq!(slot(2.8), 4);
        assert_eq!(slot(sum_tree.total_priority()), 6);
        Ok(())
    }

    #[test]
    fn test_leaf_index_layout() -> Result<()> {
        let mut tree = PrioritySumTree::new(5)?;
        for i in 0..5 {
            let leaf = tree.add(1.0, i)?;
            assert_eq!(leaf, i + 4);
            assert_eq!(tree.slot(leaf)?, i);
        }
        assert!(tree.slot(3).is_err());
        assert!(tree.slot(9).is_err());
        Ok(())
    }

    #[test]
    fn test_invariants_under_random_updates() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut tree = PrioritySumTree::new(13)?;
        for i in 0..40 {
            tree.add(rng.gen_range(0.0..3.0), i)?;
            assert_sums(&tree);
            let leaf = tree.leaf_index(rng.gen_range(0..tree.len()));
            tree.update(leaf, rng.gen_range(0.0..3.0))?;
            assert_sums(&tree);
        }
        Ok(())
    }

    #[test]
    fn test_ring_buffer_overwrites_oldest() -> Result<()> {
        let mut tree = PrioritySumTree::new(4)?;
        for i in 0..6 {
            tree.add(1.0, i)?;
        }
        assert_eq!(tree.len(), 4);
        let mut stored = (0..4).filter_map(|s| tree.data(s).copied()).collect::<Vec<_>>();
        stored.sort();
        assert_eq!(stored, vec![2, 3, 4, 5]);
        assert_eq!(tree.total_priority(), 4.0);
        Ok(())
    }

    #[test]
    fn test_boundary_ties_resolve_left() -> Result<()> {
        let mut tree = PrioritySumTree::new(4)?;
        for i in 0..4 {
            tree.add(1.0, i)?;
        }
        assert_eq!(*tree.get(1.0)?.2, 0);
        assert_eq!(*tree.get(2.0)?.2, 1);
        assert_eq!(*tree.get(3.0)?.2, 2);
        assert_eq!(*tree.get(2.0001)?.2, 2);
        Ok(())
    }

    #[test]
    fn test_get_skips_empty_slots() -> Result<()> {
        let mut tree = PrioritySumTree::new(8)?;
        tree.add(2.0, 0)?;
        tree.add(0.0, 1)?;
        tree.add(1.0, 2)?;

        assert_eq!(*tree.get(0.0)?.2, 0);
        assert_eq!(*tree.get(2.5)?.2, 2);
        assert_eq!(*tree.get(3.0)?.2, 2);
        Ok(())
    }

    #[test]
    fn test_get_out_of_range() -> Result<()> {
        let mut tree = PrioritySumTree::new(2)?;
        assert!(tree.get(0.0).is_err());

        tree.add(1.0, 0)?;
        for v in [-0.1, 1.5, f32::NAN] {
            let err = tree.get(v).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<HaliteError>(),
                Some(HaliteError::OutOfRange { .. })
            ));
        }
        Ok(())
    }

    #[test]
    fn test_min_max_over_written_slots() -> Result<()> {
        let mut tree = PrioritySumTree::new(4)?;
        assert_eq!(tree.max_priority(), None);
        assert_eq!(tree.min_priority(), None);

        tree.add(0.5, 0)?;
        tree.add(2.0, 1)?;
        assert_eq!(tree.max_priority(), Some(2.0));
        assert_eq!(tree.min_priority(), Some(0.5));

        tree.update(tree.leaf_index(1), 0.1)?;
        assert_eq!(tree.max_priority(), Some(0.5));
        assert_eq!(tree.min_priority(), Some(0.1));
        Ok(())
    }

    #[test]
    fn test_update_rejects_unwritten_and_invalid() -> Result<()> {
        let mut tree = PrioritySumTree::new(4)?;
        tree.add(1.0, 0)?;
        assert!(tree.update(tree.leaf_index(2), 1.0).is_err());
        assert!(tree.update(tree.leaf_index(0), -1.0).is_err());
        assert!(tree.update(tree.leaf_index(0), f32::INFINITY).is_err());
        assert!(PrioritySumTree::<usize>::new(0).is_err());
        Ok(())
    }

    #[test]
    fn test_generation_changes_on_overwrite() -> Result<()> {
        let mut tree = PrioritySumTree::new(2)?;
        assert_eq!(tree.generation(1)?, 0);

        let leaf = tree.add(1.0, 0)?;
        let first = tree.generation(leaf)?;
        tree.update(leaf, 0.5)?;
        assert_eq!(tree.generation(leaf)?, first);

        tree.add(1.0, 1)?;
        assert_eq!(tree.add(1.0, 2)?, leaf);
        assert!(tree.generation(leaf)? > first);
        assert!(tree.generation(0).is_err());
        Ok(())
    }

    #[test]
    fn test_capacity_one() -> Result<()> {
        let mut tree = PrioritySumTree::new(1)?;
        assert_eq!(tree.add(0.7, "a")?, 0);
        assert_eq!(tree.add(0.3, "b")?, 0);
        assert_eq!(tree.total_priority(), 0.3);
        assert_eq!(tree.get(0.1)?, (0, 0.3, &"b"));
        Ok(())
    }
}
