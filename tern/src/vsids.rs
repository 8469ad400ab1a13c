//! The VSIDS branching heuristic.
//!
//! VSIDS (Variable State Independent Decaying Sum) keeps an activity value per variable. During
//! each conflict analysis the variables taking part in the resolution are bumped by a constant,
//! and afterwards all activities decay by a factor below one. Decisions branch on the unassigned
//! variable of highest activity.
//!
//! Decaying is implemented by growing the bump value instead of touching every stored activity:
//! dividing the bump by the decay factor after each conflict is equivalent up to a common scaling
//! factor, and only the order of activities matters. When any value would overflow, all
//! activities and the bump value are rescaled together.
use ordered_float::OrderedFloat;

use tern_formula::Var;

use crate::config::SolverConfig;

/// Rescale all activities when any value exceeds this bound.
const RESCALE_LIMIT: f64 = 1e100;
const RESCALE_FACTOR: f64 = 1e-100;

/// The VSIDS branching heuristic.
///
/// The heap is a binary max-heap over variables keyed by activity, with a position array for
/// membership tests and O(log n) updates. Assigned variables are not removed eagerly; they are
/// filtered out when popped and reinserted on unassignment.
pub struct Vsids {
    /// The activity of each variable.
    activity: Vec<OrderedFloat<f64>>,
    /// A binary max-heap of variables.
    heap: Vec<Var>,
    /// The position in the heap for each variable.
    position: Vec<Option<usize>>,
    /// The value to add on bumping.
    bump: f64,
    /// The inverse of the decay factor.
    inv_decay: f64,
}

impl Default for Vsids {
    fn default() -> Vsids {
        Vsids {
            activity: vec![],
            heap: vec![],
            position: vec![],
            bump: 1.0,
            inv_decay: 1.0 / SolverConfig::default().vsids_decay,
        }
    }
}

impl Vsids {
    /// Update structures for a new variable count.
    ///
    /// New variables enter the heap immediately.
    pub fn set_var_count(&mut self, count: usize) {
        let old_count = self.activity.len();
        self.activity.resize(count, OrderedFloat(0.0));
        self.position.resize(count, None);

        for index in old_count..count {
            self.make_available(Var::from_index(index));
        }
    }

    /// Change the decay factor.
    pub fn set_decay(&mut self, decay: f64) {
        assert!(decay < 1.0);
        assert!(decay > 1.0 / 16.0);
        self.inv_decay = 1.0 / decay;
    }

    /// Current activity of a variable.
    pub fn activity(&self, var: Var) -> f64 {
        self.activity[var.index()].0
    }

    /// Whether a variable is currently present in the heap.
    pub fn contains(&self, var: Var) -> bool {
        self.position[var.index()].is_some()
    }

    /// Bump a variable by increasing its activity.
    pub fn bump(&mut self, var: Var) {
        let value = &mut self.activity[var.index()];
        value.0 += self.bump;
        if value.0 > RESCALE_LIMIT {
            self.rescale();
        }

        if let Some(pos) = self.position[var.index()] {
            self.sift_up(pos);
        }
    }

    /// Decay all variable activities.
    pub fn decay(&mut self) {
        self.bump *= self.inv_decay;
        if self.bump > RESCALE_LIMIT {
            self.rescale();
        }
    }

    /// Rescale all values to avoid an overflow.
    fn rescale(&mut self) {
        for activity in &mut self.activity {
            activity.0 *= RESCALE_FACTOR;
        }
        self.bump *= RESCALE_FACTOR;
    }

    /// Insert a variable into the heap if it is not present.
    pub fn make_available(&mut self, var: Var) {
        if self.position[var.index()].is_none() {
            let pos = self.heap.len();
            self.position[var.index()] = Some(pos);
            self.heap.push(var);
            self.sift_up(pos);
        }
    }

    /// Remove and return the variable of maximal activity.
    ///
    /// May return variables that are currently assigned; the decision code skips those.
    pub fn pop_max(&mut self) -> Option<Var> {
        if self.heap.is_empty() {
            return None;
        }
        let var = self.heap.swap_remove(0);
        self.position[var.index()] = None;
        if !self.heap.is_empty() {
            let top = self.heap[0];
            self.position[top.index()] = Some(0);
            self.sift_down(0);
        }
        Some(var)
    }

    fn swap_positions(&mut self, pos_a: usize, pos_b: usize) {
        self.heap.swap(pos_a, pos_b);
        self.position[self.heap[pos_a].index()] = Some(pos_a);
        self.position[self.heap[pos_b].index()] = Some(pos_b);
    }

    /// Move a variable towards the root until the heap property holds.
    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.activity[self.heap[parent].index()] >= self.activity[self.heap[pos].index()] {
                return;
            }
            self.swap_positions(parent, pos);
            pos = parent;
        }
    }

    /// Move a variable away from the root until the heap property holds.
    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let mut largest = pos;

            for child in [pos * 2 + 1, pos * 2 + 2].iter().cloned() {
                if child < self.heap.len()
                    && self.activity[self.heap[child].index()]
                        > self.activity[self.heap[largest].index()]
                {
                    largest = child;
                }
            }

            if largest == pos {
                return;
            }

            self.swap_positions(largest, pos);
            pos = largest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_activity_order() {
        let mut vsids = Vsids::default();
        vsids.set_var_count(8);

        for i in 0..8 {
            for _ in 0..i {
                vsids.bump(Var::from_index(i));
            }
        }

        for i in (0..8).rev() {
            assert_eq!(vsids.pop_max(), Some(Var::from_index(i)));
        }
        assert_eq!(vsids.pop_max(), None);
    }

    #[test]
    fn heap_root_is_maximal_after_every_operation() {
        let mut vsids = Vsids::default();
        vsids.set_var_count(16);
        vsids.set_decay(0.5);

        let check_root = |vsids: &Vsids| {
            let root = vsids.heap[0];
            for &var in vsids.heap.iter() {
                assert!(vsids.activity[root.index()] >= vsids.activity[var.index()]);
            }
        };

        for step in 0..64usize {
            vsids.bump(Var::from_index((step * 7) % 16));
            check_root(&vsids);
            if step % 3 == 0 {
                vsids.decay();
            }
            if step % 5 == 0 {
                let var = vsids.pop_max();
                check_root(&vsids);
                if let Some(var) = var {
                    vsids.make_available(var);
                    check_root(&vsids);
                }
            }
        }
    }

    #[test]
    fn reinsertion_keeps_activities() {
        let mut vsids = Vsids::default();
        vsids.set_var_count(4);

        for _ in 0..3 {
            vsids.bump(Var::from_index(2));
        }

        while vsids.pop_max().is_some() {}
        assert!(!vsids.contains(Var::from_index(2)));

        for i in 0..4 {
            vsids.make_available(Var::from_index(i));
        }

        assert_eq!(vsids.pop_max(), Some(Var::from_index(2)));
    }

    #[test]
    fn rescale_preserves_order() {
        let mut vsids = Vsids::default();
        vsids.set_var_count(3);

        vsids.bump(Var::from_index(0));
        vsids.bump(Var::from_index(1));
        vsids.bump(Var::from_index(1));

        // force many decays so the bump value crosses the rescale limit
        for _ in 0..10000 {
            vsids.decay();
        }
        vsids.bump(Var::from_index(2));

        assert_eq!(vsids.pop_max(), Some(Var::from_index(2)));
        assert_eq!(vsids.pop_max(), Some(Var::from_index(1)));
        assert_eq!(vsids.pop_max(), Some(Var::from_index(0)));
    }
}
