use std::collections::{BTreeSet, VecDeque};

/// Reusable worklist computing least fixed points of a successor relation.
///
/// The visited set doubles as the result, so cyclic successor graphs
/// terminate. Results are ordered sets; every downstream tie-break relies on
/// that.
#[derive(Debug)]
#[repr(transparent)]
pub struct ClosureSolver<T>(VecDeque<T>);

impl<T> Default for ClosureSolver<T> {
    #[inline]
    fn default() -> Self { Self(VecDeque::new()) }
}

impl<T: Clone + Ord> ClosureSolver<T> {
    /// Least fixed point of `seed ∪ succ(·)`, accumulated into `set`.
    pub fn solve_into<I: IntoIterator<Item = T>>(
        &mut self,
        set: &mut BTreeSet<T>,
        seed: impl IntoIterator<Item = T>,
        succ: impl Fn(&T) -> I,
    ) {
        debug_assert!(self.0.is_empty());
        self.0.extend(seed);

        while let Some(el) = self.0.pop_front() {
            if set.insert(el.clone()) {
                self.0.extend(succ(&el));
            }
        }
    }

    #[inline]
    pub fn solve<I: IntoIterator<Item = T>>(
        &mut self,
        seed: impl IntoIterator<Item = T>,
        succ: impl Fn(&T) -> I,
    ) -> BTreeSet<T> {
        let mut set = BTreeSet::new();
        self.solve_into(&mut set, seed, succ);
        set
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use super::ClosureSolver;

    #[test]
    fn chain() {
        let mut solver = ClosureSolver::default();
        let set = solver.solve([0u64], |&n| if n < 3 { vec![n + 1] } else { vec![] });
        assert_eq!(set, BTreeSet::from([0, 1, 2, 3]));
    }

    #[test]
    fn cycle_terminates() {
        let mut solver = ClosureSolver::default();
        let set = solver.solve([0u64], |&n| vec![(n + 1) % 4]);
        assert_eq!(set, BTreeSet::from([0, 1, 2, 3]));
    }

    #[test]
    fn accumulates_into_existing_set() {
        let mut solver = ClosureSolver::default();
        let mut set = BTreeSet::from([9]);
        solver.solve_into(&mut set, [1u64], |_| vec![]);
        assert_eq!(set, BTreeSet::from([1, 9]));
    }
}
