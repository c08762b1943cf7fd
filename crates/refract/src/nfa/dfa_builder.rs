use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    hash::Hash,
    sync::Arc,
};

use super::{Nfa, Node};
use crate::{
    closure::ClosureSolver, dfa::Dfa, error::Result, limits::Limits, memoize::Memoize,
};

/// Subset construction over interned composite states.
///
/// Composites are `Arc<BTreeSet<N>>` — the sorted member set IS the state
/// name, so naming is a pure function of the merged sources and identical
/// across runs. The worklist is FIFO and edge maps are ordered, making the
/// whole construction reproducible.
pub struct DfaBuilder<'a, I, N> {
    nfa: &'a Nfa<I, N>,
    limits: &'a Limits,
    solver: ClosureSolver<N>,
    memo: Memoize<BTreeSet<N>>,
}

impl<'a, I: Clone + Ord, N: Clone + Ord + Hash> DfaBuilder<'a, I, N> {
    pub fn new(nfa: &'a Nfa<I, N>, limits: &'a Limits) -> Self {
        Self {
            nfa,
            limits,
            solver: ClosureSolver::default(),
            memo: Memoize::default(),
        }
    }

    fn closure(&mut self, seed: impl IntoIterator<Item = N>) -> Arc<BTreeSet<N>> {
        let set = self.nfa.closure_in(&mut self.solver, seed);
        self.memo.memoize(set)
    }

    pub fn build(&mut self) -> Result<Dfa<I, Arc<BTreeSet<N>>>> {
        let start = self.closure([self.nfa.start().clone()]);

        let mut states: BTreeMap<Arc<BTreeSet<N>>, BTreeMap<I, Arc<BTreeSet<N>>>> =
            BTreeMap::new();
        let mut accept = BTreeSet::new();
        let mut q: VecDeque<_> = [Arc::clone(&start)].into_iter().collect();

        while let Some(set) = q.pop_front() {
            self.limits.check_time()?;
            if states.contains_key(&set) {
                continue;
            }

            // Union the raw symbol moves of every member, then close each
            let mut moves: BTreeMap<I, BTreeSet<N>> = BTreeMap::new();
            for n in set.iter() {
                for (sym, dests) in self.nfa.get(n).into_iter().flat_map(Node::symbol_edges) {
                    moves
                        .entry(sym.clone())
                        .or_default()
                        .extend(dests.iter().cloned());
                }
            }

            let edges: BTreeMap<I, Arc<BTreeSet<N>>> = moves
                .into_iter()
                .map(|(sym, targets)| (sym, self.closure(targets)))
                .collect();

            if set.iter().any(|n| self.nfa.is_accept(n)) {
                accept.insert(Arc::clone(&set));
            }

            for target in edges.values() {
                if !states.contains_key(target) {
                    q.push_back(Arc::clone(target));
                }
            }

            states.insert(set, edges);
            self.limits.check_states(states.len())?;
        }

        Ok(Dfa::new(
            states,
            self.nfa.alphabet().clone(),
            start,
            accept,
        ))
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use proptest::prelude::*;

    use crate::{error::Error, limits::Limits, nfa::Nfa, re, testing};

    fn branch_nfa() -> Nfa<char, u64> {
        // 0 -a-> 1, 0 -a-> 2, 1 -b-> 3, 2 -b-> 3(accept)
        let mut nfa = Nfa::new(0);
        for n in 1..=3 {
            nfa.insert(n);
        }
        nfa.connect(&0, 1, Some('a'));
        nfa.connect(&0, 2, Some('a'));
        nfa.connect(&1, 3, Some('b'));
        nfa.connect(&2, 3, Some('b'));
        nfa.mark_accept(3);
        nfa
    }

    #[test]
    fn merges_branches() {
        let dfa = branch_nfa().determinize(&Limits::default()).unwrap();
        assert_eq!(dfa.state_count(), 3);
        assert!(dfa.accepts("ab".chars()));
        assert!(!dfa.accepts("a".chars()));
        assert!(!dfa.accepts("abb".chars()));
    }

    #[test]
    fn epsilon_closed_start() {
        // 0 -ε-> 1 -a-> 2(accept)
        let mut nfa = Nfa::new(0);
        nfa.insert(1);
        nfa.insert(2);
        nfa.connect(&0, 1, None);
        nfa.connect(&1, 2, Some('a'));
        nfa.mark_accept(2);

        let dfa = nfa.determinize(&Limits::default()).unwrap();
        assert!(dfa.accepts("a".chars()));
        assert!(!dfa.accepts("".chars()));
        assert!(dfa.start().contains(&0) && dfa.start().contains(&1));
    }

    #[test]
    fn composite_names_are_reproducible() {
        let nfa = branch_nfa();
        let a = nfa.determinize(&Limits::default()).unwrap();
        let b = nfa.determinize(&Limits::default()).unwrap();

        assert_eq!(a, b);
        assert_eq!(
            a.atomize_states().0,
            b.atomize_states().0
        );
    }

    #[test]
    fn state_limit_aborts() {
        let limits = Limits::new(Some(1), None);
        assert_eq!(
            branch_nfa().determinize(&limits),
            Err(Error::StateLimit { limit: 1 })
        );
    }

    #[test]
    fn zero_budget_aborts() {
        let limits = Limits::new(None, Some(Duration::ZERO));
        assert_eq!(
            branch_nfa().determinize(&limits),
            Err(Error::Timeout {
                budget: Duration::ZERO
            })
        );
    }

    proptest! {
        #[test]
        fn preserves_language(r in re::re(4, 16, 3, prop::sample::select(vec!['a', 'b']))) {
            let nfa = r.compile();
            let dfa = nfa.determinize(&Limits::default()).unwrap();

            for s in testing::strings(&['a', 'b'], 4) {
                prop_assert_eq!(
                    nfa.accepts(s.iter().copied()),
                    dfa.accepts(s.iter().copied()),
                    "string {:?}",
                    s
                );
            }
        }
    }
}
