use std::collections::{BTreeMap, BTreeSet};

use super::{Nfa, Node};
use crate::closure::ClosureSolver;

impl<I: Clone + Ord, N: Clone + Ord> Nfa<I, N> {
    /// Fold epsilon reachability onto ordinary transitions.
    ///
    /// For each state `s` and symbol `a`, the result's `a`-moves are the
    /// union of the `a`-moves of every member of `closure(s)`. Destinations
    /// are NOT closed again — epsilon semantics live entirely on the source
    /// side. `s` accepts iff its closure intersects the accept set.
    #[must_use]
    pub fn eliminate_epsilon(&self) -> Self {
        let mut solver = ClosureSolver::default();
        let mut out = Self::new(self.start().clone());
        out.alphabet = self.alphabet.clone();

        for state in self.states() {
            out.insert(state.clone());
        }

        for state in self.states() {
            let closure = self.closure_in(&mut solver, [state.clone()]);

            let mut moves: BTreeMap<I, BTreeSet<N>> = BTreeMap::new();
            for member in &closure {
                for (sym, dests) in self.get(member).into_iter().flat_map(Node::symbol_edges) {
                    moves
                        .entry(sym.clone())
                        .or_default()
                        .extend(dests.iter().cloned());
                }
            }

            for (sym, dests) in moves {
                for to in dests {
                    out.connect(state, to, Some(sym.clone()));
                }
            }

            if closure.iter().any(|n| self.is_accept(n)) {
                out.mark_accept(state.clone());
            }
        }

        out
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use crate::{nfa::Nfa, re, testing};

    #[test]
    fn removes_all_epsilon_edges() {
        // 0 -ε-> 1 -a-> 2, 2 -ε-> 3(accept), 3 -b-> 0
        let mut nfa = Nfa::new(0);
        for n in 1..=3u64 {
            nfa.insert(n);
        }
        nfa.connect(&0, 1, None);
        nfa.connect(&1, 2, Some('a'));
        nfa.connect(&2, 3, None);
        nfa.connect(&3, 0, Some('b'));
        nfa.mark_accept(3);

        let flat = nfa.eliminate_epsilon();
        assert!(flat.states().all(|s| flat.get(s).unwrap().nil_edges().is_empty()));

        // 0 gained 1's a-move; 2 became accepting through its closure
        assert_eq!(
            flat.get(&0).unwrap().get(&'a'),
            Some(&std::collections::BTreeSet::from([2]))
        );
        assert!(flat.is_accept(&2));
        assert!(flat.is_accept(&3));
        assert!(!flat.is_accept(&0));
    }

    #[test]
    fn destinations_are_not_closed() {
        // 0 -ε-> 1 -a-> 2, 2 -ε-> 3: the a-move from 0 reaches 2, not 3
        let mut nfa = Nfa::new(0);
        for n in 1..=3u64 {
            nfa.insert(n);
        }
        nfa.connect(&0, 1, None);
        nfa.connect(&1, 2, Some('a'));
        nfa.connect(&2, 3, None);

        let flat = nfa.eliminate_epsilon();
        assert_eq!(
            flat.get(&0).unwrap().get(&'a'),
            Some(&std::collections::BTreeSet::from([2]))
        );
    }

    proptest! {
        #[test]
        fn preserves_language(r in re::re(4, 16, 3, prop::sample::select(vec!['a', 'b']))) {
            let nfa = r.compile();
            let flat = nfa.eliminate_epsilon();

            for s in testing::strings(&['a', 'b'], 4) {
                prop_assert_eq!(
                    nfa.accepts(s.iter().copied()),
                    flat.accepts(s.iter().copied()),
                    "string {:?}",
                    s
                );
            }
        }

        #[test]
        fn composes_with_determinization(
            r in re::re(4, 16, 3, prop::sample::select(vec!['a', 'b'])),
        ) {
            let nfa = r.compile();
            let dfa = nfa
                .eliminate_epsilon()
                .determinize(&crate::limits::Limits::default())
                .unwrap();

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
