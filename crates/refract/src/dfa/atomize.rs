use std::collections::{BTreeMap, VecDeque};

use super::Dfa;
use crate::free::Free;

impl<I: Clone + Ord, N: Clone + Ord> Dfa<I, N> {
    /// Rename states to dense `u64` identifiers.
    ///
    /// Naming is BFS discovery order from the start state, following edges
    /// in symbol order; states unreachable from the start follow in
    /// ascending label order. Equal inputs name identically across runs,
    /// which is what makes canonical comparison (and cache keys over
    /// determinized output) possible.
    #[must_use]
    pub fn atomize_states(&self) -> (Dfa<I, u64>, BTreeMap<N, u64>) {
        let mut free = Free::default();
        let mut names: BTreeMap<N, u64> = BTreeMap::new();

        let mut q = VecDeque::from([self.start.clone()]);
        while let Some(state) = q.pop_front() {
            use std::collections::btree_map::Entry;

            let Entry::Vacant(v) = names.entry(state.clone()) else {
                continue;
            };
            v.insert(free.fresh());

            for to in self.states.get(&state).into_iter().flat_map(BTreeMap::values) {
                if !names.contains_key(to) {
                    q.push_back(to.clone());
                }
            }
        }

        for state in self.states.keys() {
            names.entry(state.clone()).or_insert_with(|| free.fresh());
        }

        let dfa = Dfa::new(
            self.states.iter().map(|(state, edges)| {
                (
                    names[state],
                    edges
                        .iter()
                        .map(|(sym, to)| (sym.clone(), names[to]))
                        .collect(),
                )
            }),
            self.alphabet.clone(),
            names[&self.start],
            self.accept.iter().map(|n| names[n]).collect(),
        );

        (dfa, names)
    }
}
