use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::Dfa;

/// One transition edit made by an optimization step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionChange<I, N> {
    pub state: N,
    pub symbol: I,
    pub prev: Option<N>,
    pub next: Option<N>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Retargeted,
}

impl<I, N> TransitionChange<I, N> {
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        match (&self.prev, &self.next) {
            (None, Some(_)) => ChangeKind::Added,
            (Some(_), None) => ChangeKind::Removed,
            (Some(_), Some(_)) => ChangeKind::Retargeted,
            (None, None) => unreachable!("change with neither endpoint"),
        }
    }
}

impl<I: Clone + Ord, N: Clone + Ord> Dfa<I, N> {
    /// Drop states the start state cannot reach.
    #[must_use]
    pub fn prune_unreachable(&self) -> (Self, Vec<TransitionChange<I, N>>) {
        let mut keep = BTreeSet::new();
        let mut q = VecDeque::from([self.start.clone()]);

        while let Some(state) = q.pop_front() {
            if !keep.insert(state.clone()) {
                continue;
            }

            for to in self.states.get(&state).into_iter().flat_map(BTreeMap::values) {
                if !keep.contains(to) {
                    q.push_back(to.clone());
                }
            }
        }

        self.retain(&keep)
    }

    /// Drop states from which no accepting state is reachable. The start
    /// state survives regardless.
    #[must_use]
    pub fn prune_dead(&self) -> (Self, Vec<TransitionChange<I, N>>) {
        let mut rev: BTreeMap<&N, BTreeSet<&N>> = BTreeMap::new();
        for (state, edges) in &self.states {
            for to in edges.values() {
                rev.entry(to).or_default().insert(state);
            }
        }

        let mut live: BTreeSet<N> = BTreeSet::new();
        let mut q: VecDeque<N> = self.accept.iter().cloned().collect();
        while let Some(state) = q.pop_front() {
            if !live.insert(state.clone()) {
                continue;
            }

            for &from in rev.get(&state).into_iter().flatten() {
                if !live.contains(from) {
                    q.push_back(from.clone());
                }
            }
        }

        live.insert(self.start.clone());
        self.retain(&live)
    }

    /// Partition-refinement minimization (Moore). Starts from
    /// {accepting, non-accepting} and splits any block whose members
    /// disagree on the target block for some symbol, to fixed point; each
    /// block then collapses onto its least member. A missing transition is
    /// its own target bucket, so partial transition functions refine
    /// correctly.
    #[must_use]
    pub fn minimize(&self) -> (Self, Vec<TransitionChange<I, N>>) {
        let mut block: BTreeMap<N, usize> = self
            .states
            .keys()
            .map(|n| (n.clone(), usize::from(self.accept.contains(n))))
            .collect();

        loop {
            let blocks = block.values().collect::<BTreeSet<_>>().len();

            let mut sig_ids: BTreeMap<(usize, Vec<(&I, Option<usize>)>), usize> = BTreeMap::new();
            let mut next: BTreeMap<N, usize> = BTreeMap::new();
            for (state, edges) in &self.states {
                let sig = self
                    .alphabet
                    .iter()
                    .map(|sym| (sym, edges.get(sym).map(|to| block[to])))
                    .collect();

                let fresh = sig_ids.len();
                let id = *sig_ids.entry((block[state], sig)).or_insert(fresh);
                next.insert(state.clone(), id);
            }

            if sig_ids.len() == blocks {
                break;
            }
            block = next;
        }

        let mut repr: BTreeMap<usize, N> = BTreeMap::new();
        for (state, &b) in &block {
            // keys ascend, so the first member seen is the least
            repr.entry(b).or_insert_with(|| state.clone());
        }
        let merged = |n: &N| repr[&block[n]].clone();

        let mut states = BTreeMap::new();
        let mut changes = Vec::new();
        for (state, edges) in &self.states {
            if &merged(state) != state {
                for (sym, to) in edges {
                    changes.push(TransitionChange {
                        state: state.clone(),
                        symbol: sym.clone(),
                        prev: Some(to.clone()),
                        next: None,
                    });
                }
                continue;
            }

            let mut kept = BTreeMap::new();
            for (sym, to) in edges {
                let new_to = merged(to);
                if &new_to != to {
                    changes.push(TransitionChange {
                        state: state.clone(),
                        symbol: sym.clone(),
                        prev: Some(to.clone()),
                        next: Some(new_to.clone()),
                    });
                }
                kept.insert(sym.clone(), new_to);
            }
            states.insert(state.clone(), kept);
        }

        let dfa = Dfa::new(
            states,
            self.alphabet.clone(),
            merged(&self.start),
            self.accept.iter().map(&merged).collect(),
        );
        (dfa, changes)
    }

    /// The full pipeline: prune unreachable, prune dead, minimize.
    #[must_use]
    pub fn optimize(&self) -> (Self, Vec<TransitionChange<I, N>>) {
        let (dfa, mut changes) = self.prune_unreachable();
        let (dfa, more) = dfa.prune_dead();
        changes.extend(more);
        let (dfa, more) = dfa.minimize();
        changes.extend(more);

        (dfa, changes)
    }

    /// Rebuild with only `keep`, recording every dropped transition.
    fn retain(&self, keep: &BTreeSet<N>) -> (Self, Vec<TransitionChange<I, N>>) {
        let mut changes = Vec::new();
        let mut states = BTreeMap::new();

        for (state, edges) in &self.states {
            if !keep.contains(state) {
                for (sym, to) in edges {
                    changes.push(TransitionChange {
                        state: state.clone(),
                        symbol: sym.clone(),
                        prev: Some(to.clone()),
                        next: None,
                    });
                }
                continue;
            }

            let mut kept = BTreeMap::new();
            for (sym, to) in edges {
                if keep.contains(to) {
                    kept.insert(sym.clone(), to.clone());
                } else {
                    changes.push(TransitionChange {
                        state: state.clone(),
                        symbol: sym.clone(),
                        prev: Some(to.clone()),
                        next: None,
                    });
                }
            }
            states.insert(state.clone(), kept);
        }

        let dfa = Dfa::new(
            states,
            self.alphabet.clone(),
            self.start.clone(),
            self.accept.intersection(keep).cloned().collect(),
        );
        (dfa, changes)
    }
}
