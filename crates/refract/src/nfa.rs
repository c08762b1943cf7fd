use std::{
    collections::{BTreeMap, BTreeSet},
    hash::Hash,
    sync::Arc,
};

use self::dfa_builder::DfaBuilder;
use crate::{
    closure::ClosureSolver,
    dfa::Dfa,
    error::{Error, Result},
    limits::Limits,
    re::{Regex, state_elim},
};

mod dfa_builder;
mod epsilon_elim;

/// Outgoing edges of one state: `nil` holds the epsilon successors, `map`
/// the per-symbol successor sets. Epsilon is not a symbol value, so it can
/// never leak into a declared alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node<I, N> {
    nil: BTreeSet<N>,
    map: BTreeMap<I, BTreeSet<N>>,
}

impl<I, N> Default for Node<I, N> {
    fn default() -> Self {
        Self {
            nil: BTreeSet::new(),
            map: BTreeMap::new(),
        }
    }
}

impl<I, N> Node<I, N> {
    #[inline]
    pub fn nil_edges(&self) -> &BTreeSet<N> { &self.nil }

    #[inline]
    pub fn symbol_edges(&self) -> impl Iterator<Item = (&I, &BTreeSet<N>)> { self.map.iter() }
}

impl<I: Ord, N> Node<I, N> {
    #[inline]
    pub fn get(&self, by: &I) -> Option<&BTreeSet<N>> { self.map.get(by) }
}

/// A nondeterministic automaton, epsilon edges permitted. An NFA proper is
/// one whose every `nil` set is empty; [`Nfa::eliminate_epsilon`] produces
/// that form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nfa<I, N> {
    nodes: BTreeMap<N, Node<I, N>>,
    alphabet: BTreeSet<I>,
    start: N,
    accept: BTreeSet<N>,
}

impl<I: Ord, N: Clone + Ord> Nfa<I, N> {
    pub fn new(start: N) -> Self {
        let mut me = Self {
            nodes: BTreeMap::new(),
            alphabet: BTreeSet::new(),
            start: start.clone(),
            accept: BTreeSet::new(),
        };
        assert!(me.insert(start).is_none());
        me
    }
}

impl<I: Ord, N: Ord> Nfa<I, N> {
    #[inline]
    pub fn start(&self) -> &N { &self.start }

    #[inline]
    pub fn alphabet(&self) -> &BTreeSet<I> { &self.alphabet }

    #[inline]
    pub fn accept(&self) -> &BTreeSet<N> { &self.accept }

    #[inline]
    pub fn states(&self) -> impl Iterator<Item = &N> { self.nodes.keys() }

    #[inline]
    pub fn get(&self, node: &N) -> Option<&Node<I, N>> { self.nodes.get(node) }

    #[inline]
    pub fn is_accept(&self, node: &N) -> bool { self.accept.contains(node) }

    #[inline]
    #[must_use]
    pub fn state_count(&self) -> usize { self.nodes.len() }

    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.nodes
            .values()
            .map(|n| n.nil.len() + n.map.values().map(BTreeSet::len).sum::<usize>())
            .sum()
    }

    #[inline]
    pub fn insert(&mut self, node: N) -> Option<Node<I, N>> {
        self.nodes.insert(node, Node::default())
    }

    pub fn mark_accept(&mut self, node: N) -> bool {
        assert!(self.nodes.contains_key(&node));
        self.accept.insert(node)
    }
}

impl<I: Clone + Ord, N: Clone + Ord> Nfa<I, N> {
    /// Connect `from` to `to`, by a symbol or (with `None`) by epsilon.
    /// Both endpoints must already be inserted.
    pub fn connect(&mut self, from: &N, to: N, by: Option<I>) -> bool {
        assert!(self.nodes.contains_key(&to));
        let from = self.nodes.get_mut(from).unwrap();

        if let Some(sym) = by {
            self.alphabet.insert(sym.clone());
            from.map.entry(sym).or_default().insert(to)
        } else {
            from.nil.insert(to)
        }
    }

    /// Epsilon closure of `seed`: least fixed point of
    /// `seed ∪ nil-successors`.
    pub fn closure(&self, seed: impl IntoIterator<Item = N>) -> BTreeSet<N> {
        let mut solver = ClosureSolver::default();
        self.closure_in(&mut solver, seed)
    }

    pub(crate) fn closure_in(
        &self,
        solver: &mut ClosureSolver<N>,
        seed: impl IntoIterator<Item = N>,
    ) -> BTreeSet<N> {
        solver.solve(seed, |n| {
            self.nodes
                .get(n)
                .map_or_else(Vec::new, |node| node.nil.iter().cloned().collect())
        })
    }

    /// Whether the automaton accepts `input`. Test-support runner for
    /// validating conversions, not a match engine.
    pub fn accepts(&self, input: impl IntoIterator<Item = I>) -> bool {
        let mut solver = ClosureSolver::default();
        let mut cur = self.closure_in(&mut solver, [self.start.clone()]);

        for sym in input {
            let mut targets = BTreeSet::new();
            for n in &cur {
                if let Some(dests) = self.nodes.get(n).and_then(|node| node.get(&sym)) {
                    targets.extend(dests.iter().cloned());
                }
            }

            cur = self.closure_in(&mut solver, targets);
            if cur.is_empty() {
                return false;
            }
        }

        cur.iter().any(|n| self.accept.contains(n))
    }

    /// Check the declared-set invariants of a value received at the library
    /// boundary.
    ///
    /// # Errors
    /// [`Error::Validation`] on a dangling state reference or an accept
    /// state outside the state set.
    pub fn validate(&self) -> Result<()>
    where
        I: std::fmt::Debug,
        N: std::fmt::Debug,
    {
        if !self.nodes.contains_key(&self.start) {
            return Err(Error::Validation(format!(
                "start state {:?} is not a declared state",
                self.start
            )));
        }

        for node in &self.accept {
            if !self.nodes.contains_key(node) {
                return Err(Error::Validation(format!(
                    "accept state {node:?} is not a declared state"
                )));
            }
        }

        for (state, node) in &self.nodes {
            for to in &node.nil {
                if !self.nodes.contains_key(to) {
                    return Err(Error::Validation(format!(
                        "epsilon edge {state:?} -> {to:?} dangles"
                    )));
                }
            }

            for (sym, dests) in &node.map {
                if !self.alphabet.contains(sym) {
                    return Err(Error::Validation(format!(
                        "symbol {sym:?} on {state:?} is not in the alphabet"
                    )));
                }

                for to in dests {
                    if !self.nodes.contains_key(to) {
                        return Err(Error::Validation(format!(
                            "edge {state:?} -{sym:?}-> {to:?} dangles"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

impl<I: Clone + Ord + Hash, N: Clone + Ord + Hash> Nfa<I, N> {
    /// Subset construction. Composite states are named by their (interned,
    /// sorted) member sets; [`Dfa::atomize_states`] densifies the names.
    ///
    /// # Errors
    /// [`Error::StateLimit`] or [`Error::Timeout`] per `limits`.
    pub fn determinize(&self, limits: &Limits) -> Result<Dfa<I, Arc<BTreeSet<N>>>> {
        DfaBuilder::new(self, limits).build()
    }
}

impl<I: Clone + Ord, N: Clone + Ord> Nfa<I, N> {
    /// Recover a regular expression by state elimination.
    #[must_use]
    pub fn to_regex(&self) -> Regex<I> {
        match state_elim::from_nfa(self, &Limits::default()) {
            Ok(re) => re,
            Err(_) => unreachable!("unbounded elimination cannot fail"),
        }
    }

    /// [`Nfa::to_regex`] under a state/time budget.
    ///
    /// # Errors
    /// [`Error::Timeout`] when the budget runs out mid-elimination.
    pub fn to_regex_within(&self, limits: &Limits) -> Result<Regex<I>> {
        state_elim::from_nfa(self, limits)
    }
}
