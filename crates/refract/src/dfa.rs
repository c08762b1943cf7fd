use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::{Error, Result},
    limits::Limits,
    re::{Regex, state_elim},
};

mod atomize;
mod equiv;
mod optimize;

pub use equiv::equivalent;
pub use optimize::{ChangeKind, TransitionChange};

/// A deterministic automaton. Transitions are single-valued and
/// epsilon-free by construction; the edge maps are ordered so every
/// traversal (and hence every tie-break downstream) is reproducible.
///
/// Transition functions may be partial: a missing edge is a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dfa<I, N> {
    states: BTreeMap<N, BTreeMap<I, N>>,
    alphabet: BTreeSet<I>,
    start: N,
    accept: BTreeSet<N>,
}

impl<I: Ord, N: Ord> Dfa<I, N> {
    pub fn new(
        states: impl IntoIterator<Item = (N, BTreeMap<I, N>)>,
        alphabet: BTreeSet<I>,
        start: N,
        accept: BTreeSet<N>,
    ) -> Self {
        Self {
            states: states.into_iter().collect(),
            alphabet,
            start,
            accept,
        }
    }

    #[inline]
    pub fn start(&self) -> &N { &self.start }

    #[inline]
    pub fn alphabet(&self) -> &BTreeSet<I> { &self.alphabet }

    #[inline]
    pub fn accept(&self) -> &BTreeSet<N> { &self.accept }

    #[inline]
    pub fn states(&self) -> impl Iterator<Item = (&N, &BTreeMap<I, N>)> { self.states.iter() }

    #[inline]
    pub fn get(&self, node: &N) -> Option<&BTreeMap<I, N>> { self.states.get(node) }

    #[inline]
    pub fn is_accept(&self, node: &N) -> bool { self.accept.contains(node) }

    #[inline]
    #[must_use]
    pub fn state_count(&self) -> usize { self.states.len() }

    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.states.values().map(BTreeMap::len).sum()
    }

    /// Whether the automaton accepts `input`. Test-support runner for
    /// validating conversions, not a match engine.
    pub fn accepts(&self, input: impl IntoIterator<Item = I>) -> bool {
        let mut cur = &self.start;
        for sym in input {
            match self.states.get(cur).and_then(|edges| edges.get(&sym)) {
                Some(next) => cur = next,
                None => return false,
            }
        }

        self.accept.contains(cur)
    }

    /// Check the declared-set invariants of a value received at the library
    /// boundary. Deterministic automata must declare at least one state and
    /// a non-empty alphabet.
    ///
    /// # Errors
    /// [`Error::Validation`] on an empty state set or alphabet, a dangling
    /// state reference, or an accept state outside the state set.
    pub fn validate(&self) -> Result<()>
    where
        I: std::fmt::Debug,
        N: std::fmt::Debug,
    {
        if self.states.is_empty() {
            return Err(Error::Validation("empty state set".into()));
        }

        if self.alphabet.is_empty() {
            return Err(Error::Validation("empty alphabet".into()));
        }

        if !self.states.contains_key(&self.start) {
            return Err(Error::Validation(format!(
                "start state {:?} is not a declared state",
                self.start
            )));
        }

        for node in &self.accept {
            if !self.states.contains_key(node) {
                return Err(Error::Validation(format!(
                    "accept state {node:?} is not a declared state"
                )));
            }
        }

        for (state, edges) in &self.states {
            for (sym, to) in edges {
                if !self.alphabet.contains(sym) {
                    return Err(Error::Validation(format!(
                        "symbol {sym:?} on {state:?} is not in the alphabet"
                    )));
                }

                if !self.states.contains_key(to) {
                    return Err(Error::Validation(format!(
                        "edge {state:?} -{sym:?}-> {to:?} dangles"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl<I: Clone + Ord, N: Clone + Ord> Dfa<I, N> {
    /// Recover a regular expression by state elimination.
    #[must_use]
    pub fn to_regex(&self) -> Regex<I> {
        match state_elim::from_dfa(self, &Limits::default()) {
            Ok(re) => re,
            Err(_) => unreachable!("unbounded elimination cannot fail"),
        }
    }

    /// [`Dfa::to_regex`] under a state/time budget.
    ///
    /// # Errors
    /// [`Error::Timeout`] when the budget runs out mid-elimination.
    pub fn to_regex_within(&self, limits: &Limits) -> Result<Regex<I>> {
        state_elim::from_dfa(self, limits)
    }
}
