use std::collections::{BTreeMap, BTreeSet};

use super::Regex;
use crate::{dfa::Dfa, error::Result, free::Free, limits::Limits, nfa::Nfa};

/// Generalized automaton whose edges carry whole expressions.
///
/// Two fresh terminal states (the highest identifiers) bracket the original
/// automaton: one epsilon edge into the original start, one out of each
/// accepting state. Interior states are eliminated in ascending identifier
/// order — the order changes expression size, never the language, and keeps
/// output reproducible.
#[derive(Debug)]
struct Gnfa<I> {
    edges: BTreeMap<(u64, u64), Regex<I>>,
    inner: BTreeSet<u64>,
    start: u64,
    end: u64,
}

impl<I: Clone + Ord> Gnfa<I> {
    /// Merge parallel edges by alternation.
    fn link(&mut self, from: u64, to: u64, label: Regex<I>) {
        use std::collections::btree_map::Entry;

        match self.edges.entry((from, to)) {
            Entry::Vacant(v) => {
                v.insert(label);
            },
            Entry::Occupied(mut o) => {
                let prev = o.get().clone();
                *o.get_mut() = Regex::alt([prev, label]);
            },
        }
    }

    fn eliminate(mut self, limits: &Limits) -> Result<Regex<I>> {
        for s in std::mem::take(&mut self.inner) {
            limits.check_time()?;

            let loop_re = self
                .edges
                .remove(&(s, s))
                .map_or(Regex::EMPTY, Regex::star);

            let mut preds = Vec::new();
            let mut succs = Vec::new();
            self.edges.retain(|&(from, to), label| {
                if to == s {
                    preds.push((from, label.clone()));
                    false
                } else if from == s {
                    succs.push((to, label.clone()));
                    false
                } else {
                    true
                }
            });

            for (p, pre) in &preds {
                for (q, post) in &succs {
                    let label =
                        Regex::cat([pre.clone(), loop_re.clone(), post.clone()]);
                    self.link(*p, *q, label);
                }
            }
        }

        Ok(self
            .edges
            .remove(&(self.start, self.end))
            .unwrap_or(Regex::BOTTOM))
    }
}

pub(crate) fn from_dfa<I: Clone + Ord, N: Clone + Ord>(
    dfa: &Dfa<I, N>,
    limits: &Limits,
) -> Result<Regex<I>> {
    let mut free = Free::default();
    let names: BTreeMap<&N, u64> = dfa.states().map(|(n, _)| (n, free.fresh())).collect();

    let mut g = Gnfa {
        edges: BTreeMap::new(),
        inner: names.values().copied().collect(),
        start: free.fresh(),
        end: free.fresh(),
    };

    g.link(g.start, names[dfa.start()], Regex::EMPTY);
    for accept in dfa.accept() {
        g.link(names[accept], g.end, Regex::EMPTY);
    }
    for (state, edges) in dfa.states() {
        for (sym, to) in edges {
            g.link(names[state], names[to], Regex::Lit(sym.clone()));
        }
    }

    g.eliminate(limits)
}

pub(crate) fn from_nfa<I: Clone + Ord, N: Clone + Ord>(
    nfa: &Nfa<I, N>,
    limits: &Limits,
) -> Result<Regex<I>> {
    let mut free = Free::default();
    let names: BTreeMap<&N, u64> = nfa.states().map(|n| (n, free.fresh())).collect();

    let mut g = Gnfa {
        edges: BTreeMap::new(),
        inner: names.values().copied().collect(),
        start: free.fresh(),
        end: free.fresh(),
    };

    g.link(g.start, names[nfa.start()], Regex::EMPTY);
    for accept in nfa.accept() {
        g.link(names[accept], g.end, Regex::EMPTY);
    }
    for state in nfa.states() {
        let Some(node) = nfa.get(state) else {
            unreachable!()
        };

        for to in node.nil_edges() {
            g.link(names[state], names[to], Regex::EMPTY);
        }
        for (sym, dests) in node.symbol_edges() {
            for to in dests {
                g.link(names[state], names[to], Regex::Lit(sym.clone()));
            }
        }
    }

    g.eliminate(limits)
}
