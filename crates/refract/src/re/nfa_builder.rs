use super::Regex;
use crate::{free::Free, nfa::Nfa};

/// Structural compiler: each subtree is built between an (entry, exit) pair
/// of states, wired with epsilon edges. Composition stays acyclic except
/// the deliberate star/plus back-edges.
pub struct NfaBuilder<I> {
    nfa: Nfa<I, u64>,
    free: Free,
}

impl<I: Clone + Ord> NfaBuilder<I> {
    fn new() -> (Self, u64, u64) {
        let mut free = Free::default();
        let head = free.fresh();
        let tail = free.fresh();

        let mut nfa = Nfa::new(head);
        assert!(nfa.insert(tail).is_none());
        nfa.mark_accept(tail);

        (Self { nfa, free }, head, tail)
    }

    pub fn build(regex: &Regex<I>) -> Self {
        let (mut me, head, tail) = Self::new();
        me.build_in(regex, head, tail);
        me
    }

    #[inline]
    fn fresh_node(&mut self) -> u64 {
        let fresh = self.free.fresh();
        assert!(self.nfa.insert(fresh).is_none());
        fresh
    }

    #[inline]
    fn connect(&mut self, from: u64, to: u64, by: Option<I>) {
        self.nfa.connect(&from, to, by);
    }

    fn build_in(&mut self, regex: &Regex<I>, head: u64, tail: u64) {
        match regex {
            Regex::Alt(branches) => {
                // BOTTOM is the empty alternation: no edges, no path
                for re in branches {
                    let h = self.fresh_node();
                    let t = self.fresh_node();

                    self.build_in(re, h, t);
                    self.connect(head, h, None);
                    self.connect(t, tail, None);
                }
            },
            Regex::Cat(parts) => {
                let mut h = head;
                for (i, re) in parts.iter().enumerate() {
                    let t = if i + 1 == parts.len() {
                        tail
                    } else {
                        self.fresh_node()
                    };
                    self.build_in(re, h, t);
                    h = t;
                }

                // EMPTY is the empty concatenation: entry flows to exit
                if parts.is_empty() {
                    self.connect(head, tail, None);
                }
            },
            Regex::Star(r) => {
                let (h, t) = self.fragment(r, head, tail);
                self.connect(head, tail, None);
                self.connect(t, h, None);
            },
            Regex::Plus(r) => {
                // star without the bypass
                let (h, t) = self.fragment(r, head, tail);
                self.connect(t, h, None);
            },
            Regex::Opt(r) => {
                // star without the back-edge
                self.fragment(r, head, tail);
                self.connect(head, tail, None);
            },
            Regex::Lit(l) => self.connect(head, tail, Some(l.clone())),
        }
    }

    /// Build `regex` in a fresh (entry, exit) pair hung off `head`/`tail`.
    fn fragment(&mut self, regex: &Regex<I>, head: u64, tail: u64) -> (u64, u64) {
        let h = self.fresh_node();
        let t = self.fresh_node();

        self.build_in(regex, h, t);
        self.connect(head, h, None);
        self.connect(t, tail, None);

        (h, t)
    }

    #[inline]
    pub fn finish(self) -> Nfa<I, u64> { self.nfa }
}

#[cfg(test)]
mod test {
    use crate::{limits::Limits, re::Regex};

    fn accepts(re: &Regex<char>, s: &str) -> bool { re.compile().accepts(s.chars()) }

    #[test]
    fn star_then_literal() {
        let re = Regex::parse("a*b").unwrap();
        let dfa = re
            .compile()
            .determinize(&Limits::default())
            .unwrap();

        for good in ["b", "ab", "aab"] {
            assert!(dfa.accepts(good.chars()), "{good}");
        }
        for bad in ["", "a", "ba"] {
            assert!(!dfa.accepts(bad.chars()), "{bad}");
        }
    }

    #[test]
    fn empty_pattern_accepts_empty_string_only() {
        let re = Regex::parse("").unwrap();
        assert!(accepts(&re, ""));
        assert!(!accepts(&re, "a"));
    }

    #[test]
    fn bottom_accepts_nothing() {
        assert!(!accepts(&Regex::BOTTOM, ""));
        assert!(!accepts(&Regex::BOTTOM, "a"));
    }

    #[test]
    fn plus_requires_one() {
        let re = Regex::parse("a+").unwrap();
        assert!(!accepts(&re, ""));
        assert!(accepts(&re, "a"));
        assert!(accepts(&re, "aaa"));
    }

    #[test]
    fn opt_allows_zero_or_one() {
        let re = Regex::parse("ab?").unwrap();
        assert!(accepts(&re, "a"));
        assert!(accepts(&re, "ab"));
        assert!(!accepts(&re, "abb"));
    }

    #[test]
    fn identifiers_are_monotonic() {
        let nfa = Regex::parse("a|b").unwrap().compile();
        let max = nfa.states().max().copied().unwrap();
        assert_eq!(nfa.state_count(), usize::try_from(max).unwrap() + 1);
    }
}
