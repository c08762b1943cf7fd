use std::fmt;

use nfa_builder::NfaBuilder;

use crate::{error::Result, nfa::Nfa};

mod nfa_builder;
pub mod state_elim;
pub mod syntax;

/// A regular-expression syntax tree.
///
/// `Alt`/`Cat` are n-ary; the zero-ary cases are the two degenerate
/// languages, available as [`Regex::BOTTOM`] (no strings) and
/// [`Regex::EMPTY`] (the empty string only).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Regex<L> {
    Alt(Vec<Regex<L>>),
    Cat(Vec<Regex<L>>),
    Star(Box<Regex<L>>),
    Plus(Box<Regex<L>>),
    Opt(Box<Regex<L>>),
    Lit(L),
}

impl<L> Regex<L> {
    pub const BOTTOM: Regex<L> = Regex::Alt(Vec::new());
    pub const EMPTY: Regex<L> = Regex::Cat(Vec::new());

    #[inline]
    #[must_use]
    pub fn is_bottom(&self) -> bool { matches!(self, Self::Alt(v) if v.is_empty()) }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool { matches!(self, Self::Cat(v) if v.is_empty()) }

    fn map_impl<M, F: FnMut(L) -> M>(self, f: &mut F) -> Regex<M> {
        match self {
            Self::Alt(v) => Regex::Alt(v.into_iter().map(|r| r.map_impl(f)).collect()),
            Self::Cat(v) => Regex::Cat(v.into_iter().map(|r| r.map_impl(f)).collect()),
            Self::Star(r) => Regex::Star(r.map_impl(f).into()),
            Self::Plus(r) => Regex::Plus(r.map_impl(f).into()),
            Self::Opt(r) => Regex::Opt(r.map_impl(f).into()),
            Self::Lit(l) => Regex::Lit(f(l)),
        }
    }

    #[inline]
    pub fn map<M, F: FnMut(L) -> M>(self, mut f: F) -> Regex<M> { self.map_impl(&mut f) }
}

impl<L: Ord> Regex<L> {
    /// Alternation, normalized: nested `Alt`s flatten, `BOTTOM` branches
    /// drop, duplicate branches collapse to their first occurrence.
    #[must_use]
    pub fn alt(branches: impl IntoIterator<Item = Regex<L>>) -> Regex<L> {
        let mut seen = Vec::new();
        for branch in branches {
            match branch {
                Self::Alt(v) => {
                    for b in v {
                        if !seen.contains(&b) {
                            seen.push(b);
                        }
                    }
                },
                b => {
                    if !seen.contains(&b) {
                        seen.push(b);
                    }
                },
            }
        }

        if seen.len() == 1 {
            seen.pop().unwrap_or_else(|| unreachable!())
        } else {
            Self::Alt(seen)
        }
    }

    /// Concatenation, normalized: `BOTTOM` absorbs, `EMPTY` parts elide,
    /// nested `Cat`s flatten.
    #[must_use]
    pub fn cat(parts: impl IntoIterator<Item = Regex<L>>) -> Regex<L> {
        let mut out = Vec::new();
        for part in parts {
            match part {
                p if p.is_bottom() => return Self::BOTTOM,
                Self::Cat(v) => out.extend(v),
                p => out.push(p),
            }
        }

        if out.len() == 1 {
            out.pop().unwrap_or_else(|| unreachable!())
        } else {
            Self::Cat(out)
        }
    }

    /// Kleene closure, normalized: the degenerate languages both close to
    /// `EMPTY`, and `r*`, `r+`, `r?` all close to `r*`.
    #[must_use]
    pub fn star(self) -> Regex<L> {
        match self {
            r if r.is_bottom() || r.is_empty() => Self::EMPTY,
            Self::Star(r) | Self::Plus(r) | Self::Opt(r) => Self::Star(r),
            r => Self::Star(r.into()),
        }
    }
}

impl<L: Clone + Ord> Regex<L> {
    /// Compile to an epsilon-automaton by structural composition.
    #[must_use]
    pub fn compile(&self) -> Nfa<L, u64> { NfaBuilder::build(self).finish() }
}

impl Regex<char> {
    /// Parse a pattern string.
    ///
    /// # Errors
    /// [`Error::Syntax`](crate::Error::Syntax) on a dangling postfix
    /// operator, an unmatched parenthesis, or an escape at end of input.
    pub fn parse(pattern: &str) -> Result<Self> { syntax::parse(pattern) }

    /// Render back to pattern syntax, parenthesized only where precedence
    /// demands. Round-trips through [`Regex::parse`] for every tree except
    /// `BOTTOM`, which has no surface syntax and renders as `∅`.
    #[must_use]
    pub fn to_pattern(&self) -> String {
        let mut out = String::new();
        self.render(Prec::Alt, &mut out);
        out
    }

    fn render(&self, min: Prec, out: &mut String) {
        match self {
            r if r.is_bottom() => out.push('∅'),
            Self::Alt(v) => group(min, Prec::Alt, out, |out| {
                for (i, branch) in v.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    branch.render(Prec::Cat, out);
                }
            }),
            Self::Cat(v) => group(min, Prec::Cat, out, |out| {
                for part in v {
                    part.render(Prec::Postfix, out);
                }
            }),
            Self::Star(r) => postfix(r, '*', min, out),
            Self::Plus(r) => postfix(r, '+', min, out),
            Self::Opt(r) => postfix(r, '?', min, out),
            Self::Lit(c) => {
                if syntax::is_metachar(*c) {
                    out.push('\\');
                }
                out.push(*c);
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Alt,
    Cat,
    Postfix,
    Atom,
}

fn group(min: Prec, at: Prec, out: &mut String, f: impl FnOnce(&mut String)) {
    let wrap = at < min;
    if wrap {
        out.push('(');
    }
    f(out);
    if wrap {
        out.push(')');
    }
}

fn postfix(r: &Regex<char>, op: char, min: Prec, out: &mut String) {
    group(min, Prec::Postfix, out, |out| {
        r.render(Prec::Atom, out);
        out.push(op);
    });
}

impl fmt::Display for Regex<char> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(&self.to_pattern()) }
}

#[cfg(any(test, feature = "proptest"))]
pub use prop::*;

#[cfg(any(test, feature = "proptest"))]
mod prop {
    use prop::sample::SizeRange;
    use proptest::prelude::*;

    use super::Regex;

    pub fn re(
        depth: u32,
        tree_size: u32,
        branch_size: u32,
        chr: impl Strategy<Value = char> + 'static,
    ) -> impl Strategy<Value = Regex<char>> {
        chr.prop_map(Regex::Lit)
            .prop_recursive(depth, tree_size, branch_size, move |s| {
                let size: SizeRange = (0..=usize::try_from(branch_size).unwrap()).into();
                prop_oneof![
                    prop::collection::vec(s.clone(), size.clone()).prop_map(Regex::Alt),
                    prop::collection::vec(s.clone(), size).prop_map(Regex::Cat),
                    s.clone().prop_map(|r| Regex::Star(r.into())),
                    s.clone().prop_map(|r| Regex::Plus(r.into())),
                    s.prop_map(|r| Regex::Opt(r.into())),
                ]
            })
    }
}
