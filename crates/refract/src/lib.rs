//! Toolkit for converting between regular expressions and finite automata

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    clippy::clone_on_ref_ptr,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)] // TODO

pub mod cache;
pub mod closure;
pub mod dfa;
pub mod engine;
pub mod error;
pub mod free;
pub mod limits;
pub mod memoize;
pub mod nfa;
pub mod re;

pub use error::{Error, Result};

#[cfg(test)]
pub(crate) mod testing;
