use super::Dfa;
use crate::error::{Error, Result};

/// Decide whether two deterministic automata accept the same language.
///
/// Comparison is strict: the declared alphabets must be equal, otherwise
/// the inputs are incomparable and an error is returned rather than a
/// guess. Structural mismatch after canonicalization is the normal `false`
/// outcome, never an error.
///
/// # Errors
/// [`Error::Equivalence`] when the alphabets differ.
pub fn equivalent<I: Clone + Ord, N: Clone + Ord, M: Clone + Ord>(
    a: &Dfa<I, N>,
    b: &Dfa<I, M>,
) -> Result<bool> {
    if a.alphabet() != b.alphabet() {
        return Err(Error::Equivalence(
            "declared alphabets differ".into(),
        ));
    }

    Ok(canonical(a) == canonical(b))
}

/// Minimize, then rename by BFS discovery order: equal languages become
/// identical structures.
fn canonical<I: Clone + Ord, N: Clone + Ord>(dfa: &Dfa<I, N>) -> Dfa<I, u64> {
    dfa.optimize().0.atomize_states().0
}
