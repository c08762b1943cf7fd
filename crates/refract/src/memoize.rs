use std::{hash::Hash, sync::Arc};

use hashbrown::HashSet;

/// Intern table handing out one shared allocation per distinct value.
///
/// The subset constructor names composite states by their member set; equal
/// sets must compare pointer-cheap and share storage.
#[derive(Debug)]
#[repr(transparent)]
pub struct Memoize<T>(HashSet<Arc<T>>);

impl<T> Default for Memoize<T> {
    fn default() -> Self { Self(HashSet::new()) }
}

impl<T: Eq + Hash> Memoize<T> {
    pub fn memoize(&mut self, val: T) -> Arc<T> {
        if let Some(got) = self.0.get(&val) {
            Arc::clone(got)
        } else {
            let interned = Arc::new(val);
            self.0.insert(Arc::clone(&interned));
            interned
        }
    }

    #[inline]
    pub fn len(&self) -> usize { self.0.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

#[cfg(test)]
mod test {
    use std::{collections::BTreeSet, sync::Arc};

    use super::Memoize;

    #[test]
    fn equal_values_share_storage() {
        let mut memo = Memoize::default();
        let a = memo.memoize(BTreeSet::from([1, 2, 3]));
        let b = memo.memoize(BTreeSet::from([3, 2, 1]));
        let c = memo.memoize(BTreeSet::from([4]));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(memo.len(), 2);
    }
}
