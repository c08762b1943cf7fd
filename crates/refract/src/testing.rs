//! Shared helpers for the in-crate test modules.

/// Every string over `alphabet` of length at most `max_len`, shortest
/// first. Bounded-length language enumeration for conversion checks.
pub(crate) fn strings(alphabet: &[char], max_len: usize) -> Vec<Vec<char>> {
    let mut all = vec![Vec::new()];
    let mut layer = vec![Vec::new()];

    for _ in 0..max_len {
        let mut next = Vec::new();
        for s in &layer {
            for &c in alphabet {
                let mut t = s.clone();
                t.push(c);
                next.push(t);
            }
        }
        all.extend(next.iter().cloned());
        layer = next;
    }

    all
}

#[cfg(test)]
mod test {
    use super::strings;

    #[test]
    fn enumerates_shortest_first() {
        let all = strings(&['a', 'b'], 2);
        assert_eq!(all.len(), 1 + 2 + 4);
        assert_eq!(all[0], Vec::<char>::new());
        assert_eq!(all[1], vec!['a']);
        assert_eq!(all.last().unwrap(), &vec!['b', 'b']);
    }
}
