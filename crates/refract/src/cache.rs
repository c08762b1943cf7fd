use std::{
    collections::BTreeMap,
    hash::{BuildHasher, Hash},
    time::Duration,
};

use foldhash::fast::FixedState;
use indexmap::IndexMap;

use crate::{
    dfa::{Dfa, TransitionChange},
    error::{Error, Result},
    nfa::Nfa,
    re::Regex,
};

/// Structural hash keying one conversion request. Sources hash their
/// ordered maps, so equal structures fingerprint equally no matter how they
/// were built; the fixed seed keeps fingerprints stable across runs.
pub type Fingerprint = u64;

const FINGERPRINT_SEED: u64 = 0x5eed_0f_a11_cafe;

#[must_use]
pub fn fingerprint(op: OpKind, source: &impl Hash, options: &impl Hash) -> Fingerprint {
    FixedState::with_seed(FINGERPRINT_SEED).hash_one((op, source, options))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpKind {
    Compile,
    Determinize,
    EliminateEpsilon,
    ToRegex,
    Optimize,
    Equivalence,
}

impl OpKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Determinize => "determinize",
            Self::EliminateEpsilon => "eliminate_epsilon",
            Self::ToRegex => "to_regex",
            Self::Optimize => "optimize",
            Self::Equivalence => "equivalence",
        }
    }
}

/// A finished conversion, as stored in the cache.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Nfa(Nfa<char, u64>),
    Dfa(Dfa<char, u64>),
    Regex(Regex<char>),
    Bool(bool),
    Optimized(Dfa<char, u64>, Vec<TransitionChange<char, u64>>),
}

impl CacheValue {
    /// (state count, transition count) of the produced automaton; results
    /// with no state structure report zeros.
    #[must_use]
    pub fn sizes(&self) -> (usize, usize) {
        match self {
            Self::Nfa(nfa) => (nfa.state_count(), nfa.transition_count()),
            Self::Dfa(dfa) | Self::Optimized(dfa, _) => {
                (dfa.state_count(), dfa.transition_count())
            },
            Self::Regex(_) | Self::Bool(_) => (0, 0),
        }
    }

    pub fn into_nfa(self) -> Result<Nfa<char, u64>> {
        match self {
            Self::Nfa(nfa) => Ok(nfa),
            _ => Err(Error::Cache),
        }
    }

    pub fn into_dfa(self) -> Result<Dfa<char, u64>> {
        match self {
            Self::Dfa(dfa) => Ok(dfa),
            _ => Err(Error::Cache),
        }
    }

    pub fn into_regex(self) -> Result<Regex<char>> {
        match self {
            Self::Regex(re) => Ok(re),
            _ => Err(Error::Cache),
        }
    }

    pub fn into_bool(self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(b),
            _ => Err(Error::Cache),
        }
    }

    pub fn into_optimized(self) -> Result<(Dfa<char, u64>, Vec<TransitionChange<char, u64>>)> {
        match self {
            Self::Optimized(dfa, changes) => Ok((dfa, changes)),
            _ => Err(Error::Cache),
        }
    }
}

/// Bounded conversion cache. Insertion order doubles as recency order: a
/// hit moves its entry to the back, eviction takes the front. Failed
/// computations are never inserted, so an aborted operation leaves no
/// partial entry behind.
#[derive(Debug)]
pub struct Cache {
    map: IndexMap<Fingerprint, CacheValue>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Cache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            map: IndexMap::new(),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the cached or freshly computed value, plus whether it was a
    /// hit.
    pub fn get_or_compute(
        &mut self,
        fp: Fingerprint,
        compute: impl FnOnce() -> Result<CacheValue>,
    ) -> Result<(CacheValue, bool)> {
        if let Some(idx) = self.map.get_index_of(&fp) {
            self.hits += 1;
            let last = self.map.len() - 1;
            self.map.move_index(idx, last);
            let val = self
                .map
                .get_index(last)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| unreachable!());
            return Ok((val, true));
        }

        self.misses += 1;
        let val = compute()?;

        if self.capacity > 0 {
            if self.map.len() >= self.capacity {
                self.map.shift_remove_index(0);
            }
            self.map.insert(fp, val.clone());
        }

        Ok((val, false))
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.map.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }

    pub fn reset(&mut self) {
        self.map.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// One completed operation, as appended to the statistics log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpRecord {
    pub op: OpKind,
    pub duration: Duration,
    pub states: usize,
    pub transitions: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpStats {
    pub count: usize,
    pub total: Duration,
}

impl OpStats {
    fn add(&mut self, duration: Duration) {
        self.count += 1;
        self.total += duration;
    }

    #[must_use]
    pub fn average(&self) -> Duration {
        u32::try_from(self.count).map_or(Duration::ZERO, |n| {
            if n == 0 { Duration::ZERO } else { self.total / n }
        })
    }
}

/// In-memory log of completed operations with per-operation aggregates.
#[derive(Debug, Default)]
pub struct StatsLog {
    records: Vec<OpRecord>,
}

impl StatsLog {
    pub fn record(&mut self, op: OpKind, duration: Duration, states: usize, transitions: usize) {
        self.records.push(OpRecord {
            op,
            duration,
            states,
            transitions,
        });
    }

    #[must_use]
    pub fn records(&self) -> &[OpRecord] { &self.records }

    #[must_use]
    pub fn summary(&self) -> OpStats {
        let mut stats = OpStats::default();
        for r in &self.records {
            stats.add(r.duration);
        }
        stats
    }

    #[must_use]
    pub fn breakdown(&self) -> BTreeMap<OpKind, OpStats> {
        let mut out: BTreeMap<OpKind, OpStats> = BTreeMap::new();
        for r in &self.records {
            out.entry(r.op).or_default().add(r.duration);
        }
        out
    }

    pub fn reset(&mut self) { self.records.clear(); }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::{Cache, CacheValue, OpKind, StatsLog, fingerprint};
    use crate::error::Error;

    #[test]
    fn fingerprints_are_structural() {
        let a = fingerprint(OpKind::Compile, &"a*b", &());
        let b = fingerprint(OpKind::Compile, &"a*b", &());
        let c = fingerprint(OpKind::Compile, &"a*c", &());
        let d = fingerprint(OpKind::Determinize, &"a*b", &());

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn hits_and_misses_count() {
        let mut cache = Cache::new(4);
        let (_, hit) = cache
            .get_or_compute(1, || Ok(CacheValue::Bool(true)))
            .unwrap();
        assert!(!hit);

        let (val, hit) = cache
            .get_or_compute(1, || Ok(CacheValue::Bool(false)))
            .unwrap();
        assert!(hit);
        assert!(val.into_bool().unwrap());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut cache = Cache::new(2);
        for fp in 0..2u64 {
            cache
                .get_or_compute(fp, || Ok(CacheValue::Bool(true)))
                .unwrap();
        }

        // touch 0 so 1 is the eviction candidate
        cache.get_or_compute(0, || Ok(CacheValue::Bool(true))).unwrap();
        cache.get_or_compute(9, || Ok(CacheValue::Bool(true))).unwrap();

        let (_, hit0) = cache.get_or_compute(0, || Ok(CacheValue::Bool(true))).unwrap();
        assert!(hit0);
        let (_, hit1) = cache.get_or_compute(1, || Ok(CacheValue::Bool(true))).unwrap();
        assert!(!hit1, "least-recently-used entry should have been evicted");
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = Cache::new(4);
        let res = cache.get_or_compute(5, || {
            Err(Error::StateLimit { limit: 1 })
        });
        assert!(res.is_err());
        assert_eq!(cache.stats().size, 0);

        let (_, hit) = cache.get_or_compute(5, || Ok(CacheValue::Bool(true))).unwrap();
        assert!(!hit);
    }

    #[test]
    fn wrong_kind_is_a_cache_error() {
        let mut cache = Cache::new(4);
        let (val, _) = cache.get_or_compute(1, || Ok(CacheValue::Bool(true))).unwrap();
        assert_eq!(val.into_dfa(), Err(Error::Cache));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut cache = Cache::new(0);
        cache.get_or_compute(1, || Ok(CacheValue::Bool(true))).unwrap();
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn log_aggregates_per_operation() {
        let mut log = StatsLog::default();
        log.record(OpKind::Compile, Duration::from_millis(4), 10, 12);
        log.record(OpKind::Compile, Duration::from_millis(2), 8, 9);
        log.record(OpKind::Optimize, Duration::from_millis(6), 3, 4);

        let summary = log.summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total, Duration::from_millis(12));
        assert_eq!(summary.average(), Duration::from_millis(4));

        let per_op = log.breakdown();
        assert_eq!(per_op[&OpKind::Compile].count, 2);
        assert_eq!(per_op[&OpKind::Compile].average(), Duration::from_millis(3));
        assert_eq!(per_op[&OpKind::Optimize].count, 1);

        log.reset();
        assert!(log.records().is_empty());
    }
}
