use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use tracing::{debug, trace};

use crate::{
    cache::{Cache, CacheStats, CacheValue, Fingerprint, OpKind, OpStats, StatsLog, fingerprint},
    dfa::{self, Dfa, TransitionChange},
    error::Result,
    limits::Limits,
    nfa::Nfa,
    re::Regex,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Cap on determinization output; `None` accepts the full 2^n blow-up.
    pub max_states: Option<usize>,
    /// Run the optimizer pipeline over every DFA the engine hands back.
    pub auto_optimize: bool,
    pub cache_capacity: usize,
    /// Wall-clock budget per operation.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_states: None,
            auto_optimize: false,
            cache_capacity: 64,
            timeout: None,
        }
    }
}

/// The conversion façade: fingerprints requests, consults the cache,
/// dispatches to the conversion algorithms on miss, and records timing.
///
/// All methods run to completion before returning; the cache and the
/// statistics log are the only mutable state, so a concurrent caller wraps
/// the engine in one lock and the algorithms themselves stay lock-free.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    cache: Cache,
    stats: StatsLog,
}

impl Default for Engine {
    fn default() -> Self { Self::new(Config::default()) }
}

impl Engine {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: Cache::new(config.cache_capacity),
            stats: StatsLog::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config { &self.config }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats { self.cache.stats() }

    #[must_use]
    pub fn stats_summary(&self) -> OpStats { self.stats.summary() }

    #[must_use]
    pub fn stats_breakdown(&self) -> BTreeMap<OpKind, OpStats> { self.stats.breakdown() }

    pub fn reset_metrics(&mut self) {
        self.cache.reset();
        self.stats.reset();
    }

    fn limits(&self) -> Limits { Limits::new(self.config.max_states, self.config.timeout) }

    /// Fingerprint → cache → dispatch → record. Failed computations leave
    /// neither a cache entry nor a statistics record behind.
    fn run(
        &mut self,
        op: OpKind,
        fp: Fingerprint,
        compute: impl FnOnce(Limits) -> Result<CacheValue>,
    ) -> Result<CacheValue> {
        let limits = self.limits();
        let started = Instant::now();
        let (val, hit) = self.cache.get_or_compute(fp, || compute(limits))?;
        let duration = started.elapsed();

        let (states, transitions) = val.sizes();
        debug!(op = op.name(), hit, ?duration, "operation finished");
        trace!(op = op.name(), states, transitions, "result sizes");
        self.stats.record(op, duration, states, transitions);

        Ok(val)
    }

    /// Parse and structurally compile a pattern.
    ///
    /// # Errors
    /// [`Error::Syntax`](crate::Error::Syntax) on a malformed pattern.
    pub fn compile(&mut self, pattern: &str) -> Result<Nfa<char, u64>> {
        let fp = fingerprint(OpKind::Compile, &pattern, &());
        self.run(OpKind::Compile, fp, |_| {
            Regex::parse(pattern).map(|re| CacheValue::Nfa(re.compile()))
        })
        .and_then(CacheValue::into_nfa)
    }

    /// Subset-construct a DFA, canonically named, optionally optimized.
    ///
    /// # Errors
    /// [`Error::Validation`](crate::Error::Validation),
    /// [`Error::StateLimit`](crate::Error::StateLimit), or
    /// [`Error::Timeout`](crate::Error::Timeout).
    pub fn determinize(&mut self, nfa: &Nfa<char, u64>) -> Result<Dfa<char, u64>> {
        nfa.validate()?;
        let auto = self.config.auto_optimize;
        let fp = fingerprint(
            OpKind::Determinize,
            nfa,
            &(self.config.max_states, auto),
        );

        self.run(OpKind::Determinize, fp, |limits| {
            let (dfa, _names) = nfa.determinize(&limits)?.atomize_states();
            Ok(CacheValue::Dfa(if auto { dfa.optimize().0 } else { dfa }))
        })
        .and_then(CacheValue::into_dfa)
    }

    /// Fold epsilon reachability onto ordinary transitions.
    ///
    /// # Errors
    /// [`Error::Validation`](crate::Error::Validation) on a malformed input.
    pub fn eliminate_epsilon(&mut self, nfa: &Nfa<char, u64>) -> Result<Nfa<char, u64>> {
        nfa.validate()?;
        let fp = fingerprint(OpKind::EliminateEpsilon, nfa, &());
        self.run(OpKind::EliminateEpsilon, fp, |_| {
            Ok(CacheValue::Nfa(nfa.eliminate_epsilon()))
        })
        .and_then(CacheValue::into_nfa)
    }

    /// Recover a regular expression by state elimination.
    ///
    /// # Errors
    /// [`Error::Validation`](crate::Error::Validation) or
    /// [`Error::Timeout`](crate::Error::Timeout).
    pub fn to_regex(&mut self, dfa: &Dfa<char, u64>) -> Result<Regex<char>> {
        dfa.validate()?;
        let fp = fingerprint(OpKind::ToRegex, dfa, &());
        self.run(OpKind::ToRegex, fp, |limits| {
            dfa.to_regex_within(&limits).map(CacheValue::Regex)
        })
        .and_then(CacheValue::into_regex)
    }

    /// Prune and minimize. An already-minimal input comes back unchanged
    /// with an empty change list — that is a normal outcome, not an error.
    ///
    /// # Errors
    /// [`Error::Validation`](crate::Error::Validation) or
    /// [`Error::Timeout`](crate::Error::Timeout).
    pub fn optimize(
        &mut self,
        dfa: &Dfa<char, u64>,
    ) -> Result<(Dfa<char, u64>, Vec<TransitionChange<char, u64>>)> {
        dfa.validate()?;
        let fp = fingerprint(OpKind::Optimize, dfa, &());
        self.run(OpKind::Optimize, fp, |limits| {
            let (out, mut changes) = dfa.prune_unreachable();
            limits.check_time()?;
            let (out, more) = out.prune_dead();
            changes.extend(more);
            limits.check_time()?;
            let (out, more) = out.minimize();
            changes.extend(more);
            Ok(CacheValue::Optimized(out, changes))
        })
        .and_then(CacheValue::into_optimized)
    }

    /// Decide language equivalence. `false` is a normal outcome.
    ///
    /// # Errors
    /// [`Error::Validation`](crate::Error::Validation) or
    /// [`Error::Equivalence`](crate::Error::Equivalence) on incomparable
    /// inputs.
    pub fn equivalent(&mut self, a: &Dfa<char, u64>, b: &Dfa<char, u64>) -> Result<bool> {
        a.validate()?;
        b.validate()?;
        let fp = fingerprint(OpKind::Equivalence, &(a, b), &());
        self.run(OpKind::Equivalence, fp, |_| {
            dfa::equivalent(a, b).map(CacheValue::Bool)
        })
        .and_then(CacheValue::into_bool)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::{Config, Engine};
    use crate::error::Error;

    #[test]
    fn repeat_conversion_hits_the_cache() {
        let mut engine = Engine::default();
        let first = engine.compile("a*b").unwrap();
        assert_eq!(engine.cache_stats().hits, 0);

        let second = engine.compile("a*b").unwrap();
        assert_eq!(engine.cache_stats().hits, 1);
        assert_eq!(first, second);

        // a different pattern is its own entry
        engine.compile("a*c").unwrap();
        assert_eq!(engine.cache_stats().hits, 1);
        assert_eq!(engine.cache_stats().misses, 2);
    }

    #[test]
    fn determinize_names_are_stable() {
        let mut a = Engine::default();
        let mut b = Engine::default();

        let nfa_a = a.compile("(a|b)*ab").unwrap();
        let nfa_b = b.compile("(a|b)*ab").unwrap();
        assert_eq!(
            a.determinize(&nfa_a).unwrap(),
            b.determinize(&nfa_b).unwrap()
        );
    }

    #[test]
    fn auto_optimize_minimizes_output() {
        let pattern = "(a|b)*a";
        let mut plain = Engine::default();
        let mut auto = Engine::new(Config {
            auto_optimize: true,
            ..Config::default()
        });

        let nfa = plain.compile(pattern).unwrap();
        let big = plain.determinize(&nfa).unwrap();
        let nfa = auto.compile(pattern).unwrap();
        let small = auto.determinize(&nfa).unwrap();

        assert!(small.state_count() <= big.state_count());
        let (reopt, changes) = auto.optimize(&small).unwrap();
        assert!(changes.is_empty());
        assert_eq!(reopt, small);
    }

    #[test]
    fn state_limit_aborts_without_caching() {
        let mut engine = Engine::new(Config {
            max_states: Some(1),
            ..Config::default()
        });

        let nfa = engine.compile("ab").unwrap();
        assert_eq!(
            engine.determinize(&nfa),
            Err(Error::StateLimit { limit: 1 })
        );

        // only the compile result was cached
        assert_eq!(engine.cache_stats().size, 1);
    }

    #[test]
    fn zero_timeout_aborts() {
        let mut engine = Engine::new(Config {
            timeout: Some(Duration::ZERO),
            ..Config::default()
        });

        let nfa = engine.compile("a").unwrap();
        assert_eq!(
            engine.determinize(&nfa),
            Err(Error::Timeout {
                budget: Duration::ZERO
            })
        );
    }

    #[test]
    fn equivalence_of_minimized_self() {
        let mut engine = Engine::default();
        let nfa = engine.compile("a(b|c)*").unwrap();
        let dfa = engine.determinize(&nfa).unwrap();
        let (min, _) = engine.optimize(&dfa).unwrap();

        assert_eq!(engine.equivalent(&dfa, &min), Ok(true));

        let other = engine.compile("a(b|c)*c").unwrap();
        let other = engine.determinize(&other).unwrap();
        assert_eq!(engine.equivalent(&dfa, &other), Ok(false));
    }

    #[test]
    fn syntax_errors_surface_positions() {
        let mut engine = Engine::default();
        let Err(Error::Syntax { pos, .. }) = engine.compile("a(b") else {
            panic!("expected a syntax error");
        };
        assert_eq!(pos, 1);
    }

    #[test]
    fn stats_record_successes_only() {
        let mut engine = Engine::default();
        engine.compile("a*").unwrap();
        engine.compile("a*").unwrap();
        assert!(engine.compile("(").is_err());

        let summary = engine.stats_summary();
        assert_eq!(summary.count, 2);

        let breakdown = engine.stats_breakdown();
        assert_eq!(breakdown[&crate::cache::OpKind::Compile].count, 2);

        engine.reset_metrics();
        assert_eq!(engine.stats_summary().count, 0);
        assert_eq!(engine.cache_stats().size, 0);
    }

    #[test]
    fn round_trip_through_regex() {
        let mut engine = Engine::default();
        let nfa = engine.compile("a*b").unwrap();
        let flat = engine.eliminate_epsilon(&nfa).unwrap();
        let dfa = engine.determinize(&flat).unwrap();
        let re = engine.to_regex(&dfa).unwrap();

        let back = engine.compile(&re.to_pattern()).unwrap();
        let back = engine.determinize(&back).unwrap();
        assert_eq!(engine.equivalent(&dfa, &back), Ok(true));
    }
}
