use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Resource bounds threaded into the long-running construction loops.
///
/// The state cap is the sole guard against subset-construction blow-up; the
/// deadline aborts only the operation carrying it. Both leave shared state
/// untouched — callers cache results on success only.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    max_states: Option<usize>,
    started: Instant,
    budget: Option<Duration>,
}

impl Default for Limits {
    #[inline]
    fn default() -> Self { Self::new(None, None) }
}

impl Limits {
    #[must_use]
    pub fn new(max_states: Option<usize>, budget: Option<Duration>) -> Self {
        Self {
            max_states,
            started: Instant::now(),
            budget,
        }
    }

    /// Fails once the number of constructed states passes the cap.
    pub fn check_states(&self, states: usize) -> Result<()> {
        match self.max_states {
            Some(limit) if states > limit => Err(Error::StateLimit { limit }),
            _ => Ok(()),
        }
    }

    /// Fails once the wall-clock budget is spent.
    pub fn check_time(&self) -> Result<()> {
        match self.budget {
            Some(budget) if self.started.elapsed() >= budget => Err(Error::Timeout { budget }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::Limits;
    use crate::error::Error;

    #[test]
    fn unbounded_always_passes() {
        let limits = Limits::default();
        assert_eq!(limits.check_states(usize::MAX), Ok(()));
        assert_eq!(limits.check_time(), Ok(()));
    }

    #[test]
    fn state_cap_is_inclusive() {
        let limits = Limits::new(Some(4), None);
        assert_eq!(limits.check_states(4), Ok(()));
        assert_eq!(
            limits.check_states(5),
            Err(Error::StateLimit { limit: 4 })
        );
    }

    #[test]
    fn zero_budget_fails_immediately() {
        let limits = Limits::new(None, Some(Duration::ZERO));
        assert_eq!(
            limits.check_time(),
            Err(Error::Timeout {
                budget: Duration::ZERO
            })
        );
    }
}
