use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::RetryStrategy;
use crate::error::Error;

/// A circuit breaker retry strategy.
///
/// While the count of consecutive failures stays below the threshold,
/// writes proceed immediately. Once tripped, the breaker holds writes until
/// `backoff` has elapsed since the most recent failure; a success resets
/// it. Never drops messages.
pub struct BreakerStrategy {
    threshold: u32,
    backoff: Duration,
    state: Mutex<BreakerState>,
}

#[derive(Default)]
struct BreakerState {
    recent: u32,
    last: Option<Instant>,
}

impl BreakerStrategy {
    pub fn new(threshold: u32, backoff: Duration) -> Self {
        Self {
            threshold,
            backoff,
            state: Mutex::new(BreakerState::default()),
        }
    }
}

impl<M> RetryStrategy<M> for BreakerStrategy {
    fn proceed(&self, _msg: &M) -> Duration {
        let state = self.state.lock();
        if state.recent < self.threshold {
            return Duration::ZERO;
        }

        match state.last {
            Some(last) => (last + self.backoff).saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    fn failure(&self, _msg: &M, _err: &Error) -> bool {
        let mut state = self.state.lock();
        state.recent += 1;
        state.last = Some(Instant::now());
        false
    }

    fn success(&self, _msg: &M) {
        let mut state = self.state.lock();
        state.recent = 0;
        state.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn probe_error() -> Error {
        Error::Destination("unavailable".to_string())
    }

    #[test]
    fn proceeds_below_threshold() {
        let breaker = BreakerStrategy::new(3, Duration::from_secs(10));

        assert_eq!(RetryStrategy::<()>::proceed(&breaker, &()), Duration::ZERO);

        assert!(!breaker.failure(&(), &probe_error()));
        assert!(!breaker.failure(&(), &probe_error()));
        assert_eq!(RetryStrategy::<()>::proceed(&breaker, &()), Duration::ZERO);
    }

    #[test]
    fn opens_at_threshold_and_resets_on_success() {
        let backoff = Duration::from_secs(10);
        let breaker = BreakerStrategy::new(2, backoff);

        assert!(!breaker.failure(&(), &probe_error()));
        assert!(!breaker.failure(&(), &probe_error()));

        let wait = RetryStrategy::<()>::proceed(&breaker, &());
        assert!(wait > Duration::ZERO);
        assert!(wait <= backoff);

        breaker.success(&());
        assert_eq!(RetryStrategy::<()>::proceed(&breaker, &()), Duration::ZERO);
    }

    #[test]
    fn open_breaker_wait_shrinks_as_the_window_elapses() {
        let breaker = BreakerStrategy::new(1, Duration::from_millis(50));
        assert!(!breaker.failure(&(), &probe_error()));

        let first = RetryStrategy::<()>::proceed(&breaker, &());
        std::thread::sleep(Duration::from_millis(10));
        let second = RetryStrategy::<()>::proceed(&breaker, &());

        assert!(second < first);
    }
}
