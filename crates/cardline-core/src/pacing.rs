//! Fixed rate-limit pacing for remote calls

use std::time::Duration;

/// Something that can block the current thread for a while.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Real sleeper backed by [`std::thread::sleep`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Pause `pause` once every `batch_size` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    /// Rows per block; 0 disables pacing
    pub batch_size: usize,
    pub pause: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            batch_size: 10,
            pause: Duration::from_secs(1),
        }
    }
}

/// Run-local pacing state.
///
/// Every row calls [`Pacer::tick`] before it is processed. The pacer sleeps on
/// the `batch_size`-th, `2 * batch_size`-th, ... tick, so N rows cause exactly
/// `N / batch_size` pauses.
pub struct Pacer {
    policy: PacingPolicy,
    sleeper: Box<dyn Sleeper>,
    ticks: usize,
    pauses: usize,
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("policy", &self.policy)
            .field("ticks", &self.ticks)
            .field("pauses", &self.pauses)
            .finish_non_exhaustive()
    }
}

impl Pacer {
    pub fn new(policy: PacingPolicy) -> Self {
        Self::with_sleeper(policy, ThreadSleeper)
    }

    pub fn with_sleeper(policy: PacingPolicy, sleeper: impl Sleeper + 'static) -> Self {
        Self {
            policy,
            sleeper: Box::new(sleeper),
            ticks: 0,
            pauses: 0,
        }
    }

    /// Count one row; returns true if this tick paused.
    pub fn tick(&mut self) -> bool {
        self.ticks += 1;
        if self.policy.batch_size == 0 || self.ticks % self.policy.batch_size != 0 {
            return false;
        }
        log::debug!(
            "pacing: {} rows done, pausing {:?}",
            self.ticks,
            self.policy.pause
        );
        self.sleeper.sleep(self.policy.pause);
        self.pauses += 1;
        true
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn pauses(&self) -> usize {
        self.pauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSleeper(Arc<Mutex<Vec<Duration>>>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    fn pacer(batch_size: usize) -> (Pacer, RecordingSleeper) {
        let sleeper = RecordingSleeper::default();
        let policy = PacingPolicy {
            batch_size,
            pause: Duration::from_millis(250),
        };
        (Pacer::with_sleeper(policy, sleeper.clone()), sleeper)
    }

    #[test]
    fn sleeps_floor_n_over_batch() {
        for n in [0usize, 1, 9, 10, 11, 19, 20, 25, 100] {
            let (mut pacer, sleeper) = pacer(10);
            for _ in 0..n {
                pacer.tick();
            }
            assert_eq!(sleeper.0.lock().unwrap().len(), n / 10, "n={n}");
            assert_eq!(pacer.pauses(), n / 10);
            assert_eq!(pacer.ticks(), n);
        }
    }

    #[test]
    fn pauses_on_the_tenth_row() {
        let (mut pacer, _) = pacer(10);
        let paused: Vec<bool> = (0..10).map(|_| pacer.tick()).collect();
        assert!(paused[..9].iter().all(|p| !p));
        assert!(paused[9]);
    }

    #[test]
    fn pause_duration_from_policy() {
        let (mut pacer, sleeper) = pacer(2);
        pacer.tick();
        pacer.tick();
        assert_eq!(*sleeper.0.lock().unwrap(), vec![Duration::from_millis(250)]);
    }

    #[test]
    fn zero_batch_disables_pacing() {
        let (mut pacer, sleeper) = pacer(0);
        for _ in 0..50 {
            assert!(!pacer.tick());
        }
        assert!(sleeper.0.lock().unwrap().is_empty());
    }

    #[test]
    fn default_policy_is_ten_rows_one_second() {
        let policy = PacingPolicy::default();
        assert_eq!(policy.batch_size, 10);
        assert_eq!(policy.pause, Duration::from_secs(1));
    }
}
