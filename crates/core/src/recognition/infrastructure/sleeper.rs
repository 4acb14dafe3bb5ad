use std::time::Duration;

/// Blocking wait used for all provider pacing.
///
/// Abstracted so tests can record the schedule instead of sleeping.
pub trait Sleeper: Send {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps the current thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::Sleeper;

    /// Records requested waits without sleeping.
    #[derive(Clone, Default)]
    pub struct RecordingSleeper {
        pub waits: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingSleeper {
        /// Non-zero waits in request order.
        pub fn nonzero(&self) -> Vec<Duration> {
            self.waits
                .lock()
                .unwrap()
                .iter()
                .copied()
                .filter(|d| !d.is_zero())
                .collect()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_thread_sleeper_zero_returns_immediately() {
        let start = Instant::now();
        ThreadSleeper.sleep(Duration::ZERO);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_thread_sleeper_waits_at_least_requested() {
        let start = Instant::now();
        ThreadSleeper.sleep(Duration::from_millis(20));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
