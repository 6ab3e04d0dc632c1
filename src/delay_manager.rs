use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use log::info;
use rand::Rng;

/// Blocking wait used at every suspension point that is not a browser call.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Records requested waits instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}

/// Inter-target back-pressure: a mandatory minimum plus optional random jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayPolicy {
    pub minimum: Duration,
    pub jitter: Duration,
}

impl DelayPolicy {
    pub fn new(minimum: Duration, jitter: Duration) -> Self {
        DelayPolicy { minimum, jitter }
    }

    pub fn next_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.minimum;
        }
        let mut rng = rand::thread_rng();
        let extra_ms = rng.gen_range(0..=self.jitter.as_millis() as u64);
        self.minimum + Duration::from_millis(extra_ms)
    }

    pub fn wait(&self, sleeper: &dyn Sleeper) {
        let delay = self.next_delay();
        info!("Waiting for {:.1} seconds before the next profile...", delay.as_secs_f64());
        sleeper.sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_never_drops_below_minimum() {
        let policy = DelayPolicy::new(Duration::from_secs(2), Duration::from_millis(500));
        for _ in 0..50 {
            let d = policy.next_delay();
            assert!(d >= Duration::from_secs(2));
            assert!(d <= Duration::from_millis(2500));
        }
    }

    #[test]
    fn wait_goes_through_the_sleeper() {
        let sleeper = RecordingSleeper::default();
        DelayPolicy::new(Duration::from_secs(5), Duration::ZERO).wait(&sleeper);
        assert_eq!(sleeper.waits(), vec![Duration::from_secs(5)]);
    }
}
