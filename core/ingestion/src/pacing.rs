//! Fixed-interval pacing between submissions to a rate-limited service.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Source of delays. Production code waits on the tokio timer; tests record.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Lets the first caller through immediately and makes every later caller
/// wait one full interval.
pub struct Pacer {
    interval: Duration,
    sleeper: Box<dyn Sleeper>,
    primed: bool,
}

impl Pacer {
    pub fn new(interval: Duration, sleeper: Box<dyn Sleeper>) -> Self {
        Self {
            interval,
            sleeper,
            primed: false,
        }
    }

    /// Pacer backed by the tokio timer.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(interval, Box::new(TokioSleeper))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Forget previous calls; the next `ready` passes immediately.
    pub fn reset(&mut self) {
        self.primed = false;
    }

    /// Wait for the next slot. Returns `true` when this call was a paced gap
    /// (every call after the first since the last reset).
    pub async fn ready(&mut self) -> bool {
        if !self.primed {
            self.primed = true;
            return false;
        }

        if !self.interval.is_zero() {
            debug!("Pacing: waiting {:?} before next submission", self.interval);
            self.sleeper.sleep(self.interval).await;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Duration>>>);

    #[async_trait]
    impl Sleeper for Recorder {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    #[tokio::test]
    async fn test_first_call_is_free() {
        let recorder = Recorder::default();
        let mut pacer = Pacer::new(Duration::from_secs(20), Box::new(recorder.clone()));

        assert!(!pacer.ready().await);
        assert!(pacer.ready().await);
        assert!(pacer.ready().await);
        assert_eq!(
            recorder.0.lock().unwrap().as_slice(),
            [Duration::from_secs(20), Duration::from_secs(20)]
        );
    }

    #[tokio::test]
    async fn test_reset_restarts_sequence() {
        let recorder = Recorder::default();
        let mut pacer = Pacer::new(Duration::from_secs(5), Box::new(recorder.clone()));

        pacer.ready().await;
        pacer.reset();
        assert!(!pacer.ready().await);
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_interval_never_sleeps() {
        let recorder = Recorder::default();
        let mut pacer = Pacer::new(Duration::ZERO, Box::new(recorder.clone()));

        pacer.ready().await;
        assert!(pacer.ready().await);
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_waits_interval() {
        let mut pacer = Pacer::with_interval(Duration::from_secs(15));
        let start = tokio::time::Instant::now();

        pacer.ready().await;
        pacer.ready().await;
        assert!(start.elapsed() >= Duration::from_secs(15));
    }
}
