use std::num::NonZeroU8;
use std::time::Duration;

use futures::Future;

use crate::Scheduler;

/// A `Runner` dispatches zips to fulfill orders using a provided `Scheduler`.
/// It returns a `Response` future, which may be polled to drive its operation
/// until completion of all deliveries.
pub trait Runner<S: Scheduler> {
    type Response: Future<Output = Result<Self::Success, Self::Error>>;
    type Success;
    type Error;

    /// Initialize the `Runner` to fulfill orders using the provided `Scheduler`.
    fn run(&self, scheduler: S) -> Self::Response;
}

/// Allows running in fast-forward or slow-motion instead of real-time
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speed {
    #[default]
    RealTime,
    /// Speed up the runner by the provided multiplier (e.g. `2` gives double speed)
    FastForward(NonZeroU8),
    /// Slow down the runner by the provided multiplier (e.g. `2` gives half speed)
    SlowMotion(NonZeroU8),
}

impl Speed {
    pub fn fast_forward(rate: u8) -> Option<Self> {
        NonZeroU8::new(rate).map(Self::FastForward)
    }

    pub fn slow_motion(rate: u8) -> Option<Self> {
        NonZeroU8::new(rate).map(Self::SlowMotion)
    }

    pub fn adjust_duration(&self, duration: Duration) -> Duration {
        match self {
            Self::RealTime => duration,
            Self::FastForward(x) => duration / x.get() as u32,
            Self::SlowMotion(x) => duration * x.get() as u32,
        }
    }

    /// Simulated seconds between status updates so that no more than
    /// `max_per_second` are published per wall-clock second
    pub fn update_interval_seconds(&self, max_per_second: u64) -> u64 {
        match self {
            Self::FastForward(x) => (x.get() as u64 / max_per_second.max(1)).max(1),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_adjust_duration() {
        let second = Duration::from_secs(1);

        assert_eq!(Speed::RealTime.adjust_duration(second), second);
        assert_eq!(
            Speed::fast_forward(4).map(|s| s.adjust_duration(second)),
            Some(Duration::from_millis(250))
        );
        assert_eq!(
            Speed::slow_motion(2).map(|s| s.adjust_duration(second)),
            Some(Duration::from_secs(2))
        );
        assert_eq!(Speed::fast_forward(0), None);
    }

    #[test]
    fn test_update_interval() {
        assert_eq!(Speed::RealTime.update_interval_seconds(4), 1);
        assert_eq!(Speed::fast_forward(200).map(|s| s.update_interval_seconds(4)), Some(50));
        // Never zero, even when slower than the update cap
        assert_eq!(Speed::fast_forward(2).map(|s| s.update_interval_seconds(4)), Some(1));
        assert_eq!(Speed::slow_motion(3).map(|s| s.update_interval_seconds(4)), Some(1));
    }
}
