use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A source of monotonically increasing time readings.
///
/// Readings are measured from an arbitrary origin; only differences matter.
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Wall-clock source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced time, for headless simulation and tests.
///
/// Clones share the same reading, so a caller can keep one handle and
/// hand another to an [`AnimationClock`].
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<Duration>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward. Saturates at `Duration::MAX`.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by));
    }

    /// Move time forward by fractional seconds. Negative or NaN steps are
    /// ignored; steps too large for a `Duration` saturate.
    pub fn advance_secs(&self, secs: f64) {
        let step = Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX);
        self.advance(step);
    }

    pub fn set(&self, at: Duration) {
        self.now.set(at);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Elapsed time since construction, in seconds.
///
/// Never resets and never runs backwards: a source that steps back is
/// clamped to the last reading.
pub struct AnimationClock {
    source: Box<dyn TimeSource>,
    start: Duration,
    last: Cell<f64>,
}

impl AnimationClock {
    /// Clock driven by the system monotonic time.
    pub fn new() -> Self {
        Self::with_source(MonotonicTime::new())
    }

    pub fn with_source(source: impl TimeSource + 'static) -> Self {
        let start = source.now();
        Self {
            source: Box::new(source),
            start,
            last: Cell::new(0.0),
        }
    }

    /// Seconds elapsed since the clock was constructed.
    pub fn elapsed(&self) -> f64 {
        let reading = self.source.now().saturating_sub(self.start).as_secs_f64();
        let elapsed = reading.max(self.last.get());
        self.last.set(elapsed);
        elapsed
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnimationClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationClock")
            .field("last", &self.last.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let time = ManualTime::new();
        time.advance_secs(12.0);
        let clock = AnimationClock::with_source(time.clone());
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn follows_source() {
        let time = ManualTime::new();
        let clock = AnimationClock::with_source(time.clone());
        time.advance_secs(0.5);
        assert!((clock.elapsed() - 0.5).abs() < 1e-9);
        time.advance_secs(0.25);
        assert!((clock.elapsed() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn never_runs_backwards() {
        let time = ManualTime::new();
        time.set(Duration::from_secs(10));
        let clock = AnimationClock::with_source(time.clone());
        time.set(Duration::from_secs(12));
        assert_eq!(clock.elapsed(), 2.0);
        time.set(Duration::from_secs(11));
        assert_eq!(clock.elapsed(), 2.0);
        time.set(Duration::from_secs(5));
        assert_eq!(clock.elapsed(), 2.0);
    }

    #[test]
    fn oversized_steps_saturate() {
        let time = ManualTime::new();
        let clock = AnimationClock::with_source(time.clone());
        time.advance_secs(1.0 / 1e-20);
        assert_eq!(time.now(), Duration::MAX);
        time.advance_secs(f64::INFINITY);
        time.advance(Duration::from_secs(1));
        assert_eq!(time.now(), Duration::MAX);
        assert!(clock.elapsed() > 0.0);
    }

    #[test]
    fn negative_and_nan_steps_are_ignored() {
        let time = ManualTime::new();
        time.advance_secs(-3.0);
        time.advance_secs(f64::NAN);
        assert_eq!(time.now(), Duration::ZERO);
    }

    #[test]
    fn monotonic_source_is_non_decreasing() {
        let clock = AnimationClock::new();
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(a >= 0.0);
        assert!(b >= a);
    }
}
