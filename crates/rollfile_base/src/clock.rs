//! Clock abstraction.
//!
//! Provides a trait for getting the current instant, with both real and mock
//! implementations to enable deterministic rotation tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Source of the current instant.
pub trait Clock: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for testing, fixed until moved explicitly.
///
/// Clones share the same instant, so a test can keep one clone and move time
/// underneath a writer that owns the other.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a mock clock fixed at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Jump to the given instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    /// Move the clock forward (or backward, for negative deltas).
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Handle to a clock implementation, mirroring [`crate::PalHandle`].
#[derive(Debug, Clone)]
pub struct ClockHandle(Arc<dyn Clock>);

impl ClockHandle {
    /// Create a new ClockHandle from a Clock implementation.
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self(Arc::new(clock))
    }

    /// Handle to the real system clock.
    pub fn system() -> Self {
        Self::new(SystemClock)
    }
}

impl Default for ClockHandle {
    fn default() -> Self {
        Self::system()
    }
}

impl std::ops::Deref for ClockHandle {
    type Target = dyn Clock;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
