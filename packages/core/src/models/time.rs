//! Time Provider Abstraction
//!
//! Event nodes are stamped with the time of the creation they record. The
//! clock is injected so tests can assert exact timestamps.
//!
//! # Examples
//!
//! ```rust
//! use nodegraph_core::models::time::{TimeProvider, SystemTimeProvider};
//! use chrono::Utc;
//!
//! let provider = SystemTimeProvider;
//! let now = provider.now();
//! assert!(now <= Utc::now());
//! ```

use chrono::{DateTime, Utc};

/// Trait for providing current time
pub trait TimeProvider: Send + Sync {
    /// Get the current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// System time provider using actual system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time provider frozen at a single instant
///
/// ```rust
/// use nodegraph_core::models::time::{FixedTimeProvider, TimeProvider};
/// use chrono::{TimeZone, Utc};
///
/// let instant = Utc.with_ymd_and_hms(2025, 1, 3, 9, 30, 0).unwrap();
/// let provider = FixedTimeProvider::new(instant);
/// assert_eq!(provider.now(), instant);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeProvider {
    instant: DateTime<Utc>,
}

impl FixedTimeProvider {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}
