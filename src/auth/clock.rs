//! Time source for the expiring caches.

use chrono::{DateTime, Utc};

/// Supplies the current time.
///
/// The credential and standards caches read time only through this trait so
/// tests can drive expiry deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
