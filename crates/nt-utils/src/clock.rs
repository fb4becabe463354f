//! Process clock with test freeze.
//!
//! Commands read "now" through [`Clock`] so that tests can pin timestamps
//! and make pack/index bytes deterministic. The freeze is process-wide;
//! test harnesses must call [`Clock::unfreeze`] between cases.

use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};

static FROZEN: Mutex<Option<DateTime<Utc>>> = Mutex::new(None);

/// Monotonically readable "now", freezable in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock;

impl Clock {
    /// Current UTC time, or the frozen instant when one is installed.
    pub fn now() -> DateTime<Utc> {
        if let Some(frozen) = *FROZEN.lock().expect("clock lock poisoned") {
            return frozen;
        }
        Utc::now()
    }

    /// Freeze the clock at `instant` until [`Clock::unfreeze`].
    pub fn freeze(instant: DateTime<Utc>) {
        *FROZEN.lock().expect("clock lock poisoned") = Some(instant);
    }

    /// Freeze at an RFC-3339 instant, e.g. `2023-01-01T01:12:30Z`.
    pub fn freeze_at(rfc3339: &str) {
        let instant = DateTime::parse_from_rfc3339(rfc3339)
            .expect("invalid RFC-3339 instant")
            .with_timezone(&Utc);
        Self::freeze(instant);
    }

    /// Restore the real clock.
    pub fn unfreeze() {
        *FROZEN.lock().expect("clock lock poisoned") = None;
    }

    /// RFC-3339 UTC rendering used in packs and the index.
    pub fn to_rfc3339(instant: DateTime<Utc>) -> String {
        instant.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeze_and_unfreeze() {
        Clock::freeze_at("2023-01-01T01:12:30Z");
        assert_eq!(Clock::to_rfc3339(Clock::now()), "2023-01-01T01:12:30Z");
        assert_eq!(Clock::now(), Clock::now());
        Clock::unfreeze();
    }
}
