//! Time source for object keys and run reports.

use chrono::{DateTime, Utc};

/// Supplies the current UTC time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Create a clock stopped at `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// `strftime` pattern of the timestamp embedded in object keys.
pub const KEY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Builds `<prefix><timestamp><extension>`.
pub fn target_key(prefix: &str, at: DateTime<Utc>, extension: &str) -> String {
    format!("{}{}{}", prefix, at.format(KEY_TIMESTAMP_FORMAT), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_target_key() {
        let at = Utc.with_ymd_and_hms(2023, 7, 4, 9, 5, 3).unwrap();
        assert_eq!(
            target_key("cda/fi_", at, ".csv"),
            "cda/fi_2023-07-04_090503.csv"
        );
        assert_eq!(target_key("", at, ""), "2023-07-04_090503");
    }

    #[test]
    fn test_fixed_clock() {
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let clock = FixedClock::new(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), clock.now());
    }
}
