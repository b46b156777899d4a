use std::time::{SystemTime, UNIX_EPOCH};

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_DAY: i64 = 86_400_000;

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Wall clock shifted into the player's local time zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalClock {
    pub utc_offset_minutes: i32,
}

impl LocalClock {
    pub fn new(utc_offset_minutes: i32) -> Self {
        Self { utc_offset_minutes }
    }

    fn local_millis(&self, now_ms: i64) -> i64 {
        now_ms + i64::from(self.utc_offset_minutes) * MS_PER_MINUTE
    }

    pub fn hour(&self, now_ms: i64) -> u32 {
        (self.local_millis(now_ms).rem_euclid(MS_PER_DAY) / 3_600_000) as u32
    }

    /// Day of week with Sunday as 0. The epoch fell on a Thursday.
    pub fn weekday(&self, now_ms: i64) -> u32 {
        let days = self.local_millis(now_ms).div_euclid(MS_PER_DAY);
        (days + 4).rem_euclid(7) as u32
    }

    pub fn is_weekend(&self, now_ms: i64) -> bool {
        matches!(self.weekday(now_ms), 0 | 6)
    }
}

pub fn seconds_between(from_ms: i64, to_ms: i64) -> f64 {
    (to_ms - from_ms).max(0) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-06-15T01:30:00Z, a Saturday.
    const SATURDAY_EARLY: i64 = 1_718_415_000_000;

    #[test]
    fn hour_and_weekday_follow_utc_without_offset() {
        let clock = LocalClock::default();
        assert_eq!(clock.hour(SATURDAY_EARLY), 1);
        assert_eq!(clock.weekday(SATURDAY_EARLY), 6);
        assert!(clock.is_weekend(SATURDAY_EARLY));
    }

    #[test]
    fn offset_can_move_the_local_day() {
        let clock = LocalClock::new(-120);
        assert_eq!(clock.hour(SATURDAY_EARLY), 23);
        assert_eq!(clock.weekday(SATURDAY_EARLY), 5);
        assert!(!clock.is_weekend(SATURDAY_EARLY));
    }

    #[test]
    fn epoch_is_a_thursday() {
        assert_eq!(LocalClock::default().weekday(0), 4);
    }

    #[test]
    fn seconds_between_never_goes_negative() {
        assert_eq!(seconds_between(5_000, 2_000), 0.0);
        assert_eq!(seconds_between(1_000, 3_500), 2.5);
    }
}
