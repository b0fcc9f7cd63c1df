use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Timelike, Utc, Weekday};

/// Abstraction over wall time so risk/entry-window predicates are testable
/// without sleeping or depending on the system clock.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    fn now_ist(&self) -> DateTime<FixedOffset> {
        to_ist(self.now_utc())
    }
}

/// Production [`Clock`] backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test [`Clock`] that always returns a programmed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// IST is a fixed UTC+05:30 offset; no DST, so no tz-database lookup is needed.
pub fn ist_offset() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("IST offset is a valid fixed offset")
}

pub fn to_ist(utc: DateTime<Utc>) -> DateTime<FixedOffset> {
    utc.with_timezone(&ist_offset())
}

pub fn is_weekday(ist: DateTime<FixedOffset>) -> bool {
    !matches!(ist.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Exchange session window, expressed as IST wall-clock-of-day boundaries.
#[derive(Debug, Clone, Copy)]
pub struct SessionCalendar {
    pub session_open: NaiveTime,
    pub session_close: NaiveTime,
    pub entry_open: NaiveTime,
    pub entry_close: NaiveTime,
    pub force_flat: NaiveTime,
}

impl Default for SessionCalendar {
    fn default() -> Self {
        Self {
            session_open: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            session_close: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            entry_open: NaiveTime::from_hms_opt(9, 25, 0).unwrap(),
            entry_close: NaiveTime::from_hms_opt(15, 10, 0).unwrap(),
            force_flat: NaiveTime::from_hms_opt(15, 25, 0).unwrap(),
        }
    }
}

impl SessionCalendar {
    fn time_of_day(ist: DateTime<FixedOffset>) -> NaiveTime {
        NaiveTime::from_hms_opt(ist.hour(), ist.minute(), ist.second()).unwrap()
    }

    /// `true` for [09:15, 15:30] IST on a weekday.
    pub fn within_session(&self, ist: DateTime<FixedOffset>) -> bool {
        is_weekday(ist) && {
            let t = Self::time_of_day(ist);
            t >= self.session_open && t <= self.session_close
        }
    }

    /// `true` inside the configured entry window.
    pub fn within_entry_window(&self, ist: DateTime<FixedOffset>) -> bool {
        is_weekday(ist) && {
            let t = Self::time_of_day(ist);
            t >= self.entry_open && t <= self.entry_close
        }
    }

    /// `true` at or after the unconditional force-flat cutoff.
    pub fn at_or_after_force_flat(&self, ist: DateTime<FixedOffset>) -> bool {
        Self::time_of_day(ist) >= self.force_flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ist_on(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        ist_offset()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn entry_window_is_inclusive() {
        let cal = SessionCalendar::default();
        assert!(cal.within_entry_window(ist_on(2026, 8, 3, 9, 25)));
        assert!(cal.within_entry_window(ist_on(2026, 8, 3, 15, 10)));
        assert!(!cal.within_entry_window(ist_on(2026, 8, 3, 15, 11)));
    }

    #[test]
    fn force_flat_cutoff_is_monotone() {
        let cal = SessionCalendar::default();
        assert!(!cal.at_or_after_force_flat(ist_on(2026, 8, 3, 15, 24)));
        assert!(cal.at_or_after_force_flat(ist_on(2026, 8, 3, 15, 25)));
        assert!(cal.at_or_after_force_flat(ist_on(2026, 8, 3, 15, 30)));
    }

    #[test]
    fn weekend_is_never_in_session() {
        let cal = SessionCalendar::default();
        // 2026-08-01 is a Saturday.
        assert!(!cal.within_session(ist_on(2026, 8, 1, 10, 0)));
    }
}
