use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};

/// Wall-clock source for scheduling and due checks.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Start of the current local day. Revision due checks compare against
    /// this rather than the exact instant.
    fn today(&self) -> DateTime<Utc> {
        start_of_day(self.now(), &Local)
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant, with midnight taken in UTC.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }

    fn today(&self) -> DateTime<Utc> {
        start_of_day(self.0, &Utc)
    }
}

pub fn start_of_day<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let midnight = at.with_timezone(tz).date_naive().and_time(NaiveTime::MIN);
    // A DST gap can swallow local midnight; fall back to UTC midnight then.
    match tz.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&midnight),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    #[test]
    fn start_of_day_in_utc() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 17, 45, 12).unwrap();
        assert_eq!(
            start_of_day(at, &Utc),
            Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn start_of_day_respects_offset() {
        // 20:00 UTC is already the next day at +05:30
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
        let midnight = start_of_day(at, &ist);
        assert_eq!(
            midnight,
            Utc.with_ymd_and_hms(2024, 3, 10, 18, 30, 0).unwrap()
        );
        assert!(midnight <= at);
        assert!(at - midnight < Duration::days(1));
    }

    #[test]
    fn fixed_clock_is_frozen() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.today(), Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn system_clock_today_is_not_after_now() {
        let clock = SystemClock;
        let today = clock.today();
        let now = clock.now();
        assert!(today <= now);
        assert!(now - today <= Duration::hours(26));
    }
}
