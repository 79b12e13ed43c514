use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Converts a local wall-clock time (`minutes` after local midnight of
/// `date`, 1440 meaning the next midnight) to UTC. Ambiguous times take the
/// earlier instant; times inside a DST gap move forward to the first valid
/// local minute.
pub fn local_to_utc(tz: Tz, date: NaiveDate, minutes: i32) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    let naive = midnight.checked_add_signed(Duration::minutes(minutes as i64)).unwrap_or(midnight);

    let mut candidate = naive;
    for _ in 0..=(24 * 60) {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return dt.with_timezone(&Utc),
            LocalResult::Ambiguous(a, b) => return a.min(b).with_timezone(&Utc),
            LocalResult::None => match candidate.checked_add_signed(Duration::minutes(1)) {
                Some(next) => candidate = next,
                None => break,
            },
        }
    }
    Utc.from_utc_datetime(&naive)
}

/// `now + minutes`, or `None` past the end of the representable range.
pub fn add_minutes(now: DateTime<Utc>, minutes: i64) -> Option<DateTime<Utc>> {
    Duration::try_minutes(minutes).and_then(|d| now.checked_add_signed(d))
}

/// `now + days`, or `None` past the end of the representable range.
pub fn add_days(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|d| now.checked_add_signed(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_local_to_utc_handles_gaps_and_folds() {
        let berlin: Tz = "Europe/Berlin".parse().unwrap();

        // 02:30 does not exist on 2025-03-30; it resolves to 03:00 CEST.
        assert_eq!(local_to_utc(berlin, date(2025, 3, 30), 150), utc(2025, 3, 30, 1, 0));
        // 02:30 happens twice on 2025-10-26; the earlier (CEST) instant wins.
        assert_eq!(local_to_utc(berlin, date(2025, 10, 26), 150), utc(2025, 10, 26, 0, 30));
        // 1440 minutes is the following midnight.
        assert_eq!(local_to_utc(chrono_tz::UTC, date(2025, 3, 10), 1440), utc(2025, 3, 11, 0, 0));
    }

    #[test]
    fn test_local_to_utc_at_the_end_of_time() {
        let last = NaiveDate::MAX;
        let converted = local_to_utc(chrono_tz::UTC, last, 1440);
        assert_eq!(converted.date_naive(), last);
    }

    #[test]
    fn test_offsets_past_the_range_are_none() {
        let now = utc(2025, 3, 10, 8, 0);
        assert_eq!(add_minutes(now, 90), Some(utc(2025, 3, 10, 9, 30)));
        assert_eq!(add_days(now, 2), Some(utc(2025, 3, 12, 8, 0)));
        assert_eq!(add_days(now, i32::MAX as i64), None);
        assert_eq!(add_minutes(DateTime::<Utc>::MAX_UTC, 1), None);
    }
}
