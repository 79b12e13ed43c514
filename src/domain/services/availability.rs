use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use crate::domain::models::availability::{AvailabilityRule, BlackoutDate};
use crate::domain::models::booking::Booking;
use crate::domain::models::settings::{BookingSettings, DEFAULT_SLOT_STEP_MIN, MAX_ADVANCE_DAYS, MAX_LEAD_TIME_MIN};
use crate::domain::models::time::{add_days, add_minutes, local_to_utc};
use crate::domain::services::interval::{Interval, IntervalSet};

/// Everything the slot engine needs, already loaded for one admin.
pub struct SlotInput<'a> {
    pub settings: &'a BookingSettings,
    pub rules: &'a [AvailabilityRule],
    pub blackouts: &'a [BlackoutDate],
    pub bookings: &'a [Booking],
    pub occupancy_min: i64,
}

/// Ordered bookable start instants for the inclusive local date range.
pub fn compute_available_slots(
    input: &SlotInput,
    start_date: NaiveDate,
    end_date: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    slots_by_day(input, start_date, end_date, now)
        .into_iter()
        .flat_map(|(_, slots)| slots)
        .collect()
}

/// Dates of the range that offer at least one slot.
pub fn available_dates(
    input: &SlotInput,
    start_date: NaiveDate,
    end_date: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<NaiveDate> {
    slots_by_day(input, start_date, end_date, now)
        .into_iter()
        .filter(|(_, slots)| !slots.is_empty())
        .map(|(date, _)| date)
        .collect()
}

/// Whether `start` is one of the slots the engine would offer right now.
pub fn is_slot_available(input: &SlotInput, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let date = start.with_timezone(&input.settings.tz()).date_naive();
    compute_available_slots(input, date, date, now).contains(&start)
}

/// Instants a new booking may start between, or `None` when the lead time
/// already runs past the advance horizon. Stored values beyond the write
/// clamps are read as the clamp.
pub fn bookable_window(settings: &BookingSettings, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let earliest = add_minutes(now, settings.lead_time_min.clamp(0, MAX_LEAD_TIME_MIN) as i64)?;
    let latest = add_days(now, settings.max_advance_days.clamp(0, MAX_ADVANCE_DAYS) as i64)?;
    (earliest <= latest).then_some((earliest, latest))
}

/// The part of the inclusive local date range that can carry slots at all.
pub fn bookable_dates(
    settings: &BookingSettings,
    start_date: NaiveDate,
    end_date: NaiveDate,
    now: DateTime<Utc>,
) -> Option<(NaiveDate, NaiveDate)> {
    let tz = settings.tz();
    let (earliest, latest) = bookable_window(settings, now)?;
    let first = start_date.max(earliest.with_timezone(&tz).date_naive());
    let last = end_date.min(latest.with_timezone(&tz).date_naive());
    (first <= last).then_some((first, last))
}

fn slots_by_day(
    input: &SlotInput,
    start_date: NaiveDate,
    end_date: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<(NaiveDate, Vec<DateTime<Utc>>)> {
    let settings = input.settings;
    let tz = settings.tz();

    let Some((earliest, latest)) = bookable_window(settings, now) else {
        return Vec::new();
    };
    // Days outside [earliest, latest] cannot carry slots.
    let Some((first, last)) = bookable_dates(settings, start_date, end_date, now) else {
        return Vec::new();
    };

    let step = if settings.slot_step_min > 0 { settings.slot_step_min } else { DEFAULT_SLOT_STEP_MIN };
    let step = Duration::minutes(step as i64);
    let Some(occupancy) = Duration::try_minutes(input.occupancy_min.max(0)) else {
        return Vec::new();
    };

    let mut days = Vec::new();
    let mut date = first;
    loop {
        let free = free_windows(input, tz, date);

        let mut slots = Vec::new();
        for window in free.intervals() {
            let mut cursor = window.start;
            while cursor < window.end && cursor.checked_add_signed(occupancy).is_some_and(|end| end <= window.end) {
                if cursor >= earliest && cursor <= latest {
                    slots.push(cursor);
                }
                match cursor.checked_add_signed(step) {
                    Some(next) => cursor = next,
                    None => break,
                }
            }
        }

        days.push((date, slots));
        match date.succ_opt() {
            Some(next) if next <= last => date = next,
            _ => break,
        }
    }
    days
}

/// Rule time minus blackouts and bookings for one local day of the admin.
fn free_windows(input: &SlotInput, tz: Tz, date: NaiveDate) -> IntervalSet {
    let Some(day) = Interval::new(local_to_utc(tz, date, 0), local_to_utc(tz, date, 1440)) else {
        return IntervalSet::new();
    };

    let mut rule_intervals = Vec::new();
    for rule in input.rules.iter().filter(|r| r.active) {
        debug_assert!(rule.start_minutes < rule.end_minutes, "rule {} has an empty window", rule.id);

        let rule_tz: Tz = rule.time_zone.parse().unwrap_or(tz);

        // A rule in another zone can reach into this day from a neighbouring
        // local date of its own zone.
        for offset in -1..=1 {
            let Some(local_date) = date.checked_add_signed(Duration::days(offset)) else { continue };
            if local_date.weekday().num_days_from_sunday() as i32 != rule.day_of_week {
                continue;
            }
            let window = Interval::new(
                local_to_utc(rule_tz, local_date, rule.start_minutes),
                local_to_utc(rule_tz, local_date, rule.end_minutes),
            );
            if let Some(clipped) = window.and_then(|w| w.intersect(&day)) {
                rule_intervals.push(clipped);
            }
        }
    }

    let blocked: Vec<Interval> = input.blackouts.iter()
        .filter_map(|b| Interval::new(b.start_time, b.end_time))
        .chain(
            input.bookings.iter()
                .filter(|b| !b.is_cancelled())
                .filter_map(|b| Interval::new(b.start_time, b.end_time)),
        )
        .filter(|i| i.overlaps(&day))
        .collect();

    IntervalSet::from_intervals(rule_intervals).subtract(blocked.iter())
}
