use chrono::{
    DateTime, Datelike, Days, Local, LocalResult, NaiveDateTime, TimeZone, Timelike, Weekday,
};

use crate::habit::ReminderTime;

/// A same-day occurrence closer than this is pushed a full week out, so a
/// reminder set for "right now" never fires on the spot.
pub const SAME_DAY_LOOKAHEAD_MINUTES: i64 = 15;

pub fn next_occurrence(
    days: &[Weekday],
    time: ReminderTime,
    now: &DateTime<Local>,
) -> Option<DateTime<Local>> {
    next_occurrence_in_tz(days, time, now, &Local)
}

/// Nearest upcoming occurrence of `time` on one of `days`, strictly after
/// `now`. `None` when `days` is empty; callers treat that as "nothing to
/// schedule", not as an error.
pub fn next_occurrence_in_tz<Tz>(
    days: &[Weekday],
    time: ReminderTime,
    now: &DateTime<Tz>,
    timezone: &Tz,
) -> Option<DateTime<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    let today = now.weekday().num_days_from_sunday();
    let now_minutes = i64::from(now.hour() * 60 + now.minute());
    let target_minutes = i64::from(time.minutes_from_midnight());

    let mut nearest: Option<u64> = None;
    for day in days {
        let mut days_until = u64::from((day.num_days_from_sunday() + 7 - today) % 7);
        if days_until == 0 && target_minutes - now_minutes < SAME_DAY_LOOKAHEAD_MINUTES {
            // Today's slot already passed or is about to; push to next week.
            days_until = 7;
        }
        nearest = Some(nearest.map_or(days_until, |best| best.min(days_until)));
    }
    let days_until = nearest?;

    let date = now.date_naive().checked_add_days(Days::new(days_until))?;
    if let Some(candidate) = resolve_local_datetime(timezone, date.and_time(time.time()))
        && candidate > *now
    {
        return Some(candidate);
    }

    // Clock skew or a DST shift can leave the computed instant unresolvable
    // or behind `now`; push one calendar day and recheck once.
    let bumped = date.checked_add_days(Days::new(1))?;
    let candidate = resolve_local_datetime(timezone, bumped.and_time(time.time()))?;
    (candidate > *now).then_some(candidate)
}

fn resolve_local_datetime<Tz>(timezone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(first, _second) => Some(first),
        LocalResult::None => None,
    }
}
