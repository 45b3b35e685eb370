//! Wall-clock refresh scheduling.

use chrono::{DateTime, Days, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};

/// The next refresh slot strictly after `now`.
///
/// `times` are daily wall-clock slots in `now`'s timezone. If a slot later
/// today remains it is returned; otherwise the earliest slot tomorrow. With no
/// slots at all the next refresh is a day away.
///
/// A slot that falls in a DST gap runs an hour later on the shifted clock. A
/// slot that occurs twice when clocks go back runs at the earlier instant.
pub fn next_refresh_after<Tz: TimeZone>(now: &DateTime<Tz>, times: &[NaiveTime]) -> DateTime<Tz> {
    let zone = now.timezone();
    let today = now.date_naive();

    let mut slots = times.to_vec();
    slots.sort_unstable();

    // Two days ahead covers a slot skipped by a gap on the day after
    for offset in 0..=2 {
        let Some(day) = today.checked_add_days(Days::new(offset)) else {
            break;
        };
        for time in &slots {
            if let Some(slot) = resolve_local(&zone, day.and_time(*time)).filter(|s| s > now) {
                return slot;
            }
        }
    }

    now.clone() + TimeDelta::days(1)
}

fn resolve_local<Tz: TimeZone>(zone: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    zone.from_local_datetime(&local)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(local + TimeDelta::hours(1))).earliest())
}
