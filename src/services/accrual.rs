//! Accrual rule engine: punch times in, credit-hours out.
//!
//! Pure functions only; classification and persistence live elsewhere. A
//! weekday earns inside the 17:00–19:00 window at single rate, clamped at two
//! hours. Weekends and holidays earn inside 08:00–12:00 and 13:00–17:00 at
//! time-and-a-half with no per-day clamp (the monthly cap bounds the
//! aggregate).

use crate::database::models::DayType;

/// Minute window during which worked time earns credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CreditWindow {
    start: u32,
    end: u32,
}

const WEEKDAY_WINDOW: CreditWindow = CreditWindow {
    start: 17 * 60,
    end: 19 * 60,
};
const REST_DAY_MORNING: CreditWindow = CreditWindow {
    start: 8 * 60,
    end: 12 * 60,
};
const REST_DAY_AFTERNOON: CreditWindow = CreditWindow {
    start: 13 * 60,
    end: 17 * 60,
};

const WEEKDAY_CLAMP_HOURS: f64 = 2.0;
const REST_DAY_MULTIPLIER: f64 = 1.5;

/// Rounds to one decimal place, half away from zero. Applied exactly once,
/// on the final figure.
pub fn round_tenth(hours: f64) -> f64 {
    (hours * 10.0).round() / 10.0
}

/// Parses `HH:MM AM/PM` to minutes since midnight.
///
/// Hours 1..=12, minutes 0..=59, marker case-insensitive; 12 AM is midnight
/// and 12 PM is noon. Anything else yields `None` — a malformed punch
/// contributes nothing rather than failing the entry.
pub fn parse_punch(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let (clock, marker) = trimmed.split_once(' ')?;
    let marker = marker.trim();
    let is_pm = match marker.to_ascii_uppercase().as_str() {
        "AM" => false,
        "PM" => true,
        _ => return None,
    };

    let (hours_raw, minutes_raw) = clock.split_once(':')?;
    let hours: u32 = hours_raw.parse().ok()?;
    let minutes: u32 = minutes_raw.parse().ok()?;
    if !(1..=12).contains(&hours) || minutes > 59 {
        return None;
    }

    let base = if hours == 12 { 0 } else { hours };
    let offset = if is_pm { 12 * 60 } else { 0 };
    Some(base * 60 + offset + minutes)
}

/// A punch pair resolved to a minute interval. Out at or before in is an
/// empty session.
fn session(time_in: Option<&str>, time_out: Option<&str>) -> Option<(u32, u32)> {
    let start = parse_punch(time_in?)?;
    let end = parse_punch(time_out?)?;
    if end <= start {
        return None;
    }
    Some((start, end))
}

fn overlap_minutes(session: (u32, u32), window: CreditWindow) -> u32 {
    let start = session.0.max(window.start);
    let end = session.1.min(window.end);
    end.saturating_sub(start)
}

/// Credit-hours earned for one date under the day-type rule.
///
/// The four punches are the morning and afternoon in/out strings as captured
/// on the daily record; missing or malformed punches reduce the figure, never
/// error. The result is non-negative with at most one fractional digit.
pub fn credit_hours(
    day_type: DayType,
    am_in: Option<&str>,
    am_out: Option<&str>,
    pm_in: Option<&str>,
    pm_out: Option<&str>,
) -> f64 {
    let sessions = [session(am_in, am_out), session(pm_in, pm_out)];

    let hours = match day_type {
        DayType::Weekday => {
            let minutes: u32 = sessions
                .iter()
                .flatten()
                .map(|s| overlap_minutes(*s, WEEKDAY_WINDOW))
                .sum();
            (f64::from(minutes) / 60.0).min(WEEKDAY_CLAMP_HOURS)
        }
        DayType::Weekend | DayType::Holiday => {
            let minutes: u32 = sessions
                .iter()
                .flatten()
                .map(|s| {
                    overlap_minutes(*s, REST_DAY_MORNING) + overlap_minutes(*s, REST_DAY_AFTERNOON)
                })
                .sum();
            f64::from(minutes) / 60.0 * REST_DAY_MULTIPLIER
        }
    };

    round_tenth(hours)
}
