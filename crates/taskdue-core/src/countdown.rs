use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, trace};

use crate::datetime::parse_wire;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// Remaining time until a due instant, relative to a caller-supplied "now".
///
/// Recomputed on every render and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// The task has no due date.
    Unset,
    Overdue,
    Remaining { days: i64, hours: u32, minutes: u32 },
}

impl Countdown {
    pub fn is_overdue(&self) -> bool {
        matches!(self, Countdown::Overdue)
    }
}

/// Countdown for a stored wire value.
///
/// A malformed value degrades to [`Countdown::Overdue`].
pub fn remaining(due_wire: Option<&str>, now: DateTime<Utc>) -> Countdown {
    let Some(raw) = due_wire else {
        return Countdown::Unset;
    };

    match parse_wire(raw) {
        Some(due) => remaining_at(due, now),
        None => {
            debug!(limit = raw, "malformed due value; reporting overdue");
            Countdown::Overdue
        }
    }
}

pub fn remaining_at(due: DateTime<Utc>, now: DateTime<Utc>) -> Countdown {
    let delta = due.signed_duration_since(now);
    if delta < TimeDelta::zero() {
        trace!(%due, %now, "due instant has passed");
        return Countdown::Overdue;
    }

    // num_minutes truncates toward zero, which is floor for a non-negative delta.
    let total_minutes = delta.num_minutes();
    let days = total_minutes / MINUTES_PER_DAY;
    let hours = (total_minutes % MINUTES_PER_DAY) / MINUTES_PER_HOUR;
    let minutes = total_minutes % MINUTES_PER_HOUR;

    Countdown::Remaining {
        days,
        hours: hours as u32,
        minutes: minutes as u32,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 15, 0)
            .single()
            .expect("valid now")
    }

    #[test]
    fn breaks_delta_into_days_hours_minutes() {
        let due = now() + Duration::days(1) + Duration::hours(2) + Duration::minutes(30);
        assert_eq!(
            remaining_at(due, now()),
            Countdown::Remaining {
                days: 1,
                hours: 2,
                minutes: 30
            }
        );
    }

    #[test]
    fn truncates_seconds_instead_of_rounding() {
        let due = now() + Duration::minutes(5) + Duration::seconds(59);
        assert_eq!(
            remaining_at(due, now()),
            Countdown::Remaining {
                days: 0,
                hours: 0,
                minutes: 5
            }
        );
    }

    #[test]
    fn exact_due_instant_is_zero_remaining() {
        assert_eq!(
            remaining_at(now(), now()),
            Countdown::Remaining {
                days: 0,
                hours: 0,
                minutes: 0
            }
        );
    }

    #[test]
    fn any_negative_delta_is_overdue() {
        for past in [
            Duration::seconds(1),
            Duration::minutes(59),
            Duration::days(400),
        ] {
            assert_eq!(remaining_at(now() - past, now()), Countdown::Overdue);
        }
    }

    #[test]
    fn absent_due_is_unset() {
        assert_eq!(remaining(None, now()), Countdown::Unset);
        assert_eq!(
            remaining(None, Utc.timestamp_opt(0, 0).single().expect("epoch")),
            Countdown::Unset
        );
    }

    #[test]
    fn wire_input_is_parsed() {
        assert_eq!(
            remaining(Some("2024-03-06T11:45:00Z"), now()),
            Countdown::Remaining {
                days: 1,
                hours: 2,
                minutes: 30
            }
        );
    }

    #[test]
    fn malformed_wire_degrades_to_overdue() {
        assert_eq!(remaining(Some("soon"), now()), Countdown::Overdue);
    }
}
