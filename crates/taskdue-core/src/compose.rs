use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use tracing::{debug, trace};

use crate::datetime::{format_wire, parse_wire};
use crate::error::FieldError;
use crate::locale::Locale;

/// Hour of day, `0..=23`. Defaults to midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hour(u32);

impl Hour {
    pub const MIDNIGHT: Hour = Hour(0);

    pub fn new(value: u32) -> Result<Self, FieldError> {
        if value > 23 {
            return Err(FieldError::Hour(value));
        }
        Ok(Hour(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Hour {
    type Error = FieldError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Hour::new(value)
    }
}

impl FromStr for Hour {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<u32>().map_err(|_| FieldError::NotANumber {
            field: "hour",
            input: s.to_string(),
        })?;
        Hour::new(value)
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Minute picker value. Only quarter hours are selectable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Minute {
    #[default]
    Zero,
    Fifteen,
    Thirty,
    FortyFive,
}

impl Minute {
    pub const ALL: [Minute; 4] = [
        Minute::Zero,
        Minute::Fifteen,
        Minute::Thirty,
        Minute::FortyFive,
    ];

    pub fn get(self) -> u32 {
        match self {
            Minute::Zero => 0,
            Minute::Fifteen => 15,
            Minute::Thirty => 30,
            Minute::FortyFive => 45,
        }
    }

    /// Closest selectable value at or below `minute`.
    pub fn floor(minute: u32) -> Minute {
        match minute % 60 {
            0..=14 => Minute::Zero,
            15..=29 => Minute::Fifteen,
            30..=44 => Minute::Thirty,
            _ => Minute::FortyFive,
        }
    }
}

impl TryFrom<u32> for Minute {
    type Error = FieldError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Minute::ALL
            .into_iter()
            .find(|minute| minute.get() == value)
            .ok_or(FieldError::Minute(value))
    }
}

impl FromStr for Minute {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<u32>().map_err(|_| FieldError::NotANumber {
            field: "minute",
            input: s.to_string(),
        })?;
        Minute::try_from(value)
    }
}

impl fmt::Display for Minute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.get())
    }
}

/// The three independently edited due-date fragments of an open form.
///
/// Hour and minute always hold a value; the composed instant exists only once
/// a calendar date has been picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueDateSelection {
    pub date: Option<NaiveDate>,
    pub hour: Hour,
    pub minute: Minute,
}

impl DueDateSelection {
    pub fn new(date: Option<NaiveDate>, hour: Hour, minute: Minute) -> Self {
        Self { date, hour, minute }
    }

    /// Rebuilds a selection from a stored instant. Minutes off the quarter grid
    /// are floored onto it.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        let minute = Minute::floor(instant.minute());
        if minute.get() != instant.minute() {
            debug!(
                stored = instant.minute(),
                selected = minute.get(),
                "stored minute is off the quarter grid"
            );
        }
        Self {
            date: Some(instant.date_naive()),
            hour: Hour(instant.hour()),
            minute,
        }
    }

    /// Rebuilds a selection from a stored `limit`. Absent or malformed values
    /// give an empty selection.
    pub fn from_wire(limit: Option<&str>) -> Self {
        limit
            .and_then(parse_wire)
            .map(Self::from_instant)
            .unwrap_or_default()
    }

    pub fn is_complete(&self) -> bool {
        self.date.is_some()
    }

    /// The UTC instant the selection denotes, once a date is present.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        let date = self.date?;
        let time = NaiveTime::from_hms_opt(self.hour.get(), self.minute.get(), 0)?;
        Some(date.and_time(time).and_utc())
    }
}

/// Whether the display string carries the time of day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    DateOnly,
    #[default]
    DateTime,
}

/// Both representations of a composed due date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDue {
    /// Submitted verbatim to the store; `None` until a date is selected.
    pub wire: Option<String>,
    pub display: String,
}

impl ComposedDue {
    pub fn is_incomplete(&self) -> bool {
        self.wire.is_none()
    }
}

/// Single composition path for due dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueDateComposer {
    locale: Locale,
}

impl DueDateComposer {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn compose(&self, selection: &DueDateSelection, mode: DisplayMode) -> ComposedDue {
        let Some(instant) = selection.instant() else {
            trace!("no calendar date selected");
            return ComposedDue {
                wire: None,
                display: self.placeholder().to_string(),
            };
        };

        let composed = ComposedDue {
            wire: Some(format_wire(instant)),
            display: self.display_instant(instant, mode),
        };
        trace!(wire = ?composed.wire, display = %composed.display, "composed due date");
        composed
    }

    pub fn display_instant(&self, instant: DateTime<Utc>, mode: DisplayMode) -> String {
        let naive = instant.naive_utc();
        match mode {
            DisplayMode::DateOnly => self.locale.format_date(naive.date()),
            DisplayMode::DateTime => self.locale.format_date_time(naive),
        }
    }

    /// Display string for a stored `limit`. Absent or malformed values render
    /// the same placeholder as an empty selection.
    pub fn display_limit(&self, limit: Option<&str>, mode: DisplayMode) -> String {
        match limit.and_then(parse_wire) {
            Some(instant) => self.display_instant(instant, mode),
            None => self.placeholder().to_string(),
        }
    }

    pub fn placeholder(&self) -> &'static str {
        self.locale.placeholder()
    }
}
