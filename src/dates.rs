use crate::errors::TrackerError;
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

const DATE_FORMAT: &str = "%Y-%m-%d";
/// Keys outside these years cannot be written back as four-digit dates.
const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Scheduling weekday, serialized with its full English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Weekday::ALL[day.num_days_from_sunday() as usize]
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A calendar day identifier, always rendered as `YYYY-MM-DD`.
///
/// Daily, weekly and monthly window labels are all `DateKey`s: a week is
/// keyed by its first day and a month by its first-of-month date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn weekday(self) -> Weekday {
        self.0.weekday().into()
    }

    /// The seven consecutive days starting at this key, inclusive, cut short
    /// at the end of year 9999.
    pub fn week_dates(self) -> Vec<DateKey> {
        self.0
            .iter_days()
            .take(7)
            .take_while(|day| YEARS.contains(&day.year()))
            .map(DateKey)
            .collect()
    }

    /// Every day of the month containing this key, from the 1st to the last.
    pub fn month_dates(self) -> Vec<DateKey> {
        let month = self.0.month();
        first_of_month(self.0)
            .iter_days()
            .take_while(|day| day.month() == month)
            .map(DateKey)
            .collect()
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for DateKey {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        // chrono accepts unpadded fields, the key format does not
        if value.len() != 10 {
            return Err(TrackerError::invalid_date(value));
        }
        NaiveDate::parse_from_str(value, DATE_FORMAT)
            .ok()
            .filter(|date| YEARS.contains(&date.year()))
            .map(DateKey)
            .ok_or_else(|| TrackerError::invalid_date(value))
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Source of "today" for window generation and default dates.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Today and the previous `count - 1` days, most recent first.
pub fn past_dates(today: NaiveDate, count: usize) -> Vec<DateKey> {
    (0..count)
        .map(|offset| DateKey(today - Duration::days(offset as i64)))
        .collect()
}

/// The Sunday starting the current week and the `count - 1` weeks before it,
/// most recent first.
pub fn past_week_starts(today: NaiveDate, count: usize) -> Vec<DateKey> {
    let current = week_start(today);
    (0..count)
        .map(|offset| DateKey(current - Duration::weeks(offset as i64)))
        .collect()
}

/// First-of-month dates for the current month and the `count - 1` months
/// before it, most recent first.
pub fn past_month_starts(today: NaiveDate, count: usize) -> Vec<DateKey> {
    let mut starts = Vec::with_capacity(count);
    let mut month = first_of_month(today);
    for _ in 0..count {
        starts.push(DateKey(month));
        let Some(previous) = month.pred_opt() else {
            break;
        };
        month = first_of_month(previous);
    }
    starts
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}
