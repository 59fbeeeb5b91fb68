use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq)]
pub enum RangeError {
    #[error("Expected 'start,end' but found '{0}'")]
    MissingSeparator(String),
    #[error("Invalid date '{0}'. Use YYYY-MM-DD.")]
    InvalidDate(String),
    #[error("Start date {start} is after end date {end}")]
    Reversed { start: NaiveDate, end: NaiveDate },
    #[error("Range {0} to {0} is empty; the end date is exclusive")]
    EmptyWindow(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Reversed { start, end });
        }
        if start == end {
            return Err(RangeError::EmptyWindow(start));
        }
        Ok(Self { start, end })
    }

    /// Lower bound sent to the API, midnight UTC of the start date.
    pub fn time_min(&self) -> String {
        format!("{}T00:00:00Z", self.start.format(DATE_FORMAT))
    }

    /// Upper bound sent to the API, midnight UTC of the end date (exclusive).
    pub fn time_max(&self) -> String {
        format!("{}T00:00:00Z", self.end.format(DATE_FORMAT))
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, RangeError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RangeError::InvalidDate(value.to_string()))
}

impl FromStr for DateRange {
    type Err = RangeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (start, end) = line
            .split_once(',')
            .ok_or_else(|| RangeError::MissingSeparator(line.trim().to_string()))?;

        DateRange::new(parse_date(start)?, parse_date(end)?)
    }
}
