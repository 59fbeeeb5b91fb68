use std::fmt;

use serde::{Deserialize, Serialize};

/// Start or end of an event, kept as the string the API returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    Timed(String),
    AllDay(String),
}

impl EventTime {
    pub fn as_str(&self) -> &str {
        match self {
            EventTime::Timed(value) | EventTime::AllDay(value) => value,
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub start: EventTime,
    pub end: EventTime,
    pub summary: String,
    pub location: Option<String>,
    pub attendees: Vec<String>,
    pub color_id: Option<String>,
}

impl Event {
    pub fn new(start: EventTime, end: EventTime, summary: impl Into<String>) -> Self {
        Self {
            start,
            end,
            summary: summary.into(),
            location: None,
            attendees: Vec::new(),
            color_id: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_attendees<I, S>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendees = attendees.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_color_id(mut self, color_id: impl Into<String>) -> Self {
        self.color_id = Some(color_id.into());
        self
    }
}
