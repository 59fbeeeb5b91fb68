use crate::calendar::{DateRange, Event, EventTime};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Partial-response selector; only the fields the summary renders.
pub const EVENT_FIELDS: &str = "items(summary,location,start,end,attendees,colorId)";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Calendar not found: {0}")]
    NotFound(String),
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Event is missing required field '{0}'")]
    MissingField(&'static str),
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    summary: Option<String>,
    location: Option<String>,
    start: Option<GoogleDateTime>,
    end: Option<GoogleDateTime>,
    #[serde(default)]
    attendees: Vec<GoogleAttendee>,
    #[serde(rename = "colorId")]
    color_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleDateTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleAttendee {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventListResponse {
    items: Option<Vec<GoogleEvent>>,
}

#[async_trait]
pub trait CalendarApi {
    async fn fetch_events(
        &self,
        calendar_id: &str,
        date_range: &DateRange,
    ) -> Result<Vec<Event>, ApiError>;
}

pub struct GoogleCalendarClient {
    base_url: String,
    access_token: String,
    max_results: u32,
    client: reqwest::Client,
}

impl GoogleCalendarClient {
    pub fn new(access_token: String) -> Self {
        Self {
            base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            access_token,
            max_results: 1000,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

fn convert_time(value: Option<GoogleDateTime>, field: &'static str) -> Result<EventTime, ApiError> {
    match value {
        Some(GoogleDateTime { date_time: Some(dt), .. }) => Ok(EventTime::Timed(dt)),
        Some(GoogleDateTime { date: Some(d), .. }) => Ok(EventTime::AllDay(d)),
        _ => Err(ApiError::MissingField(field)),
    }
}

fn convert_from_google_event(ge: GoogleEvent) -> Result<Event, ApiError> {
    Ok(Event {
        start: convert_time(ge.start, "start")?,
        end: convert_time(ge.end, "end")?,
        summary: ge.summary.ok_or(ApiError::MissingField("summary"))?,
        location: ge.location,
        attendees: ge.attendees.into_iter().filter_map(|a| a.email).collect(),
        color_id: ge.color_id,
    })
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn fetch_events(
        &self,
        calendar_id: &str,
        date_range: &DateRange,
    ) -> Result<Vec<Event>, ApiError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );
        let time_min = date_range.time_min();
        let time_max = date_range.time_max();
        let max_results = self.max_results.to_string();

        tracing::info!("Fetching events from {} to {}", date_range.start, date_range.end);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("maxResults", max_results.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("fields", EVENT_FIELDS),
            ])
            .send()
            .await?;

        let status = response.status();
        tracing::info!("Fetch events response status: {}", status);

        if status == 401 {
            tracing::error!("Authentication failed when fetching events");
            return Err(ApiError::AuthenticationFailed);
        }

        if status == 404 {
            tracing::error!("Calendar not found: {}", calendar_id);
            return Err(ApiError::NotFound(calendar_id.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Failed to fetch events. Status: {}, Body: {}", status, body);
            return Err(ApiError::RequestError(format!("Status {}: {}", status, body)));
        }

        let event_list: EventListResponse = response.json().await?;

        let events = event_list
            .items
            .unwrap_or_default()
            .into_iter()
            .map(convert_from_google_event)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!("Fetched {} events successfully", events.len());
        Ok(events)
    }
}
