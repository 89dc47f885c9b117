use std::sync::Arc;

use asistan_core::error::{AsistanError, Result};
use chrono::{DateTime, Duration, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::GoogleAuth;

const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub start: String,
    pub end: String,
    pub html_link: Option<String>,
}

/// Writes events to the user's primary Google calendar.
pub struct CalendarClient {
    auth: Arc<GoogleAuth>,
    http: reqwest::Client,
}

impl CalendarClient {
    pub fn new(auth: Arc<GoogleAuth>) -> Self {
        Self {
            auth,
            http: reqwest::Client::new(),
        }
    }

    /// Create a timed event starting at `start` and lasting `duration_minutes`.
    pub async fn create_event(
        &self,
        title: &str,
        start: DateTime<FixedOffset>,
        duration_minutes: i64,
        description: Option<&str>,
    ) -> Result<CalendarEvent> {
        let token = self.auth.access_token().await?;
        let body = event_body(title, start, duration_minutes, description);

        let resp = self
            .http
            .post(format!("{CALENDAR_API}/calendars/primary/events"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AsistanError::Integration(format!("calendar request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AsistanError::Integration(format!("calendar response read failed: {e}")))?;

        if !status.is_success() {
            return Err(AsistanError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let data: Value = serde_json::from_str(&text)
            .map_err(|e| AsistanError::Integration(format!("calendar json parse failed: {e}")))?;
        Ok(parse_event(&data))
    }
}

fn event_body(
    title: &str,
    start: DateTime<FixedOffset>,
    duration_minutes: i64,
    description: Option<&str>,
) -> Value {
    let end = start + Duration::minutes(duration_minutes.max(1));
    let mut body = json!({
        "summary": title,
        "start": { "dateTime": start.to_rfc3339_opts(SecondsFormat::Secs, false) },
        "end": { "dateTime": end.to_rfc3339_opts(SecondsFormat::Secs, false) },
        "reminders": { "useDefault": true },
    });
    if let Some(desc) = description {
        body["description"] = json!(desc);
    }
    body
}

fn parse_event(v: &Value) -> CalendarEvent {
    let when = |key: &str| {
        v[key]["dateTime"]
            .as_str()
            .or_else(|| v[key]["date"].as_str())
            .unwrap_or_default()
            .to_string()
    };

    CalendarEvent {
        id: v["id"].as_str().unwrap_or_default().to_string(),
        summary: v["summary"].as_str().unwrap_or("(başlıksız)").to_string(),
        start: when("start"),
        end: when("end"),
        html_link: v["htmlLink"].as_str().map(str::to_string),
    }
}
