use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved place. Produced once by geocoding and read by the forecast fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPrecipitationSample {
    pub timestamp: DateTime<Utc>,
    pub probability_percent: u8,
    pub amount_mm: f64,
    pub condition_label: String,
}

/// Tomorrow's forecast, already rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub location_name: String,
    pub date_label: String,
    pub high_f: i32,
    pub low_f: i32,
    pub morning_f: i32,
    pub day_f: i32,
    pub evening_f: i32,
    pub night_f: i32,
    pub humidity_percent: u8,
    pub description: String,
    pub wind_speed_mph: f64,
    pub precipitation_probability_percent: u8,
    pub uv_index: i32,
    pub hourly_samples: Vec<HourlyPrecipitationSample>,
    pub rain_narrative: Option<String>,
}

impl DailyForecast {
    /// Attach a narrative; empty text is treated as "none".
    pub fn with_rain_narrative(self, narrative: String) -> Self {
        let narrative = narrative.trim().to_string();
        Self {
            rain_narrative: (!narrative.is_empty()).then_some(narrative),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub status: DeliveryStatus,
    pub provider_message_id: Option<String>,
    pub error_detail: Option<String>,
}

impl DeliveryOutcome {
    pub fn sent(recipient: impl Into<String>, message_id: String) -> Self {
        Self {
            recipient: recipient.into(),
            status: DeliveryStatus::Sent,
            provider_message_id: Some(message_id),
            error_detail: None,
        }
    }

    pub fn failed(recipient: impl Into<String>, detail: String) -> Self {
        Self {
            recipient: recipient.into(),
            status: DeliveryStatus::Failed,
            provider_message_id: None,
            error_detail: Some(detail),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// Outcomes of one delivery pass, in recipient order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DeliveryReport {
    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_sent()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeliveryOutcome> {
        self.outcomes.iter().filter(|o| !o.is_sent())
    }

    /// `Summary: N sent, M failed` followed by one line per failure.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Summary: {} sent, {} failed", self.sent(), self.failed())];
        if self.failed() > 0 {
            lines.push("Failed messages:".to_string());
            lines.extend(self.failures().map(|o| {
                format!("  - {}: {}", o.recipient, o.error_detail.as_deref().unwrap_or("unknown error"))
            }));
        }
        lines
    }
}
