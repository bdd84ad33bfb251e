//! Optional plain-language description of when rain is expected.

use async_trait::async_trait;
use chrono::TimeZone;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

use crate::{
    error::{Result, WeatherSmsError},
    http::{join_url, send_json},
    model::HourlyPrecipitationSample,
};

const PROVIDER: &str = "OpenAI";

const SYSTEM_PROMPT: &str = "You summarize hourly rain forecasts for a text message. \
Using the hourly lines provided, describe when rain starts and stops and how heavy it is, \
for example: \"light rain 10:00-11:30 AM, heavy rain after 8 PM\". \
Reply with one short sentence, no greeting, at most 160 characters.";

/// Maximum narrative length kept after the provider answers.
const MAX_NARRATIVE_CHARS: usize = 320;

/// A text-generation backend.
#[async_trait]
pub trait TextCompletion: Send + Sync + Debug {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// OpenAI-compatible `/v1/chat/completions` client.
#[derive(Debug, Clone)]
pub struct OpenAiCompletion {
    base_url: String,
    http: Client,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiCompletion {
    /// `api_key` may be absent; the error surfaces only if a completion is requested.
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self { base_url: base_url.into(), http, api_key, model: model.into(), max_tokens }
    }
}

#[async_trait]
impl TextCompletion for OpenAiCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| WeatherSmsError::config("OPENAI_API_KEY environment variable not set"))?;

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            max_tokens: self.max_tokens,
            temperature: 0.2,
        };

        let req = self
            .http
            .post(join_url(&self.base_url, "v1/chat/completions"))
            .bearer_auth(api_key)
            .json(&body);

        let parsed: ChatResponse = send_json(req, PROVIDER).await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| WeatherSmsError::format(PROVIDER, "completion has no content"))
    }
}

#[derive(Debug)]
pub struct NarrativeSummarizer {
    completion: Box<dyn TextCompletion>,
}

impl NarrativeSummarizer {
    pub fn new(completion: impl TextCompletion + 'static) -> Self {
        Self { completion: Box::new(completion) }
    }

    /// Describe the rainy hours among `samples`, formatting times in `tz`.
    ///
    /// Returns an empty string, without calling the provider, when no sample
    /// carries a positive rain amount.
    pub async fn summarize_rain<Tz>(&self, samples: &[HourlyPrecipitationSample], tz: &Tz) -> Result<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let payload = rain_lines(samples, tz);
        if payload.is_empty() {
            return Ok(String::new());
        }

        tracing::debug!(rainy_hours = payload.lines().count(), "requesting rain narrative");

        let text = self.completion.complete(SYSTEM_PROMPT, &payload).await?;
        Ok(clip(text.trim()))
    }
}

/// One `time: amount, chance` line per hour with measurable rain.
pub fn rain_lines<Tz>(samples: &[HourlyPrecipitationSample], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    samples
        .iter()
        .filter(|s| s.amount_mm > 0.0)
        .map(|s| {
            let local = s.timestamp.with_timezone(tz);
            let mut line = format!(
                "{}: {:.1} mm, {}% chance",
                local.format("%-I:%M %p"),
                s.amount_mm,
                s.probability_percent
            );
            if !s.condition_label.is_empty() {
                line.push_str(&format!(" ({})", s.condition_label));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn clip(text: &str) -> String {
    match text.char_indices().nth(MAX_NARRATIVE_CHARS) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug, Default, Clone)]
    struct CountingCompletion {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl TextCompletion for CountingCompletion {
        async fn complete(&self, _system: &str, user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(WeatherSmsError::request(PROVIDER, "status 500"));
            }
            Ok(format!("  rain: {}  ", user.lines().count()))
        }
    }

    fn sample(hour: u32, amount_mm: f64) -> HourlyPrecipitationSample {
        HourlyPrecipitationSample {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 10, hour, 0, 0).unwrap(),
            probability_percent: 60,
            amount_mm,
            condition_label: "light rain".into(),
        }
    }

    #[tokio::test]
    async fn dry_day_skips_the_provider() {
        let completion = CountingCompletion::default();
        let calls = completion.calls.clone();
        let summarizer = NarrativeSummarizer::new(completion);

        let text = summarizer.summarize_rain(&[sample(14, 0.0), sample(15, 0.0)], &Utc).await.unwrap();

        assert_eq!(text, "");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn only_rainy_hours_are_sent() {
        let completion = CountingCompletion::default();
        let calls = completion.calls.clone();
        let summarizer = NarrativeSummarizer::new(completion);

        let text = summarizer
            .summarize_rain(&[sample(14, 0.0), sample(15, 0.4), sample(16, 1.2)], &Utc)
            .await
            .unwrap();

        assert_eq!(text, "rain: 2");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_errors_propagate_to_caller() {
        let summarizer = NarrativeSummarizer::new(CountingCompletion { fail: true, ..Default::default() });
        let err = summarizer.summarize_rain(&[sample(15, 0.4)], &Utc).await.unwrap_err();
        assert!(matches!(err, WeatherSmsError::UpstreamRequest { .. }));
    }

    #[tokio::test]
    async fn missing_openai_key_is_configuration_error() {
        let completion = OpenAiCompletion::new(Client::new(), "http://127.0.0.1:9", None, "m", 10);
        let err = completion.complete("s", "u").await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn rain_lines_use_local_clock() {
        let tz = FixedOffset::west_opt(4 * 3600).unwrap();
        let lines = rain_lines(&[sample(14, 0.0), sample(15, 0.4)], &tz);
        assert_eq!(lines, "11:00 AM: 0.4 mm, 60% chance (light rain)");
    }

    #[test]
    fn clip_bounds_length() {
        let long = "a".repeat(MAX_NARRATIVE_CHARS + 50);
        assert_eq!(clip(&long).chars().count(), MAX_NARRATIVE_CHARS + 3);
        assert_eq!(clip("short"), "short");
    }
}
