//! One end-to-end run: geocode, forecast, narrative, render, deliver.

use chrono::{DateTime, TimeZone};
use reqwest::Client;
use std::fmt::Display;

use crate::{
    config::Config,
    credentials::{CredentialKey, CredentialSource},
    error::Result,
    forecast::ForecastFetcher,
    geocode::LocationResolver,
    model::{DailyForecast, DeliveryReport},
    narrative::{NarrativeSummarizer, OpenAiCompletion},
    notify::{MessagingCredentials, SmsSender, TwilioSender, deliver},
    render::render,
};

/// The upstream clients a run talks to.
#[derive(Debug)]
pub struct Services {
    pub resolver: LocationResolver,
    pub fetcher: ForecastFetcher,
    /// `None` when the rain narrative is disabled.
    pub summarizer: Option<NarrativeSummarizer>,
    pub sender: Box<dyn SmsSender>,
}

impl Services {
    /// Build the production clients from `config`, sharing one HTTP client.
    pub fn from_config(config: &Config, credentials: &dyn CredentialSource) -> Self {
        let http = Client::new();
        let endpoints = &config.endpoints;

        let summarizer = config.narrative.enabled.then(|| {
            NarrativeSummarizer::new(OpenAiCompletion::new(
                http.clone(),
                endpoints.openai.clone(),
                credentials.get(CredentialKey::OpenAiApiKey),
                config.narrative.model.clone(),
                config.narrative.max_tokens,
            ))
        });

        Self {
            resolver: LocationResolver::new(http.clone(), endpoints.openweather.clone()),
            fetcher: ForecastFetcher::new(http.clone(), endpoints.openweather.clone())
                .with_hourly(config.narrative.enabled),
            summarizer,
            sender: Box::new(TwilioSender::new(http, endpoints.twilio.clone())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub forecast: DailyForecast,
    pub message: String,
    pub delivery: DeliveryReport,
}

/// Run the whole notification once, using `now` as the reference instant.
///
/// Errors before delivery abort the run. Narrative failures are logged and
/// dropped; per-recipient failures end up in [`RunReport::delivery`].
pub async fn run<Tz>(
    config: &Config,
    credentials: &dyn CredentialSource,
    services: &Services,
    now: &DateTime<Tz>,
) -> Result<RunReport>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    config.validate()?;
    let api_key = credentials.require(CredentialKey::OpenWeatherApiKey)?;

    tracing::info!(postal_code = %config.postal_code, "Fetching tomorrow's weather forecast");
    let location = services.resolver.resolve(&config.zip_query(), &api_key).await?;
    let mut forecast = services.fetcher.fetch_tomorrow(&location, &api_key, now).await?;

    tracing::info!(
        "Tomorrow's weather for {}: {}F/{}F, {}",
        forecast.location_name,
        forecast.high_f,
        forecast.low_f,
        forecast.description
    );

    if let Some(summarizer) = &services.summarizer {
        let tz = now.timezone();
        let narrative = summarizer.summarize_rain(&forecast.hourly_samples, &tz).await;
        match narrative {
            Ok(narrative) if narrative.is_empty() => {
                tracing::info!("No rain expected; skipping rain narrative");
            }
            Ok(narrative) => forecast = forecast.with_rain_narrative(narrative),
            Err(e) => tracing::warn!("Rain narrative unavailable: {e}"),
        }
    }

    tracing::info!("Formatting message");
    let message = render(&forecast, now);

    tracing::info!(recipients = config.recipients.len(), "Sending SMS messages");
    let messaging = MessagingCredentials::from_source(credentials);
    let delivery = deliver(services.sender.as_ref(), &message, &config.recipients, &messaging).await?;

    for line in delivery.summary_lines() {
        tracing::info!("{line}");
    }

    Ok(RunReport { forecast, message, delivery })
}
