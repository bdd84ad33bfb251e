//! SMS fan-out to the configured recipients.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;

use crate::{
    credentials::{CredentialKey, CredentialSource},
    error::{Result, WeatherSmsError},
    http::{join_url, send_json},
    model::{DeliveryOutcome, DeliveryReport},
};

const PROVIDER: &str = "Twilio";

/// Messaging account used for every send in a run.
#[derive(Clone, PartialEq, Eq)]
pub struct MessagingCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl Debug for MessagingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"***")
            .field("from_number", &self.from_number)
            .finish()
    }
}

impl MessagingCredentials {
    /// Collect all three values, absent ones as empty strings; [`deliver`] validates.
    pub fn from_source(source: &dyn CredentialSource) -> Self {
        Self {
            account_sid: source.get(CredentialKey::TwilioAccountSid).unwrap_or_default(),
            auth_token: source.get(CredentialKey::TwilioAuthToken).unwrap_or_default(),
            from_number: source.get(CredentialKey::TwilioFromNumber).unwrap_or_default(),
        }
    }

    fn validate(&self) -> Result<()> {
        let all_set = [&self.account_sid, &self.auth_token, &self.from_number]
            .iter()
            .all(|v| !v.trim().is_empty());
        if all_set {
            Ok(())
        } else {
            Err(WeatherSmsError::config(
                "Twilio credentials not set. Please set TWILIO_ACCOUNT_SID, \
                 TWILIO_AUTH_TOKEN, and TWILIO_FROM_NUMBER environment variables.",
            ))
        }
    }
}

/// A single-message SMS transport.
#[async_trait]
pub trait SmsSender: Send + Sync + Debug {
    /// Send `body` to `to`, returning the provider's message id.
    async fn send(&self, credentials: &MessagingCredentials, to: &str, body: &str) -> Result<String>;
}

/// Twilio Programmable Messaging REST client.
#[derive(Debug, Clone)]
pub struct TwilioSender {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
}

impl TwilioSender {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http }
    }
}

#[async_trait]
impl SmsSender for TwilioSender {
    async fn send(&self, credentials: &MessagingCredentials, to: &str, body: &str) -> Result<String> {
        let url = join_url(
            &self.base_url,
            &format!("2010-04-01/Accounts/{}/Messages.json", credentials.account_sid),
        );

        let req = self
            .http
            .post(url)
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&[("To", to), ("From", credentials.from_number.as_str()), ("Body", body)]);

        let msg: TwilioMessage = send_json(req, PROVIDER).await?;
        Ok(msg.sid)
    }
}

/// Send `message` to each recipient in order.
///
/// Credentials are checked before any send; after that every recipient gets
/// exactly one attempt and one outcome, whatever happened to the others.
pub async fn deliver(
    sender: &dyn SmsSender,
    message: &str,
    recipients: &[String],
    credentials: &MessagingCredentials,
) -> Result<DeliveryReport> {
    credentials.validate()?;

    let mut outcomes = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let outcome = match sender.send(credentials, recipient, message).await {
            Ok(sid) => {
                tracing::info!(%recipient, %sid, "SMS sent");
                DeliveryOutcome::sent(recipient.as_str(), sid)
            }
            Err(e) => {
                let err = WeatherSmsError::Delivery { recipient: recipient.clone(), detail: e.to_string() };
                tracing::warn!("{err}");
                DeliveryOutcome::failed(recipient.as_str(), e.to_string())
            }
        };
        outcomes.push(outcome);
    }

    Ok(DeliveryReport { outcomes })
}
