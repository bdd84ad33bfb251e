//! Credential lookup.
//!
//! Components ask a [`CredentialSource`] for named secrets instead of reading
//! the process environment themselves, so the environment, the config file or
//! an in-memory map can be swapped in without touching component logic.

use std::{collections::HashMap, fmt::Debug};

use crate::error::{Result, WeatherSmsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    OpenWeatherApiKey,
    OpenAiApiKey,
    TwilioAccountSid,
    TwilioAuthToken,
    TwilioFromNumber,
}

impl CredentialKey {
    /// Environment variable (and config-file key) for this credential.
    pub fn env_var(&self) -> &'static str {
        match self {
            CredentialKey::OpenWeatherApiKey => "OPENWEATHER_API_KEY",
            CredentialKey::OpenAiApiKey => "OPENAI_API_KEY",
            CredentialKey::TwilioAccountSid => "TWILIO_ACCOUNT_SID",
            CredentialKey::TwilioAuthToken => "TWILIO_AUTH_TOKEN",
            CredentialKey::TwilioFromNumber => "TWILIO_FROM_NUMBER",
        }
    }

    pub const fn all() -> &'static [CredentialKey] {
        &[
            CredentialKey::OpenWeatherApiKey,
            CredentialKey::OpenAiApiKey,
            CredentialKey::TwilioAccountSid,
            CredentialKey::TwilioAuthToken,
            CredentialKey::TwilioFromNumber,
        ]
    }
}

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.env_var())
    }
}

pub trait CredentialSource: Send + Sync + Debug {
    /// Raw lookup. Empty values are reported as absent.
    fn get(&self, key: CredentialKey) -> Option<String>;

    /// Lookup that fails with a configuration error naming the variable.
    fn require(&self, key: CredentialKey) -> Result<String> {
        self.get(key).ok_or_else(|| {
            WeatherSmsError::config(format!("{key} environment variable not set"))
        })
    }
}

/// Reads credentials from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn get(&self, key: CredentialKey) -> Option<String> {
        std::env::var(key.env_var()).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Fixed in-memory credentials, keyed by env var name.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: CredentialKey, value: impl Into<String>) -> Self {
        self.values.insert(key.env_var().to_string(), value.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.values.get(key.env_var()).filter(|v| !v.trim().is_empty()).cloned()
    }
}

/// Tries each source in order and returns the first hit.
#[derive(Debug, Default)]
pub struct LayeredCredentials {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl LayeredCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, source: impl CredentialSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl CredentialSource for LayeredCredentials {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.sources.iter().find_map(|s| s.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_variable_name() {
        let creds = StaticCredentials::new();
        let err = creds.require(CredentialKey::OpenWeatherApiKey).unwrap_err();

        assert!(err.is_configuration());
        assert!(err.to_string().contains("OPENWEATHER_API_KEY"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let creds = StaticCredentials::new().with(CredentialKey::TwilioAuthToken, "  ");
        assert_eq!(creds.get(CredentialKey::TwilioAuthToken), None);
    }

    #[test]
    fn layered_prefers_first_source() {
        let first = StaticCredentials::new().with(CredentialKey::OpenAiApiKey, "env-key");
        let second = StaticCredentials::new()
            .with(CredentialKey::OpenAiApiKey, "file-key")
            .with(CredentialKey::TwilioFromNumber, "+15550001111");

        let layered = LayeredCredentials::new().push(first).push(second);

        assert_eq!(layered.get(CredentialKey::OpenAiApiKey).as_deref(), Some("env-key"));
        assert_eq!(
            layered.get(CredentialKey::TwilioFromNumber).as_deref(),
            Some("+15550001111")
        );
        assert_eq!(layered.get(CredentialKey::TwilioAccountSid), None);
    }

    #[test]
    fn env_var_names_are_unique() {
        let mut names: Vec<_> = CredentialKey::all().iter().map(|k| k.env_var()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CredentialKey::all().len());
    }
}
