use thiserror::Error;

/// Errors produced by the forecast-to-SMS pipeline.
#[derive(Debug, Error)]
pub enum WeatherSmsError {
    /// A required setting or credential is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport failure or non-2xx status from an external provider.
    #[error("{provider} request failed: {detail}")]
    UpstreamRequest { provider: &'static str, detail: String },

    /// The provider answered, but the payload lacked the expected fields.
    #[error("Unexpected {provider} data format: {detail}")]
    UpstreamFormat { provider: &'static str, detail: String },

    /// A single recipient could not be reached.
    #[error("Failed to send SMS to {recipient}: {detail}")]
    Delivery { recipient: String, detail: String },
}

impl WeatherSmsError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn request(provider: &'static str, detail: impl Into<String>) -> Self {
        Self::UpstreamRequest { provider, detail: detail.into() }
    }

    pub fn format(provider: &'static str, detail: impl Into<String>) -> Self {
        Self::UpstreamFormat { provider, detail: detail.into() }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T, E = WeatherSmsError> = std::result::Result<T, E>;
