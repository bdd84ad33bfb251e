//! Core library for the `weather-sms` notifier.
//!
//! This crate defines:
//! - Configuration and credential sources
//! - Clients for geocoding, the daily forecast, the rain narrative and SMS delivery
//! - The message template and the end-to-end run
//!
//! It is used by `weather-sms-cli`, but the pipeline can be driven by any binary.

pub mod config;
pub mod credentials;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod model;
pub mod narrative;
pub mod notify;
pub mod pipeline;
pub mod render;

mod http;

pub use config::{Config, Endpoints, NarrativeConfig};
pub use credentials::{CredentialKey, CredentialSource, EnvCredentials, LayeredCredentials, StaticCredentials};
pub use error::{Result, WeatherSmsError};
pub use model::{
    DailyForecast, DeliveryOutcome, DeliveryReport, DeliveryStatus, HourlyPrecipitationSample,
    Location,
};
pub use pipeline::{RunReport, Services, run};
