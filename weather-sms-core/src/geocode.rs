//! Postal code to coordinates, via the OpenWeather zip geocoding endpoint.

use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Result, WeatherSmsError},
    http::{join_url, send_json},
    model::Location,
};

const PROVIDER: &str = "OpenWeather geocoding";

#[derive(Debug, Clone)]
pub struct LocationResolver {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct OwZipResponse {
    lat: f64,
    lon: f64,
    name: String,
}

impl LocationResolver {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http }
    }

    /// Resolve `zip` (e.g. `10977,US`) to a [`Location`].
    pub async fn resolve(&self, zip: &str, api_key: &str) -> Result<Location> {
        if api_key.trim().is_empty() {
            return Err(WeatherSmsError::config("OpenWeather API key is empty"));
        }

        tracing::debug!(zip, "resolving postal code");

        let req = self
            .http
            .get(join_url(&self.base_url, "geo/1.0/zip"))
            .query(&[("zip", zip), ("appid", api_key)]);

        let parsed: OwZipResponse = send_json(req, PROVIDER).await?;

        Ok(Location { latitude: parsed.lat, longitude: parsed.lon, display_name: parsed.name })
    }
}
