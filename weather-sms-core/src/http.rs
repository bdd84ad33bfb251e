//! Shared request/response handling for the upstream providers.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::{Result, WeatherSmsError};

/// Send `req`, require a 2xx status, and decode the body as JSON.
///
/// Transport failures and bad statuses map to `UpstreamRequest`; a body that
/// does not decode into `T` maps to `UpstreamFormat`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    req: RequestBuilder,
    provider: &'static str,
) -> Result<T> {
    let res = req
        .send()
        .await
        .map_err(|e| WeatherSmsError::request(provider, format!("failed to send request: {e}")))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| WeatherSmsError::request(provider, format!("failed to read body: {e}")))?;

    if !status.is_success() {
        return Err(WeatherSmsError::request(
            provider,
            format!("status {}: {}", status, truncate_body(&body)),
        ));
    }

    tracing::debug!(provider, bytes = body.len(), "received response");

    serde_json::from_str(&body).map_err(|e| WeatherSmsError::format(provider, e.to_string()))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut cut = MAX;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
