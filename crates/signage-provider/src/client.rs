use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::{ProviderError, ProviderResult};

/// ## Summary
/// Builds the HTTP client every provider fetches with.
///
/// ## Errors
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> ProviderResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("signage/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// ## Summary
/// Parses `base` and appends `params` as its query string.
///
/// ## Errors
/// Returns [`ProviderError::InvalidUrl`] if `base` is not a URL.
pub fn url_with_params<'a>(
    base: &str,
    params: impl IntoIterator<Item = (&'a str, String)>,
) -> ProviderResult<reqwest::Url> {
    reqwest::Url::parse_with_params(base, params)
        .map_err(|e| ProviderError::InvalidUrl(format!("{base}: {e}")))
}

/// ## Summary
/// Sends a GET and decodes the JSON body.
///
/// ## Errors
/// Returns an error on transport failure, a non-success status, or a body
/// that does not decode as `T`.
pub async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: reqwest::Url,
) -> ProviderResult<T> {
    tracing::debug!(url = %url, "Fetching");
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::StatusError {
            status,
            url: url.to_string(),
        });
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// The current date in `tz`.
#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}
