//! Movie details lookup for the theater panel.

use futures::future::join_all;
use serde::Deserialize;
use signage_format::Event;

use crate::client::{get_json, url_with_params};
use crate::error::ProviderResult;

/// An OMDb-style title search result.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MovieDetails {
    pub title: Option<String>,
    pub plot: Option<String>,
    pub poster: Option<String>,
}

/// Enriches showings with a movie's canonical title, plot and poster.
#[derive(Debug, Clone)]
pub struct MovieLookup {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl MovieLookup {
    #[must_use]
    pub fn new(client: reqwest::Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
        }
    }

    /// ## Summary
    /// The lookup URL for `title`.
    ///
    /// ## Errors
    /// Returns an error if the configured URL does not parse.
    pub fn query_url(&self, title: &str) -> ProviderResult<reqwest::Url> {
        let mut params = vec![("t", title.to_string())];
        if let Some(key) = &self.api_key {
            params.push(("apikey", key.clone()));
        }
        url_with_params(&self.url, params)
    }

    async fn lookup(&self, title: &str) -> ProviderResult<MovieDetails> {
        get_json(&self.client, self.query_url(title)?).await
    }

    /// Looks `event` up by title. Any failure leaves it unchanged.
    #[tracing::instrument(skip(self, event), fields(title = %event.title))]
    pub async fn enrich(&self, event: Event) -> Event {
        match self.lookup(&event.title).await {
            Ok(details) => apply_details(event, details),
            Err(error) => {
                tracing::debug!(error = %error, "Movie lookup failed");
                event
            }
        }
    }

    /// Enriches every event concurrently, keeping their order.
    pub async fn enrich_all(&self, events: Vec<Event>) -> Vec<Event> {
        join_all(events.into_iter().map(|event| self.enrich(event))).await
    }
}

/// ## Summary
/// Copies the lookup's title, plot and poster onto `event`.
///
/// Only a result whose title matches the event's, ignoring case, is used.
#[must_use]
pub fn apply_details(mut event: Event, details: MovieDetails) -> Event {
    let Some(title) = details.title else {
        return event;
    };
    if title.to_lowercase() != event.title.to_lowercase() {
        return event;
    }
    event.title = title;
    event.description = details.plot.unwrap_or_default();
    event.attachment = details.poster;
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    fn showing(title: &str) -> Event {
        Event::titled(title).description("Tonight").build()
    }

    #[test_log::test]
    fn matching_title_overwrites_fields() {
        let details = MovieDetails {
            title: Some("The Matrix".into()),
            plot: Some("A hacker learns the truth.".into()),
            poster: Some("http://img/matrix.jpg".into()),
        };
        let event = apply_details(showing("the matrix"), details);
        assert_eq!(event.title, "The Matrix");
        assert_eq!(event.description, "A hacker learns the truth.");
        assert_eq!(event.attachment.as_deref(), Some("http://img/matrix.jpg"));
    }

    #[test_log::test]
    fn mismatched_or_empty_result_leaves_event() {
        let other = MovieDetails {
            title: Some("The Matrix Reloaded".into()),
            plot: Some("Sequel".into()),
            poster: None,
        };
        let event = apply_details(showing("The Matrix"), other);
        assert_eq!(event.description, "Tonight");

        let event = apply_details(showing("The Matrix"), MovieDetails::default());
        assert_eq!(event.title, "The Matrix");
        assert_eq!(event.attachment, None);
    }

    #[test_log::test]
    fn decodes_omdb_fields() {
        let details: MovieDetails = serde_json::from_str(
            r#"{"Title":"Up","Year":"2009","Plot":"Balloons.","Poster":"http://img/up.jpg"}"#,
        )
        .expect("valid json");
        assert_eq!(details.title.as_deref(), Some("Up"));
        assert_eq!(details.plot.as_deref(), Some("Balloons."));
    }

    #[test_log::test]
    fn query_carries_title_and_key() {
        let lookup = MovieLookup::new(
            reqwest::Client::new(),
            "http://www.omdbapi.com/",
            Some("k".to_string()),
        );
        let url = lookup.query_url("The Matrix").expect("valid url");
        assert_eq!(url.as_str(), "http://www.omdbapi.com/?t=The+Matrix&apikey=k");
    }

    #[test_log::test(tokio::test)]
    async fn unreachable_lookup_leaves_events_in_order() {
        let lookup = MovieLookup::new(reqwest::Client::new(), "not a url", None);
        let events = lookup
            .enrich_all(vec![showing("B"), showing("A")])
            .await;
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["B", "A"]);
    }
}
