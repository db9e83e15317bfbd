//! Bounded retry around a provider.

use futures::future::BoxFuture;
use signage_core::constants::DEFAULT_FETCH_RETRIES;
use signage_core::types::{DateRange, ReloadRequest};
use signage_format::Event;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::EventProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first failed attempt.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_FETCH_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Total attempts, the first one included.
    #[must_use]
    pub const fn attempts(self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Retries a failing fetch immediately, up to the policy's bound.
///
/// Once every attempt has failed a [`ReloadRequest`] goes out on the
/// escalation channel, if one is set, and the fetch resolves to
/// [`ProviderError::RetriesExhausted`].
#[derive(Debug)]
pub struct Retrying<P> {
    inner: P,
    policy: RetryPolicy,
    name: String,
    on_exhausted: Option<UnboundedSender<ReloadRequest>>,
}

impl<P: EventProvider> Retrying<P> {
    #[must_use]
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            name: String::from("provider"),
            on_exhausted: None,
        }
    }

    /// Names the provider in logs and reload requests.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sends a reload request on `tx` when retries run out.
    #[must_use]
    pub fn escalate_to(mut self, tx: UnboundedSender<ReloadRequest>) -> Self {
        self.on_exhausted = Some(tx);
        self
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

impl<P: EventProvider> EventProvider for Retrying<P> {
    fn fetch(&self, range: DateRange) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        Box::pin(async move {
            let attempts = self.policy.attempts();
            let mut attempt = 0;
            loop {
                attempt += 1;
                match self.inner.fetch(range).await {
                    Ok(events) => return Ok(events),
                    Err(error) if attempt < attempts => {
                        tracing::warn!(
                            provider = %self.name,
                            attempt,
                            error = %error,
                            "Fetch failed, retrying"
                        );
                    }
                    Err(error) => {
                        tracing::error!(
                            provider = %self.name,
                            attempts,
                            error = %error,
                            "Fetch failed, giving up"
                        );
                        if let Some(tx) = &self.on_exhausted
                            && tx
                                .send(ReloadRequest::new(format!(
                                    "{} failed {attempts} times",
                                    self.name
                                )))
                                .is_err()
                        {
                            tracing::warn!(provider = %self.name, "Reload listener is gone");
                        }
                        return Err(ProviderError::RetriesExhausted {
                            attempts: attempt,
                            source: Box::new(error),
                        });
                    }
                }
            }
        })
    }
}
