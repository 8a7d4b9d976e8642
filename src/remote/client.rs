//! HTTP access to the product API with uniform failure routing.
//!
//! | Status | Outcome |
//! |---|---|
//! | 2xx | body decoded |
//! | 400 | [`FoodGradeError::InvalidIdentifier`] |
//! | 404 | `Ok(None)`, never retried |
//! | 429 | retried after 1s, 2s, 4s; then [`FoodGradeError::RateLimited`] |
//! | 500 | [`FoodGradeError::ServiceDegraded`], never retried |
//! | other | [`FoodGradeError::TransportError`] |

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::config;
use crate::error::{FoodGradeError, Result};
use crate::identifier::Identifier;
use crate::models::{ProductRecord, Recommendation};
use crate::remote::transport::{HttpResponse, ReqwestTransport, Transport};
use crate::remote::RemoteDataSource;
use crate::timing::{Sleeper, ThreadSleeper};

/// Per-request state that survives retries of the same logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub url: String,
    pub retry_count: u32,
}

impl RequestContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retry_count: 0,
        }
    }
}

/// What to do with a response.
enum Routed {
    Body(String),
    NotFound,
    RetryAfter(Duration),
}

/// Backoff before retry number `retry_count + 1`: 2^retry_count seconds.
pub fn backoff_delay(retry_count: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(retry_count))
}

pub struct RemoteClient<T: Transport = ReqwestTransport> {
    base_url: String,
    transport: T,
    sleeper: Arc<dyn Sleeper>,
    max_retries: u32,
}

impl RemoteClient<ReqwestTransport> {
    /// Client for `base_url` (e.g. `http://localhost:5000/api`) with the
    /// given per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self::with_transport(base_url, ReqwestTransport::new(timeout))
    }
}

impl<T: Transport> RemoteClient<T> {
    pub fn with_transport(base_url: impl Into<String>, transport: T) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            sleeper: Arc::new(ThreadSleeper),
            max_retries: config::MAX_RATE_LIMIT_RETRIES,
        }
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `path` relative to the base URL and decode the JSON body.
    ///
    /// Returns `Ok(None)` on 404.
    pub fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<Option<R>> {
        let mut ctx = RequestContext::new(format!("{}{}", self.base_url, path));
        loop {
            debug!("GET {} (retry {})", ctx.url, ctx.retry_count);
            let response = self.transport.get(&ctx.url)?;
            match self.route(&mut ctx, response)? {
                Routed::Body(body) => {
                    let decoded = serde_json::from_str(&body).map_err(|e| {
                        FoodGradeError::TransportError(format!(
                            "malformed response from {}: {e}",
                            ctx.url
                        ))
                    })?;
                    return Ok(Some(decoded));
                }
                Routed::NotFound => return Ok(None),
                Routed::RetryAfter(delay) => self.sleeper.sleep(delay),
            }
        }
    }

    fn route(&self, ctx: &mut RequestContext, response: HttpResponse) -> Result<Routed> {
        if response.is_success() {
            return Ok(Routed::Body(response.body));
        }
        match response.status {
            404 => Ok(Routed::NotFound),
            400 => Err(FoodGradeError::InvalidIdentifier(error_message(
                &response.body,
                "Invalid barcode format",
            ))),
            429 if ctx.retry_count < self.max_retries => {
                let delay = backoff_delay(ctx.retry_count);
                ctx.retry_count += 1;
                warn!(
                    "Rate limited on {}; retry {}/{} in {:?}",
                    ctx.url, ctx.retry_count, self.max_retries, delay
                );
                Ok(Routed::RetryAfter(delay))
            }
            429 => Err(FoodGradeError::RateLimited {
                attempts: ctx.retry_count,
            }),
            500 => {
                warn!("Product API degraded on {}", ctx.url);
                Err(FoodGradeError::ServiceDegraded(error_message(
                    &response.body,
                    "Internal server error",
                )))
            }
            status => Err(FoodGradeError::TransportError(format!(
                "unexpected status {status} from {}",
                ctx.url
            ))),
        }
    }
}

/// The `error` field of a JSON error body, or `fallback`.
fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| fallback.to_string())
}

impl<T: Transport> RemoteDataSource for RemoteClient<T> {
    fn fetch_product(&self, id: &Identifier) -> Result<Option<ProductRecord>> {
        let Some(record) = self.get_json::<ProductRecord>(&format!("/products/{id}"))? else {
            return Ok(None);
        };
        if record.barcode != *id {
            return Err(FoodGradeError::TransportError(format!(
                "requested {id} but received {}",
                record.barcode
            )));
        }
        record.validate()?;
        Ok(Some(record))
    }

    fn fetch_recommendations(&self, id: &Identifier) -> Result<Option<Vec<Recommendation>>> {
        self.get_json(&format!("/products/{id}/recommendations"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_one_second() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn error_message_reads_error_field() {
        assert_eq!(
            error_message(r#"{"error":"Invalid barcode format"}"#, "x"),
            "Invalid barcode format"
        );
        assert_eq!(error_message("<html>", "fallback"), "fallback");
    }
}
