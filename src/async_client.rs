//! Async wrapper around [`FoodGradeSdk`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all SDK operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free while
//! the store transaction or the HTTP request (including any rate-limit
//! backoff) is in flight.
//!
//! # Example
//!
//! ```no_run
//! use foodgrade_sdk::AsyncFoodGradeSdk;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sdk = AsyncFoodGradeSdk::builder().offline(true).build().await.unwrap();
//!
//!     let product = sdk.resolve("8901063004122").await.unwrap();
//!     let recs = sdk.recommendations("8901063004122").await.unwrap();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config;
use crate::error::{FoodGradeError, Result};
use crate::models::{ProductRecord, Recommendation, ScanHistoryEntry, UserPreferences};
use crate::FoodGradeSdk;

// ---------------------------------------------------------------------------
// AsyncFoodGradeSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncFoodGradeSdk`] instance.
pub struct AsyncFoodGradeSdkBuilder {
    store_path: Option<PathBuf>,
    in_memory: bool,
    api_base: Option<String>,
    offline: bool,
    timeout: Duration,
}

impl Default for AsyncFoodGradeSdkBuilder {
    fn default() -> Self {
        Self {
            store_path: None,
            in_memory: false,
            api_base: None,
            offline: false,
            timeout: config::REQUEST_TIMEOUT,
        }
    }
}

impl AsyncFoodGradeSdkBuilder {
    pub fn store_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.store_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the async SDK on the blocking thread pool.
    pub async fn build(self) -> Result<AsyncFoodGradeSdk> {
        tokio::task::spawn_blocking(move || {
            let mut builder = FoodGradeSdk::builder()
                .in_memory(self.in_memory)
                .offline(self.offline)
                .timeout(self.timeout);
            if let Some(path) = self.store_path {
                builder = builder.store_path(path);
            }
            if let Some(url) = self.api_base {
                builder = builder.api_base(url);
            }
            let sdk = builder.build()?;
            Ok(AsyncFoodGradeSdk::from_sdk(sdk))
        })
        .await
        .map_err(join_error)?
    }
}

// ---------------------------------------------------------------------------
// AsyncFoodGradeSdk
// ---------------------------------------------------------------------------

/// Async wrapper around [`FoodGradeSdk`].
///
/// The SDK is shared behind a [`Mutex`], so calls are serialized: two
/// concurrent resolves of the same identifier cannot both miss the cache.
pub struct AsyncFoodGradeSdk {
    inner: Arc<Mutex<FoodGradeSdk>>,
}

impl AsyncFoodGradeSdk {
    pub fn builder() -> AsyncFoodGradeSdkBuilder {
        AsyncFoodGradeSdkBuilder::default()
    }

    /// Wrap an already configured SDK.
    pub fn from_sdk(sdk: FoodGradeSdk) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sdk)),
        }
    }

    /// Run a sync SDK operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&FoodGradeSdk) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = sdk
                .lock()
                .map_err(|_| FoodGradeError::StorageUnavailable("SDK lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(join_error)?
    }

    pub async fn resolve(&self, raw: &str) -> Result<Option<ProductRecord>> {
        let raw = raw.to_string();
        self.run(move |s| s.resolve(&raw)).await
    }

    pub async fn scan(&self, raw: &str) -> Result<Option<ProductRecord>> {
        let raw = raw.to_string();
        self.run(move |s| s.scan(&raw)).await
    }

    pub async fn recommendations(&self, raw: &str) -> Result<Vec<Recommendation>> {
        let raw = raw.to_string();
        self.run(move |s| s.get_recommendations(&raw)).await
    }

    pub async fn toggle_favorite(&self, record: ProductRecord) -> Result<Vec<ProductRecord>> {
        self.run(move |s| s.toggle_favorite(&record)).await
    }

    pub async fn favorites(&self) -> Result<Vec<ProductRecord>> {
        self.run(|s| s.ledger().favorites()).await
    }

    pub async fn history(&self) -> Result<Vec<ScanHistoryEntry>> {
        self.run(|s| s.history()).await
    }

    pub async fn preferences(&self) -> Result<UserPreferences> {
        self.run(|s| s.ledger().preferences()).await
    }
}

fn join_error(e: tokio::task::JoinError) -> FoodGradeError {
    FoodGradeError::TransportError(format!("Task join error: {e}"))
}
