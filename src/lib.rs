//! FoodGrade SDK for Rust.
//!
//! Turns a product barcode, scanned from a camera feed or typed in, into a
//! graded product record. Resolved products are cached in a local DuckDB
//! store so repeat lookups never touch the network, and favorites, scan
//! history and user preferences live alongside them.
//!
//! # Quick start
//!
//! ```no_run
//! use foodgrade_sdk::FoodGradeSdk;
//!
//! let sdk = FoodGradeSdk::builder().offline(true).build().unwrap();
//!
//! // Resolve a barcode (local store first, then the remote source)
//! let product = sdk.resolve("8901063004122").unwrap().unwrap();
//!
//! // Related products and favorites
//! let recs = sdk.recommendations().for_product(&product).unwrap();
//! let favorites = sdk.toggle_favorite(&product).unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod capture;
pub mod config;
pub mod error;
pub mod identifier;
pub mod ledger;
pub mod models;
pub mod recommend;
pub mod remote;
pub mod resolver;
pub mod store;
pub mod timing;

#[cfg(feature = "async")]
pub use async_client::AsyncFoodGradeSdk;
pub use capture::{CaptureEvent, CaptureSession};
pub use error::{FoodGradeError, Result};
pub use identifier::Identifier;
pub use ledger::Ledger;
pub use recommend::RecommendationGenerator;
pub use remote::{MockCatalog, RemoteClient, RemoteDataSource};
pub use resolver::Resolver;
pub use store::{ProductCache, ProductStore};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use capture::{CameraDevice, FrameDecoder};
use models::{ProductRecord, Recommendation, ScanHistoryEntry};
use timing::{Sleeper, ThreadSleeper};

// ---------------------------------------------------------------------------
// FoodGradeSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`FoodGradeSdk`] instance.
///
/// Use [`FoodGradeSdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](FoodGradeSdkBuilder::build) to create the SDK.
pub struct FoodGradeSdkBuilder {
    store_path: Option<PathBuf>,
    in_memory: bool,
    api_base: Option<String>,
    timeout: Duration,
    offline: bool,
    remote: Option<Box<dyn RemoteDataSource + Send>>,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for FoodGradeSdkBuilder {
    fn default() -> Self {
        Self {
            store_path: None,
            in_memory: false,
            api_base: None,
            timeout: config::REQUEST_TIMEOUT,
            offline: false,
            remote: None,
            sleeper: Arc::new(ThreadSleeper),
        }
    }
}

impl FoodGradeSdkBuilder {
    /// Set the product store file.
    ///
    /// Defaults to [`config::default_store_path()`].
    pub fn store_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.store_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep the product store in memory; nothing survives the SDK.
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    /// Base URL of the product API.
    ///
    /// Defaults to [`config::api_base()`], which honors the
    /// `FOODGRADE_API_BASE_URL` environment variable.
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    /// Per-request timeout for the product API. Defaults to 10 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve against the built-in [`MockCatalog`] instead of the network.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Use a custom remote data source. Overrides `offline` and `api_base`.
    pub fn remote(mut self, remote: Box<dyn RemoteDataSource + Send>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// How the SDK waits between rate-limit retries and capture ticks.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Build the SDK.
    ///
    /// The store is not opened here; it is opened on first access and kept
    /// open for the SDK's lifetime.
    pub fn build(self) -> Result<FoodGradeSdk> {
        let store = if self.in_memory {
            ProductStore::in_memory()
        } else {
            ProductStore::new(self.store_path.unwrap_or_else(config::default_store_path))
        };

        let remote: Box<dyn RemoteDataSource + Send> = match self.remote {
            Some(remote) => remote,
            None if self.offline => Box::new(MockCatalog::new()),
            None => {
                let base = self.api_base.unwrap_or_else(config::api_base);
                if !base.starts_with("http://") && !base.starts_with("https://") {
                    return Err(FoodGradeError::TransportError(format!(
                        "API base URL must be http(s): {base}"
                    )));
                }
                Box::new(RemoteClient::new(base, self.timeout).sleeper(self.sleeper.clone()))
            }
        };

        Ok(FoodGradeSdk {
            store,
            remote,
            sleeper: self.sleeper,
        })
    }
}

// ---------------------------------------------------------------------------
// FoodGradeSdk
// ---------------------------------------------------------------------------

/// Everything the UI needs about one scanned product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductView {
    pub product: ProductRecord,
    pub recommendations: Vec<Recommendation>,
    pub is_favorite: bool,
}

/// The main entry point for the FoodGrade SDK.
///
/// Owns the [`ProductStore`] and the remote data source and exposes the
/// resolver, recommendation generator and ledger as lightweight borrowing
/// wrappers.
///
/// Created via [`FoodGradeSdk::builder()`].
pub struct FoodGradeSdk {
    store: ProductStore,
    remote: Box<dyn RemoteDataSource + Send>,
    sleeper: Arc<dyn Sleeper>,
}

impl FoodGradeSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> FoodGradeSdkBuilder {
        FoodGradeSdkBuilder::default()
    }

    // -- Service accessors -------------------------------------------------

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.store, self.remote.as_ref())
    }

    pub fn recommendations(&self) -> RecommendationGenerator<'_> {
        RecommendationGenerator::new(self.resolver(), self.remote.as_ref())
    }

    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(&self.store)
    }

    pub fn store(&self) -> &ProductStore {
        &self.store
    }

    pub fn remote(&self) -> &dyn RemoteDataSource {
        self.remote.as_ref()
    }

    // -- Operations exposed to UI collaborators ----------------------------

    /// Resolve `raw` to a product, or `None` if no source knows it.
    pub fn resolve(&self, raw: &str) -> Result<Option<ProductRecord>> {
        self.resolver().resolve(raw)
    }

    /// Recommendations for the product behind `raw`; empty when unknown.
    pub fn get_recommendations(&self, raw: &str) -> Result<Vec<Recommendation>> {
        self.recommendations().for_identifier(raw)
    }

    pub fn toggle_favorite(&self, record: &ProductRecord) -> Result<Vec<ProductRecord>> {
        self.ledger().toggle_favorite(record)
    }

    /// Recent scans, newest first.
    pub fn history(&self) -> Result<Vec<ScanHistoryEntry>> {
        self.ledger().history()
    }

    /// Resolve `raw` and, on a hit, move it to the front of the scan history.
    pub fn scan(&self, raw: &str) -> Result<Option<ProductRecord>> {
        let product = self.resolve(raw)?;
        if let Some(product) = &product {
            self.ledger().record_scan(product)?;
        }
        Ok(product)
    }

    /// [`scan`](Self::scan) plus recommendations and favorite status.
    pub fn lookup(&self, raw: &str) -> Result<Option<ProductView>> {
        let Some(product) = self.scan(raw)? else {
            return Ok(None);
        };
        let recommendations = self.recommendations().for_product(&product)?;
        let is_favorite = self.ledger().is_favorite(&product.barcode)?;
        Ok(Some(ProductView {
            product,
            recommendations,
            is_favorite,
        }))
    }

    /// A new single-use capture session on `device`.
    pub fn capture_session(
        &self,
        device: Box<dyn CameraDevice>,
        decoder: Box<dyn FrameDecoder>,
    ) -> CaptureSession {
        CaptureSession::new(device, decoder)
    }

    /// Run `session` to completion and resolve what it acquired.
    ///
    /// The scan duration is logged for
    /// [`Ledger::scan_performance_metrics`]. An exhausted session is
    /// returned as the event with no product.
    pub fn capture_and_scan(
        &self,
        session: &mut CaptureSession,
    ) -> Result<(CaptureEvent, Option<ProductRecord>)> {
        let started = std::time::Instant::now();
        let event = session.run(self.sleeper.as_ref())?;
        let product = match &event {
            CaptureEvent::Acquired(id) => {
                let product = self.resolver().resolve_id(id)?;
                if let Some(product) = &product {
                    self.ledger().record_scan(product)?;
                }
                self.ledger().track_scan_performance(id, started.elapsed())?;
                product
            }
            CaptureEvent::Exhausted(_) => None,
        };
        Ok((event, product))
    }

    /// Consume the SDK and release the store.
    pub fn close(self) {
        drop(self);
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for FoodGradeSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FoodGradeSdk(store={}, open={})",
            self.store,
            self.store.is_open()
        )
    }
}
