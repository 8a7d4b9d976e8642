//! Access to the remote product data source.
//!
//! [`RemoteDataSource`] is the seam the resolver and the recommendation
//! generator depend on. [`RemoteClient`] implements it over HTTP with
//! status-driven error routing; [`MockCatalog`] implements it from a small
//! built-in product list for offline use and tests.

pub mod catalog;
pub mod client;
pub mod transport;

pub use catalog::MockCatalog;
pub use client::{RemoteClient, RequestContext};
pub use transport::{HttpResponse, ReqwestTransport, Transport};

use crate::error::Result;
use crate::identifier::Identifier;
use crate::models::{ProductRecord, Recommendation};

/// Identifier-keyed product lookup.
///
/// A product the source does not know is `Ok(None)`, never an error.
pub trait RemoteDataSource {
    fn fetch_product(&self, id: &Identifier) -> Result<Option<ProductRecord>>;

    /// Recommendation candidates for `id`, in the source's preferred order.
    fn fetch_recommendations(&self, id: &Identifier) -> Result<Option<Vec<Recommendation>>>;
}

impl<T: RemoteDataSource + ?Sized> RemoteDataSource for Box<T> {
    fn fetch_product(&self, id: &Identifier) -> Result<Option<ProductRecord>> {
        (**self).fetch_product(id)
    }

    fn fetch_recommendations(&self, id: &Identifier) -> Result<Option<Vec<Recommendation>>> {
        (**self).fetch_recommendations(id)
    }
}
