//! Identifier to product resolution, preferring the local store.

use log::{debug, info};

use crate::error::{FoodGradeError, Result};
use crate::identifier::Identifier;
use crate::models::ProductRecord;
use crate::remote::RemoteDataSource;
use crate::store::ProductCache;

/// Cache-then-remote product lookup.
///
/// Borrows the store and the remote source from the SDK; construct one per
/// call site with [`crate::FoodGradeSdk::resolver`].
pub struct Resolver<'a> {
    store: &'a dyn ProductCache,
    remote: &'a dyn RemoteDataSource,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a dyn ProductCache, remote: &'a dyn RemoteDataSource) -> Self {
        Self { store, remote }
    }

    /// Validate `raw` and resolve it.
    ///
    /// Malformed input fails with [`FoodGradeError::InvalidIdentifier`]
    /// before the store or the remote source is touched.
    pub fn resolve(&self, raw: &str) -> Result<Option<ProductRecord>> {
        let id = Identifier::parse(raw)?;
        self.resolve_id(&id)
    }

    /// Resolve an already validated identifier.
    ///
    /// 1. A cached record is returned without any remote access.
    /// 2. On a miss the remote source is queried; a hit is written to the
    ///    store together with a history entry before it is returned, so the
    ///    next call for `id` is a cache hit.
    /// 3. A remote miss is `Ok(None)`.
    ///
    /// Store and remote faults are wrapped in
    /// [`FoodGradeError::ResolutionFailed`].
    pub fn resolve_id(&self, id: &Identifier) -> Result<Option<ProductRecord>> {
        if let Some(cached) = self.store.get(id).map_err(|e| failed(id, e))? {
            debug!("Resolved {id} from local store");
            return Ok(Some(cached));
        }

        let fetched = match self.remote.fetch_product(id) {
            Ok(found) => found,
            Err(FoodGradeError::NotFound(_)) => None,
            Err(e) => return Err(failed(id, e)),
        };
        let Some(record) = fetched else {
            info!("No product found for barcode: {id}");
            return Ok(None);
        };

        let stored = self.store.cache_resolved(&record).map_err(|e| failed(id, e))?;
        debug!("Resolved {id} from remote source and cached it");
        Ok(Some(stored))
    }
}

fn failed(id: &Identifier, source: FoodGradeError) -> FoodGradeError {
    FoodGradeError::ResolutionFailed {
        identifier: id.to_string(),
        source: Box::new(source),
    }
}
