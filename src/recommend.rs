//! Related-product recommendations.

use std::collections::HashSet;

use log::debug;

use crate::error::{FoodGradeError, Result};
use crate::identifier::Identifier;
use crate::models::{ProductRecord, Recommendation, RecommendationKind};
use crate::remote::RemoteDataSource;
use crate::resolver::Resolver;

/// Picks one recommendation per [`RecommendationKind`] for a product.
///
/// Recommendations are recomputed on every call and never stored.
pub struct RecommendationGenerator<'a> {
    resolver: Resolver<'a>,
    remote: &'a dyn RemoteDataSource,
}

impl<'a> RecommendationGenerator<'a> {
    pub fn new(resolver: Resolver<'a>, remote: &'a dyn RemoteDataSource) -> Self {
        Self { resolver, remote }
    }

    /// Recommendations for the product behind `raw`.
    ///
    /// An unknown product yields an empty list. Invalid input and transport
    /// faults are still errors.
    pub fn for_identifier(&self, raw: &str) -> Result<Vec<Recommendation>> {
        let id = Identifier::parse(raw)?;
        match self.resolver.resolve_id(&id)? {
            Some(product) => self.for_product(&product),
            None => {
                debug!("No product behind {id}; no recommendations");
                Ok(Vec::new())
            }
        }
    }

    /// Up to three recommendations, ordered healthier, similar, alternative.
    ///
    /// Each references a distinct product other than `product`. The list is
    /// shorter than three only when the source offers no eligible candidate
    /// for some kind, e.g. when its only candidate is `product` itself; that
    /// kind is left out rather than padded.
    pub fn for_product(&self, product: &ProductRecord) -> Result<Vec<Recommendation>> {
        let candidates = match self.remote.fetch_recommendations(&product.barcode) {
            Ok(Some(candidates)) => candidates,
            Ok(None) | Err(FoodGradeError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(select(product, candidates))
    }
}

/// First eligible candidate for each kind, in [`RecommendationKind::ALL`] order.
pub fn select(product: &ProductRecord, candidates: Vec<Recommendation>) -> Vec<Recommendation> {
    let mut used: HashSet<Identifier> = HashSet::new();
    used.insert(product.barcode.clone());

    let mut picked: Vec<Option<Recommendation>> = vec![None; RecommendationKind::ALL.len()];
    for candidate in candidates {
        let Some(slot) = RecommendationKind::ALL
            .iter()
            .position(|k| *k == candidate.kind)
        else {
            continue;
        };
        if picked[slot].is_some() || used.contains(&candidate.product.barcode) {
            continue;
        }
        used.insert(candidate.product.barcode.clone());
        picked[slot] = Some(candidate);
    }
    picked.into_iter().flatten().collect()
}
