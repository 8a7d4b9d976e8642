//! Favorites, bounded scan history, user preferences and scan timing.
//!
//! All of this lives in the store's flat key-value area under the keys in
//! [`crate::config`]. Every mutation is a single atomic read-modify-write,
//! so concurrent toggles through the same store cannot lose updates.

use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::{
    FAVORITES_KEY, HISTORY_LIMIT, PERFORMANCE_KEY, PERFORMANCE_LOG_LIMIT, PREFERENCES_KEY,
    SCAN_HISTORY_KEY,
};
use crate::error::Result;
use crate::identifier::Identifier;
use crate::models::{
    ProductRecord, ScanHistoryEntry, ScanPerformanceEntry, ScanPerformanceMetrics,
    UserPreferences,
};
use crate::store::ProductCache;
use crate::timing::now_millis;

pub struct Ledger<'a> {
    store: &'a dyn ProductCache,
}

impl<'a> Ledger<'a> {
    pub fn new(store: &'a dyn ProductCache) -> Self {
        Self { store }
    }

    // -- Favorites -----------------------------------------------------------

    pub fn favorites(&self) -> Result<Vec<ProductRecord>> {
        Ok(decode_list(FAVORITES_KEY, self.store.get_value(FAVORITES_KEY)?))
    }

    pub fn is_favorite(&self, id: &Identifier) -> Result<bool> {
        Ok(self.favorites()?.iter().any(|p| p.barcode == *id))
    }

    /// Remove `record` if a favorite with its barcode exists, else append it.
    ///
    /// Returns the full resulting set.
    pub fn toggle_favorite(&self, record: &ProductRecord) -> Result<Vec<ProductRecord>> {
        self.update_list(FAVORITES_KEY, |favorites: &mut Vec<ProductRecord>| {
            match favorites.iter().position(|f| f.barcode == record.barcode) {
                Some(index) => {
                    favorites.remove(index);
                    debug!("Removed {} from favorites", record.barcode);
                }
                None => {
                    favorites.push(record.clone());
                    debug!("Added {} to favorites", record.barcode);
                }
            }
        })
    }

    // -- Scan history --------------------------------------------------------

    /// Most recent scans, newest first, at most [`HISTORY_LIMIT`] and one per barcode.
    pub fn history(&self) -> Result<Vec<ScanHistoryEntry>> {
        Ok(decode_list(
            SCAN_HISTORY_KEY,
            self.store.get_value(SCAN_HISTORY_KEY)?,
        ))
    }

    /// Put `record` at the front of the history, dropping its previous entry
    /// and anything beyond [`HISTORY_LIMIT`].
    pub fn record_scan(&self, record: &ProductRecord) -> Result<Vec<ScanHistoryEntry>> {
        let entry = ScanHistoryEntry {
            product: record.clone(),
            timestamp: now_millis(),
        };
        self.update_list(SCAN_HISTORY_KEY, |history: &mut Vec<ScanHistoryEntry>| {
            history.retain(|e| e.product.barcode != record.barcode);
            history.insert(0, entry.clone());
            history.truncate(HISTORY_LIMIT);
        })
    }

    pub fn clear_history(&self) -> Result<()> {
        self.store
            .put_value(SCAN_HISTORY_KEY, &Value::Array(Vec::new()))
    }

    // -- Preferences ---------------------------------------------------------

    /// Stored preferences, writing the defaults on first read.
    ///
    /// Only the first read writes; later reads are plain lookups.
    pub fn preferences(&self) -> Result<UserPreferences> {
        if let Some(stored) = self
            .store
            .get_value(PREFERENCES_KEY)?
            .and_then(|v| serde_json::from_value::<UserPreferences>(v).ok())
        {
            return Ok(stored);
        }

        let mut prefs = UserPreferences::default();
        self.store.update_value(PREFERENCES_KEY, &mut |current| {
            if let Some(stored) = current
                .and_then(|v| serde_json::from_value::<UserPreferences>(v).ok())
            {
                prefs = stored;
            } else {
                debug!("Synthesizing default preferences");
            }
            Ok(serde_json::to_value(&prefs)?)
        })?;
        Ok(prefs)
    }

    pub fn save_preferences(&self, prefs: &UserPreferences) -> Result<()> {
        self.store
            .put_value(PREFERENCES_KEY, &serde_json::to_value(prefs)?)
    }

    /// Whether a preferences record exists, i.e. onboarding has run or
    /// defaults were already synthesized.
    pub fn has_completed_onboarding(&self) -> Result<bool> {
        Ok(self.store.get_value(PREFERENCES_KEY)?.is_some())
    }

    // -- Scan performance ----------------------------------------------------

    /// Log how long a scan took, keeping the last [`PERFORMANCE_LOG_LIMIT`] entries.
    pub fn track_scan_performance(&self, id: &Identifier, duration: Duration) -> Result<()> {
        let entry = ScanPerformanceEntry {
            barcode: id.to_string(),
            duration: duration.as_secs_f64() * 1000.0,
            timestamp: now_millis(),
        };
        self.update_list(PERFORMANCE_KEY, |entries: &mut Vec<ScanPerformanceEntry>| {
            entries.push(entry.clone());
            if entries.len() > PERFORMANCE_LOG_LIMIT {
                let excess = entries.len() - PERFORMANCE_LOG_LIMIT;
                entries.drain(..excess);
            }
        })?;
        Ok(())
    }

    pub fn scan_performance_metrics(&self) -> Result<ScanPerformanceMetrics> {
        let entries: Vec<ScanPerformanceEntry> =
            decode_list(PERFORMANCE_KEY, self.store.get_value(PERFORMANCE_KEY)?);
        if entries.is_empty() {
            return Ok(ScanPerformanceMetrics::default());
        }
        let total: f64 = entries.iter().map(|e| e.duration).sum();
        Ok(ScanPerformanceMetrics {
            total_scans: entries.len(),
            average_scan_duration: total / entries.len() as f64,
        })
    }

    fn update_list<T, F>(&self, key: &str, mut mutate: F) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(&mut Vec<T>),
    {
        let mut result = Vec::new();
        self.store.update_value(key, &mut |current| {
            let mut list: Vec<T> = decode_list(key, current);
            mutate(&mut list);
            let value = serde_json::to_value(&list)?;
            result = list;
            Ok(value)
        })?;
        Ok(result)
    }
}

/// Decode a stored JSON array. Absent or unreadable values read as empty.
fn decode_list<T: DeserializeOwned>(key: &str, value: Option<Value>) -> Vec<T> {
    match value {
        None => Vec::new(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Ignoring unreadable {key} list: {e}");
            Vec::new()
        }),
    }
}
