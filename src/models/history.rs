use serde::{Deserialize, Serialize};

use super::product::ProductRecord;

// ---------------------------------------------------------------------------
// ScanHistoryEntry — product snapshot plus capture time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanHistoryEntry {
    #[serde(flatten)]
    pub product: ProductRecord,
    /// Epoch milliseconds.
    pub timestamp: i64,
}
