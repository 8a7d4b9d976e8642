use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanPerformanceEntry {
    pub barcode: String,
    /// Milliseconds from capture start to resolution.
    pub duration: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScanPerformanceMetrics {
    pub total_scans: usize,
    pub average_scan_duration: f64,
}
