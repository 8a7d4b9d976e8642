use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";
/// Environment variable overriding [`DEFAULT_API_BASE`].
pub const API_BASE_ENV: &str = "FOODGRADE_API_BASE_URL";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_RATE_LIMIT_RETRIES: u32 = 3;

pub const SCAN_INTERVAL: Duration = Duration::from_millis(300);
/// About 5 seconds of sampling at [`SCAN_INTERVAL`], counting only frames that reached the decoder.
pub const MAX_SCAN_ATTEMPTS: u32 = 10;
/// Ticks without a sized frame before a session gives up (about 10 seconds).
pub const MAX_UNSIZED_TICKS: u32 = 33;
pub const TARGET_RESOLUTION: (u32, u32) = (1280, 720);

pub const IDENTIFIER_LENGTH: usize = 13;
pub const HISTORY_LIMIT: usize = 10;
pub const PERFORMANCE_LOG_LIMIT: usize = 100;
pub const RECOMMENDATION_COUNT: usize = 3;

pub const SCHEMA_VERSION: i64 = 1;

// Keys in the flat key-value area of the store.
pub const FAVORITES_KEY: &str = "favorites";
pub const SCAN_HISTORY_KEY: &str = "scanHistory";
pub const PREFERENCES_KEY: &str = "userPreferences";
pub const PERFORMANCE_KEY: &str = "scanPerformance";

pub const STORE_FILE: &str = "foodgrade.duckdb";

/// Base URL of the remote product API, honoring [`API_BASE_ENV`].
pub fn api_base() -> String {
    std::env::var(API_BASE_ENV)
        .ok()
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

pub fn default_store_path() -> PathBuf {
    if let Some(data) = dirs::data_local_dir() {
        data.join("foodgrade-sdk").join(STORE_FILE)
    } else {
        PathBuf::from(".foodgrade-sdk").join(STORE_FILE)
    }
}
