#[derive(Debug, thiserror::Error)]
pub enum FoodGradeError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// An operation was called in a state that does not allow it, e.g.
    /// restarting a finished capture session.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited after {attempts} retries")]
    RateLimited { attempts: u32 },

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Service degraded: {0}")]
    ServiceDegraded(String),

    #[error("Resolution of {identifier} failed: {source}")]
    ResolutionFailed {
        identifier: String,
        #[source]
        source: Box<FoodGradeError>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<duckdb::Error> for FoodGradeError {
    fn from(err: duckdb::Error) -> Self {
        FoodGradeError::StorageUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for FoodGradeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FoodGradeError::Timeout
        } else {
            FoodGradeError::TransportError(err.to_string())
        }
    }
}

impl FoodGradeError {
    /// Message shown to the user when this error reaches the UI layer.
    pub fn user_message(&self) -> String {
        match self {
            FoodGradeError::InvalidIdentifier(msg) => msg.clone(),
            FoodGradeError::NotFound(id) => format!("No product found for barcode: {id}"),
            FoodGradeError::DeviceUnavailable(_) => {
                "Unable to access camera. Please check permissions.".to_string()
            }
            FoodGradeError::ServiceDegraded(_) => {
                "The service is under maintenance. Please try again later.".to_string()
            }
            FoodGradeError::ResolutionFailed { source, .. } => source.user_message(),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FoodGradeError::Timeout
            | FoodGradeError::RateLimited { .. }
            | FoodGradeError::TransportError(_)
            | FoodGradeError::DeviceUnavailable(_) => true,
            FoodGradeError::ResolutionFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// The innermost error, looking through [`FoodGradeError::ResolutionFailed`].
    pub fn root_cause(&self) -> &FoodGradeError {
        match self {
            FoodGradeError::ResolutionFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, FoodGradeError>;
