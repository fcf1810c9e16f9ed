//! Error types for the JSON layer.

/// Errors from JSON interop.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Convert(#[from] protostruct_core::Error),

    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}
