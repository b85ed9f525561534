use thiserror::Error;

/// Qovery API errors.
///
/// SECURITY: Error messages must NEVER contain the API token or secret values.
#[derive(Debug, Error)]
pub enum QoveryError {
    /// Token rejected (401) or not allowed on the resource (403)
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// API returned a non-success response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Response body did not match the expected shape
    #[error("failed to decode {resource}: {message}")]
    Decode { resource: String, message: String },
}
