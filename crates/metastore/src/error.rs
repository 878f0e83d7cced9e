//! Transport-level errors for the metastore gateway client.
//!
//! These never escape the lookup service: it absorbs them into
//! degrade-to-empty behavior and a reconnect request.

/// Errors that can occur talking to the metastore gateway.
#[derive(Debug, thiserror::Error)]
pub enum MetastoreError {
    /// HTTP transport error (connection, DNS, TLS, body decoding).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Retry middleware gave up or failed to build the request.
    #[error("HTTP middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// The gateway is unreachable; raised by the reconnect primitive.
    #[error("connection error: {0}")]
    Connection(String),

    /// The remote answered definitively that the resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status from the gateway.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl MetastoreError {
    /// A definitive "no such resource" answer, as opposed to a failure to
    /// get an answer at all. Definitive absence is cacheable; failure is not.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MetastoreError::NotFound(_))
    }
}

/// Result type for metastore client operations.
pub type Result<T> = std::result::Result<T, MetastoreError>;
