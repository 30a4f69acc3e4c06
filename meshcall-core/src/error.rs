use thiserror::Error;

/// Errors raised while decoding signal messages or building endpoint addresses.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed signal message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid {what} identifier {value:?}")]
    InvalidIdentifier { what: &'static str, value: String },

    #[error("invalid signaling endpoint: {0}")]
    InvalidEndpoint(String),
}
