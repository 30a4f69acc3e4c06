use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("invalid bind address {addr:?}: {reason}")]
    InvalidAddr { addr: String, reason: String },

    #[error("relay io error: {0}")]
    Io(#[from] std::io::Error),
}
