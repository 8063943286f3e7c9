use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to a NUT `upsd` daemon.
#[derive(Error, Debug)]
pub enum NutError {
    /// The TCP connection could not be established
    #[error("Failed to connect to NUT server at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to an established connection failed
    #[error("I/O error while talking to NUT server: {0}")]
    Io(#[from] std::io::Error),

    #[error("NUT server did not answer within {0:?}")]
    Timeout(Duration),

    #[error("NUT server closed the connection")]
    ConnectionClosed,

    /// The daemon answered `ERR UNKNOWN-UPS`
    #[error("Unknown UPS: {0}")]
    UnknownUnit(String),

    /// Any other `ERR <code>` answer
    #[error("NUT server returned an error: {0}")]
    Server(String),

    /// The answer did not follow the expected line structure
    #[error("Malformed NUT response: {0}")]
    Protocol(String),
}

impl NutError {
    /// Build the error matching an `ERR <code>` answer.
    pub fn from_server_code(code: &str, unit: Option<&str>) -> Self {
        match code {
            "UNKNOWN-UPS" => NutError::UnknownUnit(unit.unwrap_or_default().to_string()),
            _ => NutError::Server(code.to_string()),
        }
    }

    /// Whether the connection can no longer be trusted after this error.
    pub fn breaks_connection(&self) -> bool {
        !matches!(self, NutError::UnknownUnit(_) | NutError::Server(_))
    }
}
