use thiserror::Error;

/// Infrastructure failures. These never describe the orders themselves; the sync manager handles them by failing over
/// or retrying on the next poll.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Could not reach the server. {0}")]
    ConnectionError(String),
    #[error("The server responded with {status}. {message}")]
    ServerError { status: u16, message: String },
    #[error("The push channel was closed")]
    PushClosed,
    #[error("Could not understand the server's response. {0}")]
    InvalidResponse(String),
    #[error("Invalid server URL. {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::ConnectionError(e.to_string())
        }
    }
}

impl From<url::ParseError> for TransportError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}
