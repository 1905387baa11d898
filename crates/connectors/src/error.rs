use thiserror::Error;

/// Errors raised while talking to the ERP or the REST store.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Credentials were rejected, or the session is no longer valid.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network-level failure, including timeouts.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-success HTTP status.
    #[error("Remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The ERP returned a JSON-RPC error object.
    #[error("RPC fault {code} ({name}): {message}")]
    Rpc {
        code: i64,
        name: String,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ConnectorError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ConnectorError::Auth(_))
    }

    /// Whether repeating the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::Http(err) => {
                err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
            }
            ConnectorError::Status { status, .. } => *status == 429 || *status >= 500,
            ConnectorError::Auth(_)
            | ConnectorError::Rpc { .. }
            | ConnectorError::Decode(_)
            | ConnectorError::InvalidUrl(_) => false,
        }
    }
}
