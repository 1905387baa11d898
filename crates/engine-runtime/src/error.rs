use connectors::error::ConnectorError;
use engine_config::settings::error::SettingsError;
use engine_core::error::ErrorClass;
use engine_processing::error::{FetchError, WriteError};
use thiserror::Error;

/// Why an entity sync, or the whole run, stopped.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(#[source] ConnectorError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Failed to create client: {0}")]
    Client(#[source] ConnectorError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl SyncError {
    pub fn class(&self) -> ErrorClass {
        match self {
            SyncError::Auth(_) => ErrorClass::Auth,
            SyncError::Fetch(e) if e.is_auth() => ErrorClass::Auth,
            SyncError::Fetch(_) => ErrorClass::Transport,
            SyncError::Write(_) => ErrorClass::Write,
            SyncError::Client(_) | SyncError::Settings(_) => ErrorClass::Config,
        }
    }

    /// Errors after which no further entity should be attempted.
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_failure(source: ConnectorError) -> SyncError {
        SyncError::Fetch(FetchError::Count {
            collection: "res.partner".into(),
            source,
        })
    }

    #[test]
    fn test_expired_session_during_fetch_is_auth() {
        let err = count_failure(ConnectorError::Auth("session expired".into()));
        assert_eq!(err.class(), ErrorClass::Auth);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_remote_failure_is_transport() {
        let err = count_failure(ConnectorError::Status {
            status: 502,
            body: "bad gateway".into(),
        });
        assert_eq!(err.class(), ErrorClass::Transport);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let err = SyncError::Write(WriteError::Clear {
            table: "aumet_products".into(),
            scope: "aumet_id=neq.0".into(),
            source: ConnectorError::Status {
                status: 401,
                body: "invalid api key".into(),
            },
        });
        assert_eq!(err.class(), ErrorClass::Write);
        assert!(!err.is_fatal());
    }
}
