use connectors::error::ConnectorError;
use engine_config::settings::error::SettingsError;
use engine_runtime::error::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Failed to run the sync: {0}")]
    Sync(#[from] SyncError),

    #[error("Connection check failed: {0}")]
    Connector(#[from] ConnectorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}
