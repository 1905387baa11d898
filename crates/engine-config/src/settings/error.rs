use thiserror::Error;

/// Errors raised while assembling sync settings and entity plans.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required environment variable is not set or empty.
    #[error("Missing required setting: {0}")]
    Missing(String),

    /// A setting is present but cannot be parsed.
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    /// An entity plan is malformed.
    #[error("Invalid entity plan '{entity}': {reason}")]
    InvalidPlan { entity: String, reason: String },

    /// An entity was requested that no plan defines.
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Failed to read plan file {path}: {source}")]
    PlanRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse plan file {path}: {source}")]
    PlanParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
