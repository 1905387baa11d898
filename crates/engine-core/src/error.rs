use serde::Serialize;
use std::fmt;

/// Failure classes reported per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Credentials or session rejected; the whole run stops.
    Auth,
    /// Network or remote failure while reading; the entity stops.
    Transport,
    /// A record could not be reshaped; the record is dropped.
    Transform,
    /// The destination rejected a delete or a batch; the entity stops.
    Write,
    /// Invalid settings or entity plan.
    Config,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Auth => "auth",
            ErrorClass::Transport => "transport",
            ErrorClass::Transform => "transform",
            ErrorClass::Write => "write",
            ErrorClass::Config => "config",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
