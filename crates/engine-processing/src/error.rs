use connectors::error::ConnectorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to count '{collection}': {source}")]
    Count {
        collection: String,
        #[source]
        source: ConnectorError,
    },

    #[error("Failed to page identifiers of '{collection}' at offset {offset}: {source}")]
    Page {
        collection: String,
        offset: u64,
        #[source]
        source: ConnectorError,
    },

    #[error("Failed to read {ids} records of '{collection}': {source}")]
    Read {
        collection: String,
        ids: usize,
        #[source]
        source: ConnectorError,
    },
}

impl FetchError {
    pub fn connector(&self) -> &ConnectorError {
        match self {
            FetchError::Count { source, .. }
            | FetchError::Page { source, .. }
            | FetchError::Read { source, .. } => source,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.connector().is_auth()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Record of '{entity}' has no id")]
    MissingId { entity: String },
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to clear '{table}' where {scope}: {source}")]
    Clear {
        table: String,
        scope: String,
        #[source]
        source: ConnectorError,
    },

    #[error(
        "Failed to write batch '{batch_id}' ({rows} rows, {rows_committed} already committed): {source}"
    )]
    Batch {
        batch_id: String,
        rows: usize,
        rows_committed: usize,
        #[source]
        source: ConnectorError,
    },
}

impl WriteError {
    pub fn connector(&self) -> &ConnectorError {
        match self {
            WriteError::Clear { source, .. } | WriteError::Batch { source, .. } => source,
        }
    }

    /// Rows that reached the destination before the failure.
    pub fn rows_committed(&self) -> usize {
        match self {
            WriteError::Clear { .. } => 0,
            WriteError::Batch { rows_committed, .. } => *rows_committed,
        }
    }
}
