use crate::error::ConnectorError;
use async_trait::async_trait;
use model::records::source::SourceRecord;
use std::sync::Arc;

pub mod client;
pub mod config;
pub mod domain;
pub mod rpc;

pub use client::{ErpClient, ErpConnector, ErpReader, ErpSession};
pub use config::{Credentials, ErpConfig};
pub use domain::Domain;

/// Paged, read-only access to the ERP's remote collections.
///
/// Implementations are bound to an authenticated session.
#[async_trait]
pub trait RemoteReader: Send + Sync {
    /// Number of records in `collection` matching `filter`.
    async fn count(&self, collection: &str, filter: &Domain) -> Result<u64, ConnectorError>;

    /// Identifiers of matching records starting at `offset`, at most `limit`.
    /// An empty result means there is nothing left at that offset.
    async fn fetch_identifiers(
        &self,
        collection: &str,
        filter: &Domain,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<i64>, ConnectorError>;

    /// Requested fields for the given identifiers. Result order is unspecified.
    async fn fetch_records(
        &self,
        collection: &str,
        ids: &[i64],
        fields: &[String],
    ) -> Result<Vec<SourceRecord>, ConnectorError>;
}

/// Opens a session and hands back a reader bound to it.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self) -> Result<Arc<dyn RemoteReader>, ConnectorError>;
}
