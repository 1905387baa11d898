use crate::{
    erp::{
        Authenticator, Domain, RemoteReader,
        config::{Credentials, ErpConfig},
        rpc::{RpcRequest, RpcResponse},
    },
    error::ConnectorError,
};
use async_trait::async_trait;
use model::records::source::SourceRecord;
use serde_json::{Value as JsonValue, json};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tracing::{debug, info};

/// JSON-RPC client for the ERP's `/jsonrpc` endpoint.
pub struct ErpClient {
    http: reqwest::Client,
    config: ErpConfig,
    next_id: AtomicU64,
}

/// An authenticated ERP user. Every object call carries these credentials.
#[derive(Debug, Clone)]
pub struct ErpSession {
    pub uid: i64,
    credentials: Credentials,
}

impl ErpSession {
    pub fn username(&self) -> &str {
        &self.credentials.username
    }
}

impl ErpClient {
    pub fn new(config: ErpConfig) -> Result<Self, ConnectorError> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(ConnectorError::InvalidUrl(config.url.clone()));
        }

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(ErpClient {
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &ErpConfig {
        &self.config
    }

    async fn call(
        &self,
        service: &str,
        method: &str,
        args: Vec<JsonValue>,
    ) -> Result<JsonValue, ConnectorError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::call(id, service, method, args);

        let response = self
            .http
            .post(self.config.endpoint())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| ConnectorError::Decode(format!("{service}.{method}: {e}")))?;

        body.into_result()
    }

    /// Server version information; does not require authentication.
    pub async fn version(&self) -> Result<JsonValue, ConnectorError> {
        self.call("common", "version", vec![]).await
    }

    /// Logs in and returns the session used for subsequent object calls.
    ///
    /// Transport failures during login are reported as authentication
    /// failures, since the run cannot proceed without a session.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<ErpSession, ConnectorError> {
        let args = vec![
            json!(self.config.database),
            json!(credentials.username),
            json!(credentials.password),
            json!({}),
        ];

        let result = self
            .call("common", "authenticate", args)
            .await
            .map_err(|e| match e {
                ConnectorError::Auth(_) => e,
                other => ConnectorError::Auth(other.to_string()),
            })?;

        match result.as_i64() {
            Some(uid) if uid > 0 => {
                info!(uid, database = %self.config.database, "Authenticated with ERP");
                Ok(ErpSession {
                    uid,
                    credentials: credentials.clone(),
                })
            }
            _ => Err(ConnectorError::Auth(format!(
                "ERP rejected credentials for user '{}'",
                credentials.username
            ))),
        }
    }

    pub async fn execute_kw(
        &self,
        session: &ErpSession,
        model: &str,
        method: &str,
        args: Vec<JsonValue>,
        kwargs: JsonValue,
    ) -> Result<JsonValue, ConnectorError> {
        debug!(model, method, "ERP execute_kw");
        let call_args = vec![
            json!(self.config.database),
            json!(session.uid),
            json!(session.credentials.password),
            json!(model),
            json!(method),
            JsonValue::Array(args),
            kwargs,
        ];
        self.call("object", "execute_kw", call_args).await
    }
}

/// [`RemoteReader`] over an authenticated ERP session.
#[derive(Clone)]
pub struct ErpReader {
    client: Arc<ErpClient>,
    session: ErpSession,
}

impl ErpReader {
    pub fn new(client: Arc<ErpClient>, session: ErpSession) -> Self {
        ErpReader { client, session }
    }
}

/// Logs in with fixed credentials; one session per call.
pub struct ErpConnector {
    client: Arc<ErpClient>,
    credentials: Credentials,
}

impl ErpConnector {
    pub fn new(client: Arc<ErpClient>, credentials: Credentials) -> Self {
        ErpConnector {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl Authenticator for ErpConnector {
    async fn authenticate(&self) -> Result<Arc<dyn RemoteReader>, ConnectorError> {
        let session = self.client.authenticate(&self.credentials).await?;
        Ok(Arc::new(ErpReader::new(Arc::clone(&self.client), session)))
    }
}

fn decode_ids(value: JsonValue) -> Result<Vec<i64>, ConnectorError> {
    serde_json::from_value(value).map_err(|e| ConnectorError::Decode(format!("id list: {e}")))
}

#[async_trait]
impl RemoteReader for ErpReader {
    async fn count(&self, collection: &str, filter: &Domain) -> Result<u64, ConnectorError> {
        let result = self
            .client
            .execute_kw(
                &self.session,
                collection,
                "search_count",
                vec![json!(filter)],
                json!({}),
            )
            .await?;

        result
            .as_u64()
            .ok_or_else(|| ConnectorError::Decode(format!("search_count returned {result}")))
    }

    async fn fetch_identifiers(
        &self,
        collection: &str,
        filter: &Domain,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<i64>, ConnectorError> {
        let result = self
            .client
            .execute_kw(
                &self.session,
                collection,
                "search",
                vec![json!(filter)],
                json!({"offset": offset, "limit": limit, "order": "id asc"}),
            )
            .await?;

        decode_ids(result)
    }

    async fn fetch_records(
        &self,
        collection: &str,
        ids: &[i64],
        fields: &[String],
    ) -> Result<Vec<SourceRecord>, ConnectorError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = self
            .client
            .execute_kw(
                &self.session,
                collection,
                "read",
                vec![json!(ids)],
                json!({"fields": fields}),
            )
            .await?;

        serde_json::from_value(result)
            .map_err(|e| ConnectorError::Decode(format!("{collection}.read: {e}")))
    }
}
