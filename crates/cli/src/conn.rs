use crate::error::CliError;
use async_trait::async_trait;
use connectors::{
    erp::{Credentials, ErpClient},
    rest::RestClient,
};
use tracing::{error, info};

/// Trait for "pinging" a remote endpoint
#[async_trait]
pub trait ConnectionPinger {
    fn name(&self) -> &'static str;

    /// Attempts to ping; returns a short description of what answered.
    async fn ping(&self) -> Result<String, CliError>;
}

/// Checks the ERP version endpoint, then logs in.
pub struct ErpPinger<'a> {
    pub client: &'a ErpClient,
    pub credentials: &'a Credentials,
}

/// Checks that the REST store answers with the configured key.
pub struct StorePinger<'a> {
    pub client: &'a RestClient,
}

#[async_trait]
impl ConnectionPinger for ErpPinger<'_> {
    fn name(&self) -> &'static str {
        "erp"
    }

    async fn ping(&self) -> Result<String, CliError> {
        let url = &self.client.config().url;
        info!("Pinging ERP at '{}'", url);

        let version = self.client.version().await.map_err(|e| {
            error!("ERP version call to '{}' failed: {}", url, e);
            e
        })?;
        let server_version = version
            .get("server_version")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        let session = self.client.authenticate(self.credentials).await?;
        info!(uid = session.uid, "ERP login succeeded");

        Ok(format!(
            "server {server_version}, logged in as '{}' (uid {})",
            session.username(),
            session.uid
        ))
    }
}

#[async_trait]
impl ConnectionPinger for StorePinger<'_> {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn ping(&self) -> Result<String, CliError> {
        let url = &self.client.config().url;
        info!("Pinging REST store at '{}'", url);

        self.client.ping().await.map_err(|e| {
            error!("REST store at '{}' did not answer: {}", url, e);
            e
        })?;
        Ok(format!("{url} reachable"))
    }
}
