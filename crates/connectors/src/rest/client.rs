use crate::{
    error::ConnectorError,
    rest::{TableStore, config::StoreConfig, filter::ScopeFilter},
};
use async_trait::async_trait;
use model::records::row::RowData;
use reqwest::{
    Response,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use tracing::debug;

const PREFER: &str = "Prefer";
const CONTENT_RANGE: &str = "Content-Range";

/// Client for a PostgREST-style table API under `{url}/rest/v1`.
pub struct RestClient {
    http: reqwest::Client,
    config: StoreConfig,
}

impl RestClient {
    pub fn new(config: StoreConfig) -> Result<Self, ConnectorError> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(ConnectorError::InvalidUrl(config.url.clone()));
        }

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ConnectorError::Auth("API key is not a valid header value".into()))?;
        key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| ConnectorError::Auth("API key is not a valid header value".into()))?;
        bearer.set_sensitive(true);
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(RestClient { http, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Checks that the API root answers with the configured key.
    pub async fn ping(&self) -> Result<(), ConnectorError> {
        let url = format!("{}/rest/v1/", self.config.url);
        let response = self.http.get(url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn post_rows(
        &self,
        table: &str,
        rows: &[RowData],
        prefer: &str,
        conflict_column: Option<&str>,
    ) -> Result<(), ConnectorError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut request = self
            .http
            .post(self.config.table_url(table))
            .header(PREFER, prefer)
            .json(rows);
        if let Some(column) = conflict_column {
            request = request.query(&[("on_conflict", column)]);
        }

        let response = request.send().await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, ConnectorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ConnectorError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Total from a `Content-Range` value such as `0-24/3573` or `*/0`.
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl TableStore for RestClient {
    async fn clear(&self, table: &str, scope: &ScopeFilter) -> Result<(), ConnectorError> {
        debug!(table, scope = %scope, "Deleting rows");
        let response = self
            .http
            .delete(self.config.table_url(table))
            .header(PREFER, "return=minimal")
            .query(&[scope.to_query()])
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn insert(&self, table: &str, rows: &[RowData]) -> Result<(), ConnectorError> {
        self.post_rows(table, rows, "return=minimal", None).await
    }

    async fn upsert(
        &self,
        table: &str,
        rows: &[RowData],
        conflict_column: &str,
    ) -> Result<(), ConnectorError> {
        self.post_rows(
            table,
            rows,
            "resolution=merge-duplicates,return=minimal",
            Some(conflict_column),
        )
        .await
    }

    async fn row_count(&self, table: &str) -> Result<u64, ConnectorError> {
        let response = self
            .http
            .head(self.config.table_url(table))
            .header(PREFER, "count=exact")
            .query(&[("select", "*")])
            .send()
            .await?;
        let response = check_status(response).await?;

        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ConnectorError::Decode(format!("{table}: missing Content-Range")))?;

        parse_content_range(range)
            .ok_or_else(|| ConnectorError::Decode(format!("{table}: bad Content-Range '{range}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-24/*"), None);
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = RestClient::new(StoreConfig::new("ftp://example.com", "key")).err();
        assert!(matches!(err, Some(ConnectorError::InvalidUrl(_))));
    }
}
