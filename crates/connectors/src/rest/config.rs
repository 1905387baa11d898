use std::{fmt, time::Duration};

#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn new(url: &str, api_key: &str) -> Self {
        StoreConfig {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}
