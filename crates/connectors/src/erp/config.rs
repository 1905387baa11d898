use std::{fmt, time::Duration};

/// Where the ERP lives and which database to use.
#[derive(Debug, Clone)]
pub struct ErpConfig {
    pub url: String,
    pub database: String,
    pub timeout: Duration,
}

impl ErpConfig {
    pub fn new(url: &str, database: &str) -> Self {
        ErpConfig {
            url: url.trim_end_matches('/').to_string(),
            database: database.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/jsonrpc", self.url)
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
