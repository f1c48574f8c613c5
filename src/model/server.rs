use serde::{Deserialize, Serialize};

/// A single proxy server endpoint with optional authentication.
///
/// Host, port and credentials are fixed at construction; only the
/// enabled state may change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyServer {
    /// Hostname or IP address
    pub host: String,

    /// Port number
    pub port: u16,

    /// Enable/disable state
    pub enabled: bool,

    /// Authentication username (optional)
    pub username: Option<String>,

    /// Authentication password (optional; never written to the store)
    pub password: Option<String>,
}

impl ProxyServer {
    /// Create an enabled proxy server without authentication.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            enabled: true,
            username: None,
            password: None,
        }
    }

    /// Create a proxy server with an explicit enabled state.
    pub fn with_enabled(host: impl Into<String>, port: u16, enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::new(host, port)
        }
    }

    /// Attach authentication credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Whether both a username and a password are configured.
    pub fn has_authentication(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

impl std::fmt::Display for ProxyServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.enabled { "enabled" } else { "disabled" };
        let auth = if self.has_authentication() {
            " (authenticated)"
        } else {
            ""
        };
        write!(f, "{}:{}, {}{}", self.host, self.port, status, auth)
    }
}
