use serde::{Deserialize, Serialize};
use url::Url;

/// PAC (Proxy Auto-Configuration) settings: a script URL plus an
/// enabled flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacConfiguration {
    /// URL of the PAC script
    pub url: Url,

    /// Enable/disable state
    pub enabled: bool,
}

impl PacConfiguration {
    /// Create an enabled PAC configuration from an already-parsed URL.
    pub fn new(url: Url) -> Self {
        Self { url, enabled: true }
    }

    /// Parse a PAC configuration from a raw URL string.
    ///
    /// Returns `None` when the string is not a valid URL; an invalid
    /// stored URL means "no PAC configured", not a fatal error.
    pub fn from_url_str(raw: &str, enabled: bool) -> Option<Self> {
        Url::parse(raw).ok().map(|url| Self { url, enabled })
    }
}

impl std::fmt::Display for PacConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.enabled { "enabled" } else { "disabled" };
        write!(f, "{} ({})", self.url, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_valid_url_string() {
        let pac = PacConfiguration::from_url_str("http://example.com/proxy.pac", true)
            .expect("valid URL");
        assert_eq!(pac.url.as_str(), "http://example.com/proxy.pac");
        assert!(pac.enabled);
    }

    #[test]
    fn test_from_invalid_url_string_is_absent() {
        assert!(PacConfiguration::from_url_str("not a url", true).is_none());
        assert!(PacConfiguration::from_url_str("", false).is_none());
    }
}
