// ============================================================================
// Proxy Configuration Model
// ============================================================================
//
// The aggregate proxy settings for one network interface, plus the
// mapping to and from the store's raw record shape. The mapping is
// deliberately asymmetric:
//
// - Deserialization never fails: missing or mistyped keys fall back to
//   absent/false/empty, so a record written by any tool can be read.
// - Serialization of an absent proxy writes only `<proto>Enable: 0`,
//   omitting host/port so a stale pair can never be re-activated.
// - merge_into_record overlays only the keys the proxy model owns,
//   preserving unrelated configuration colocated in the same record.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{PacConfiguration, ProxyServer};
use crate::core::record::{self, RawRecord, keys};

/// Complete proxy configuration for one network interface.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProxyConfiguration {
    /// Auto-discover proxy (WPAD)
    pub auto_discovery_enabled: bool,

    /// Automatic proxy configuration (PAC)
    pub auto_config_url: Option<PacConfiguration>,

    /// Web proxy (HTTP)
    pub http_proxy: Option<ProxyServer>,

    /// Secure web proxy (HTTPS)
    pub https_proxy: Option<ProxyServer>,

    /// SOCKS proxy
    pub socks_proxy: Option<ProxyServer>,

    /// Exclude simple hostnames from proxying
    pub exclude_simple_hostnames: bool,

    /// Bypass proxy for these hosts and domains, order preserved verbatim
    pub exception_list: Vec<String>,
}

impl ProxyConfiguration {
    /// An empty configuration with every proxy absent.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether any manual proxy (HTTP/HTTPS/SOCKS) is present and enabled.
    pub fn has_manual_proxy_enabled(&self) -> bool {
        [&self.http_proxy, &self.https_proxy, &self.socks_proxy]
            .into_iter()
            .any(|proxy| proxy.as_ref().is_some_and(|p| p.enabled))
    }

    /// Whether WPAD or an enabled PAC configuration is active.
    pub fn has_auto_proxy_enabled(&self) -> bool {
        self.auto_discovery_enabled
            || self.auto_config_url.as_ref().is_some_and(|pac| pac.enabled)
    }

    /// Whether any proxy mechanism is enabled at all.
    pub fn has_any_proxy_enabled(&self) -> bool {
        self.has_manual_proxy_enabled() || self.has_auto_proxy_enabled()
    }

    /// Disable every proxy mechanism in place.
    ///
    /// Present proxies and PAC entries keep their host/port/URL and are
    /// flipped to disabled; calling this twice is the same as once.
    pub fn disable_all_proxies(&mut self) {
        self.auto_discovery_enabled = false;
        if let Some(pac) = self.auto_config_url.as_mut() {
            pac.enabled = false;
        }
        for proxy in [
            self.http_proxy.as_mut(),
            self.https_proxy.as_mut(),
            self.socks_proxy.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            proxy.enabled = false;
        }
    }
}

// ============================================================================
// Record mapping
// ============================================================================

/// One manual proxy's key triple in the raw record.
struct ProtoKeys {
    enable: &'static str,
    host: &'static str,
    port: &'static str,
}

const HTTP_KEYS: ProtoKeys = ProtoKeys {
    enable: keys::HTTP_ENABLE,
    host: keys::HTTP_PROXY,
    port: keys::HTTP_PORT,
};
const HTTPS_KEYS: ProtoKeys = ProtoKeys {
    enable: keys::HTTPS_ENABLE,
    host: keys::HTTPS_PROXY,
    port: keys::HTTPS_PORT,
};
const SOCKS_KEYS: ProtoKeys = ProtoKeys {
    enable: keys::SOCKS_ENABLE,
    host: keys::SOCKS_PROXY,
    port: keys::SOCKS_PORT,
};

fn read_server(rec: &RawRecord, proto: &ProtoKeys) -> Option<ProxyServer> {
    let enabled = record::get_bool(rec, proto.enable);
    let host = record::get_str(rec, proto.host)?;
    let port = record::get_int(rec, proto.port)?;
    let port = u16::try_from(port).ok()?;
    Some(ProxyServer::with_enabled(host, port, enabled))
}

fn write_server(rec: &mut RawRecord, proto: &ProtoKeys, server: Option<&ProxyServer>) {
    match server {
        Some(server) => {
            rec.insert(proto.enable.into(), record::flag(server.enabled));
            rec.insert(proto.host.into(), Value::from(server.host.clone()));
            rec.insert(proto.port.into(), Value::from(server.port));
        }
        // Only the disable flag: leaving host/port out means a later
        // reader cannot mistake a stale pair for an active proxy.
        None => {
            rec.insert(proto.enable.into(), record::flag(false));
        }
    }
}

impl ProxyConfiguration {
    /// Deserialize a raw store record. Never fails; unknown shapes
    /// degrade to the field's absent/false/empty default.
    pub fn from_record(rec: &RawRecord) -> Self {
        let pac_enabled = record::get_bool(rec, keys::PROXY_AUTO_CONFIG_ENABLE);
        let auto_config_url = record::get_str(rec, keys::PROXY_AUTO_CONFIG_URL)
            .and_then(|raw| PacConfiguration::from_url_str(raw, pac_enabled));

        Self {
            auto_discovery_enabled: record::get_bool(rec, keys::PROXY_AUTO_DISCOVERY_ENABLE),
            auto_config_url,
            http_proxy: read_server(rec, &HTTP_KEYS),
            https_proxy: read_server(rec, &HTTPS_KEYS),
            socks_proxy: read_server(rec, &SOCKS_KEYS),
            exclude_simple_hostnames: record::get_bool(rec, keys::EXCLUDE_SIMPLE_HOSTNAMES),
            exception_list: record::get_str_array(rec, keys::EXCEPTIONS_LIST),
        }
    }

    /// Serialize into the raw record shape the store expects.
    ///
    /// Credentials are never written; they do not live in the store
    /// record. The exception list is omitted entirely when empty.
    pub fn to_record(&self) -> RawRecord {
        let mut rec = RawRecord::new();

        rec.insert(
            keys::PROXY_AUTO_DISCOVERY_ENABLE.into(),
            record::flag(self.auto_discovery_enabled),
        );

        match &self.auto_config_url {
            Some(pac) => {
                rec.insert(keys::PROXY_AUTO_CONFIG_ENABLE.into(), record::flag(pac.enabled));
                rec.insert(
                    keys::PROXY_AUTO_CONFIG_URL.into(),
                    Value::from(pac.url.as_str()),
                );
            }
            None => {
                rec.insert(keys::PROXY_AUTO_CONFIG_ENABLE.into(), record::flag(false));
            }
        }

        write_server(&mut rec, &HTTP_KEYS, self.http_proxy.as_ref());
        write_server(&mut rec, &HTTPS_KEYS, self.https_proxy.as_ref());
        write_server(&mut rec, &SOCKS_KEYS, self.socks_proxy.as_ref());

        rec.insert(
            keys::EXCLUDE_SIMPLE_HOSTNAMES.into(),
            record::flag(self.exclude_simple_hostnames),
        );
        if !self.exception_list.is_empty() {
            rec.insert(
                keys::EXCEPTIONS_LIST.into(),
                Value::from(self.exception_list.clone()),
            );
        }

        rec
    }

    /// Overlay this configuration's record onto a copy of `existing`.
    ///
    /// Keys the proxy model does not own pass through untouched, so a
    /// proxy-only update cannot destroy unrelated settings stored in
    /// the same record. Pure: neither input is mutated.
    pub fn merge_into_record(&self, existing: &RawRecord) -> RawRecord {
        let mut merged = existing.clone();
        for (key, value) in self.to_record() {
            merged.insert(key, value);
        }
        merged
    }
}

impl std::fmt::Display for ProxyConfiguration {
    /// Lists only the enabled mechanisms, the way a settings pane would.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        if self.auto_discovery_enabled {
            parts.push("WPAD: enabled".to_string());
        }
        if let Some(pac) = &self.auto_config_url
            && pac.enabled
        {
            parts.push(format!("PAC: {}", pac.url));
        }
        for (label, proxy) in [
            ("HTTP", &self.http_proxy),
            ("HTTPS", &self.https_proxy),
            ("SOCKS", &self.socks_proxy),
        ] {
            if let Some(proxy) = proxy
                && proxy.enabled
            {
                parts.push(format!("{label}: {}:{}", proxy.host, proxy.port));
            }
        }

        if parts.is_empty() {
            write!(f, "no proxy enabled")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_record(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_record_with_all_fields() {
        let rec = as_record(json!({
            "ProxyAutoDiscoveryEnable": 1,
            "ProxyAutoConfigEnable": 1,
            "ProxyAutoConfigURLString": "http://example.com/proxy.pac",
            "HTTPEnable": 1,
            "HTTPProxy": "127.0.0.1",
            "HTTPPort": 7890,
            "SOCKSEnable": 0,
            "SOCKSProxy": "127.0.0.1",
            "SOCKSPort": 1080,
            "ExcludeSimpleHostnames": 1,
            "ExceptionsList": ["localhost", "*.local"],
        }));

        let config = ProxyConfiguration::from_record(&rec);
        assert!(config.auto_discovery_enabled);
        assert_eq!(
            config.auto_config_url.as_ref().unwrap().url.as_str(),
            "http://example.com/proxy.pac"
        );
        let http = config.http_proxy.as_ref().unwrap();
        assert_eq!(http.host, "127.0.0.1");
        assert_eq!(http.port, 7890);
        assert!(http.enabled);
        let socks = config.socks_proxy.as_ref().unwrap();
        assert!(!socks.enabled);
        assert!(config.https_proxy.is_none());
        assert!(config.exclude_simple_hostnames);
        assert_eq!(config.exception_list, vec!["localhost", "*.local"]);
    }

    #[test]
    fn test_from_record_never_fails_on_garbage() {
        let rec = as_record(json!({
            "HTTPEnable": "yes",
            "HTTPProxy": 42,
            "HTTPPort": "7890",
            "ExceptionsList": "not-an-array",
        }));
        let config = ProxyConfiguration::from_record(&rec);
        assert!(config.http_proxy.is_none());
        assert!(config.exception_list.is_empty());
        assert!(!config.auto_discovery_enabled);
    }

    #[test]
    fn test_host_without_port_reads_as_absent() {
        let rec = as_record(json!({"HTTPEnable": 1, "HTTPProxy": "127.0.0.1"}));
        assert!(ProxyConfiguration::from_record(&rec).http_proxy.is_none());
    }

    #[test]
    fn test_absent_proxy_serializes_disable_flag_only() {
        let rec = ProxyConfiguration::empty().to_record();
        assert_eq!(rec.get("HTTPEnable"), Some(&json!(0)));
        assert!(!rec.contains_key("HTTPProxy"));
        assert!(!rec.contains_key("HTTPPort"));
        assert!(!rec.contains_key("ExceptionsList"));
        assert_eq!(rec.get("ProxyAutoConfigEnable"), Some(&json!(0)));
    }

    #[test]
    fn test_merge_preserves_foreign_keys() {
        let existing = as_record(json!({
            "DNSServers": ["1.1.1.1", "8.8.8.8"],
            "SomeVendorKey": {"nested": true},
            "HTTPEnable": 1,
            "HTTPProxy": "old.example.com",
            "HTTPPort": 9999,
        }));

        let mut config = ProxyConfiguration::empty();
        config.socks_proxy = Some(ProxyServer::new("127.0.0.1", 1080));
        let merged = config.merge_into_record(&existing);

        // Foreign keys untouched
        assert_eq!(merged.get("DNSServers"), existing.get("DNSServers"));
        assert_eq!(merged.get("SomeVendorKey"), existing.get("SomeVendorKey"));
        // Owned keys overwritten: absent HTTP proxy disables and drops host/port
        assert_eq!(merged.get("HTTPEnable"), Some(&json!(0)));
        assert_eq!(merged.get("SOCKSProxy"), Some(&json!("127.0.0.1")));
        // Inputs not mutated
        assert_eq!(existing.get("HTTPEnable"), Some(&json!(1)));
    }

    #[test]
    fn test_round_trip_reproduces_every_field() {
        let mut config = ProxyConfiguration::empty();
        config.auto_discovery_enabled = true;
        config.auto_config_url =
            PacConfiguration::from_url_str("http://pac.example.com/p.pac", false);
        config.http_proxy = Some(ProxyServer::new("h1", 8080));
        config.https_proxy = Some(ProxyServer::with_enabled("h2", 8443, false));
        config.socks_proxy = Some(ProxyServer::new("h3", 1080));
        config.exclude_simple_hostnames = true;
        config.exception_list = vec!["b.example.com".into(), "a.example.com".into()];

        let round_tripped = ProxyConfiguration::from_record(&config.to_record());
        assert_eq!(round_tripped, config);
    }

    #[test]
    fn test_disable_all_is_idempotent() {
        let mut config = ProxyConfiguration::empty();
        config.auto_discovery_enabled = true;
        config.http_proxy = Some(ProxyServer::new("h", 8080));
        config.auto_config_url = PacConfiguration::from_url_str("http://p/p.pac", true);

        config.disable_all_proxies();
        let once = config.clone();
        config.disable_all_proxies();

        assert_eq!(config, once);
        assert!(!config.has_any_proxy_enabled());
        // Host/port survive the disable
        assert_eq!(config.http_proxy.as_ref().unwrap().host, "h");
    }

    #[test]
    fn test_derived_flags() {
        let mut config = ProxyConfiguration::empty();
        assert!(!config.has_any_proxy_enabled());

        config.socks_proxy = Some(ProxyServer::with_enabled("h", 1080, false));
        assert!(!config.has_manual_proxy_enabled());

        config.socks_proxy.as_mut().unwrap().enabled = true;
        assert!(config.has_manual_proxy_enabled());
        assert!(!config.has_auto_proxy_enabled());

        config.auto_discovery_enabled = true;
        assert!(config.has_auto_proxy_enabled());
    }
}
