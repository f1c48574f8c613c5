// ============================================================================
// Raw Store Records
// ============================================================================
//
// The configuration store speaks loosely-typed key/value records. This
// module pins down the key names the proxy model owns and provides the
// tolerant accessors used when deserializing records written by other
// tools (which may encode booleans as 0/1 numbers or omit keys entirely).
//
// ============================================================================

use serde_json::{Map, Value};

/// Native representation of one interface's proxy record in the store.
pub type RawRecord = Map<String, Value>;

/// Record keys owned by the proxy model.
///
/// Writing a merged record must only ever touch these keys; everything
/// else in the record belongs to other subsystems and is preserved.
pub mod keys {
    // HTTP proxy
    pub const HTTP_ENABLE: &str = "HTTPEnable";
    pub const HTTP_PROXY: &str = "HTTPProxy";
    pub const HTTP_PORT: &str = "HTTPPort";

    // HTTPS proxy
    pub const HTTPS_ENABLE: &str = "HTTPSEnable";
    pub const HTTPS_PROXY: &str = "HTTPSProxy";
    pub const HTTPS_PORT: &str = "HTTPSPort";

    // SOCKS proxy
    pub const SOCKS_ENABLE: &str = "SOCKSEnable";
    pub const SOCKS_PROXY: &str = "SOCKSProxy";
    pub const SOCKS_PORT: &str = "SOCKSPort";

    // PAC (Proxy Auto-Configuration)
    pub const PROXY_AUTO_CONFIG_ENABLE: &str = "ProxyAutoConfigEnable";
    pub const PROXY_AUTO_CONFIG_URL: &str = "ProxyAutoConfigURLString";

    // Auto discovery (WPAD)
    pub const PROXY_AUTO_DISCOVERY_ENABLE: &str = "ProxyAutoDiscoveryEnable";

    // Bypass settings
    pub const EXCEPTIONS_LIST: &str = "ExceptionsList";
    pub const EXCLUDE_SIMPLE_HOSTNAMES: &str = "ExcludeSimpleHostnames";
}

/// Encode a boolean in the store's native 0/1 number form.
pub fn flag(value: bool) -> Value {
    Value::from(if value { 1 } else { 0 })
}

/// Read a boolean, accepting either a JSON bool or a 0/1 number.
/// Missing or mistyped keys read as `false`.
pub fn get_bool(record: &RawRecord, key: &str) -> bool {
    match record.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().map(|v| v != 0).unwrap_or(false),
        _ => false,
    }
}

/// Read an integer; missing or mistyped keys read as `None`.
pub fn get_int(record: &RawRecord, key: &str) -> Option<i64> {
    match record.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    }
}

/// Read a string; missing or mistyped keys read as `None`.
pub fn get_str<'a>(record: &'a RawRecord, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Read a string array, keeping only string elements in order.
/// Missing or mistyped keys read as empty.
pub fn get_str_array(record: &RawRecord, key: &str) -> Vec<String> {
    match record.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}
