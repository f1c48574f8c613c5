// ============================================================================
// Configuration Store Boundary
// ============================================================================
//
// The manager talks to the system configuration store through these
// traits. A store hands out sessions; a session is an exclusively-owned
// handle supporting lock/unlock, per-interface record access, and a
// single commit + apply cycle. Two implementations ship with the crate:
// an in-memory store for tests and scratch work, and a JSON-file store
// backing the CLI.
//
// ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{RawRecord, Result};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Opaque privilege token for authorized (write) sessions.
///
/// Acquisition is the caller's concern; the store only forwards it.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationToken(String);

impl AuthorizationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthorizationToken {
    // The token is a secret; never let it leak through Debug output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthorizationToken(***)")
    }
}

/// A handle to the external configuration store.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    type Session: StoreSession;

    /// Open an unauthenticated session, suitable for reads.
    async fn open_session(&self, identity: &str) -> Result<Self::Session>;

    /// Open a session carrying a privilege token, required for writes
    /// against a privileged store.
    async fn open_authorized_session(
        &self,
        identity: &str,
        auth: &AuthorizationToken,
    ) -> Result<Self::Session>;
}

/// One session against the store.
///
/// Sessions are exclusively owned by a single operation. Mutations made
/// through `set_proxy_record` stay local to the session until `commit`;
/// `apply` pushes committed state to consumers. Locking is cooperative
/// mutual exclusion shared with other processes: `lock` returning
/// `false` signals contention, not corruption.
#[async_trait]
pub trait StoreSession: Send {
    type Interface: Send + Sync;
    type ProxyHandle: Send + Sync;

    /// Try to take the store's exclusive lock. Returns `false` when
    /// another writer holds it.
    async fn lock(&mut self, wait: bool) -> Result<bool>;

    /// Release the lock. Safe to call when not held.
    async fn unlock(&mut self) -> Result<()>;

    /// Resolve an interface by name.
    async fn resolve_interface(&mut self, name: &str) -> Result<Option<Self::Interface>>;

    /// Resolve the proxy-settings protocol entry of an interface.
    async fn proxies_protocol(
        &mut self,
        interface: &Self::Interface,
    ) -> Result<Option<Self::ProxyHandle>>;

    /// Fetch the current raw proxy record, if one exists.
    async fn proxy_record(&mut self, handle: &Self::ProxyHandle) -> Result<Option<RawRecord>>;

    /// Stage a new raw proxy record. Returns `false` when the store
    /// rejects the write.
    async fn set_proxy_record(
        &mut self,
        handle: &Self::ProxyHandle,
        record: RawRecord,
    ) -> Result<bool>;

    /// Persist every staged record. All-or-nothing for the session.
    async fn commit(&mut self) -> Result<bool>;

    /// Apply committed changes so consumers pick them up.
    async fn apply(&mut self) -> Result<bool>;

    /// Enumerate the interfaces known to the store.
    async fn list_interfaces(&mut self) -> Result<Vec<InterfaceInfo>>;
}

// ============================================================================
// Interface enumeration
// ============================================================================

/// Simplified interface type category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceType {
    /// Wi-Fi (IEEE 802.11)
    Wifi,
    /// Cellular/WWAN
    Cellular,
    /// Wired Ethernet (including USB and Thunderbolt Ethernet)
    WiredEthernet,
    /// Bridge/bond/VLAN interfaces
    Bridge,
    /// Loopback
    Loopback,
    /// VPN (PPP, IPSec, L2TP, ...)
    Vpn,
    /// Anything else (Bluetooth PAN, serial, ...)
    Other,
}

impl InterfaceType {
    /// Classify the store's raw interface-type string.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("IEEE80211") => Self::Wifi,
            Some("WWAN") => Self::Cellular,
            Some("Ethernet") | Some("FireWire") => Self::WiredEthernet,
            Some("Bond") | Some("Bridge") | Some("VLAN") => Self::Bridge,
            Some("Loopback") => Self::Loopback,
            Some("PPP") | Some("IPSec") | Some("L2TP") | Some("PPTP") | Some("6to4")
            | Some("VPN") => Self::Vpn,
            _ => Self::Other,
        }
    }

    /// Wi-Fi, cellular and wired Ethernet count as physical.
    pub fn is_physical(&self) -> bool {
        matches!(self, Self::Wifi | Self::Cellular | Self::WiredEthernet)
    }

    pub fn is_vpn(&self) -> bool {
        matches!(self, Self::Vpn)
    }
}

impl std::fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Wifi => "wifi",
            Self::Cellular => "cellular",
            Self::WiredEthernet => "wired-ethernet",
            Self::Bridge => "bridge",
            Self::Loopback => "loopback",
            Self::Vpn => "vpn",
            Self::Other => "other",
        };
        write!(f, "{label}")
    }
}

/// Descriptive information about one network interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    /// Interface (service) name, e.g. "Wi-Fi"
    pub name: String,

    /// BSD device name, e.g. "en0"
    pub bsd_name: Option<String>,

    /// Raw interface type string as stored
    pub raw_type: Option<String>,

    /// Whether the interface is enabled
    pub enabled: bool,
}

impl InterfaceInfo {
    pub fn interface_type(&self) -> InterfaceType {
        InterfaceType::from_raw(self.raw_type.as_deref())
    }
}
