// ============================================================================
// sysproxy Library
// ============================================================================

//! Transactional management of per-interface system proxy settings.
//!
//! The [`ProxyManager`] coordinates sessions against an exclusively
//! lockable configuration store: it reads records, merges proxy
//! updates without disturbing unrelated keys, commits and applies once
//! per session, retries on lock contention, and reports per-interface
//! outcomes for batch writes.
//!
//! ```no_run
//! use sysproxy::{ProxyConfiguration, ProxyManager, ProxyServer, store::MemoryStore};
//!
//! # async fn demo() -> sysproxy::Result<()> {
//! let store = MemoryStore::new();
//! store.add_named("Wi-Fi");
//! let manager = ProxyManager::new(store);
//!
//! let mut config = ProxyConfiguration::empty();
//! config.http_proxy = Some(ProxyServer::new("127.0.0.1", 7890));
//! manager.set_proxy("Wi-Fi", &config).await?;
//!
//! let current = manager.get_configuration("Wi-Fi").await?;
//! assert!(current.has_manual_proxy_enabled());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod manager;
pub mod model;
pub mod store;

// Re-export main types for convenience
pub use crate::core::{ProxyError, Result};
pub use crate::manager::ProxyManager;
pub use crate::model::{BatchResult, PacConfiguration, ProxyConfiguration, ProxyServer, RetryPolicy};
pub use crate::store::{
    AuthorizationToken, ConfigStore, FileStore, InterfaceInfo, InterfaceType, MemoryStore,
    StoreSession,
};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Shared manager
// ============================================================================

use lazy_static::lazy_static;

lazy_static! {
    static ref SHARED: ProxyManager<FileStore> =
        ProxyManager::new(FileStore::at_default_location());
}

/// The process-wide manager over the store at the default location.
///
/// Purely a convenience; every API works just as well on an explicitly
/// constructed [`ProxyManager`], and the core never depends on this.
pub fn shared() -> &'static ProxyManager<FileStore> {
    &SHARED
}

/// Current proxy configuration of an interface, via the shared manager.
pub async fn current(interface: &str) -> Result<ProxyConfiguration> {
    shared().get_configuration(interface).await
}

/// Write an interface's configuration via the shared manager.
pub async fn set_proxy(config: &ProxyConfiguration, interface: &str) -> Result<()> {
    shared().set_proxy(interface, config).await
}

/// Names of all interfaces known to the default store.
pub async fn available_interfaces() -> Result<Vec<String>> {
    shared().available_interfaces().await
}

/// Disable every proxy mechanism on an interface, via the shared manager.
pub async fn disable_all_proxies(interface: &str) -> Result<()> {
    shared().disable_all_proxies(interface).await
}
