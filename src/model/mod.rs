// ============================================================================
// Proxy Settings Model
// ============================================================================
//
// Pure value types: the per-interface configuration aggregate, its
// building blocks, the retry schedule, and the batch outcome. Nothing
// in here touches the store.
//
// ============================================================================

pub mod batch;
pub mod config;
pub mod pac;
pub mod retry;
pub mod server;

pub use batch::BatchResult;
pub use config::ProxyConfiguration;
pub use pac::PacConfiguration;
pub use retry::RetryPolicy;
pub use server::ProxyServer;
