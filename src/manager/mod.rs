// ============================================================================
// Proxy Manager — transactional batch configuration coordinator
// ============================================================================
//
// One manager owns one store handle and serializes its own operations:
// concurrent calls on the same manager queue behind an internal mutex
// rather than race. Each write attempt is a full session lifecycle —
// open, lock, per-interface merge+write, commit, apply, unlock — and
// lock contention is the single condition the retry policy may re-run.
//
// Batch writes accumulate per-interface outcomes instead of stopping at
// the first failure: one bad interface never blocks the rest, and the
// caller gets the full picture in a BatchResult.
//
// ============================================================================

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::core::{ProxyError, Result};
use crate::model::{BatchResult, PacConfiguration, ProxyConfiguration, ProxyServer, RetryPolicy};
use crate::store::{AuthorizationToken, ConfigStore, InterfaceInfo, StoreSession};

/// Transactional proxy configuration manager.
///
/// Reads open plain sessions; writes open authorized sessions (when a
/// token is configured), take the store's exclusive lock, and commit and
/// apply exactly once per attempt. Configuration values passed in and
/// returned are caller-owned; the manager never caches them.
pub struct ProxyManager<S: ConfigStore> {
    store: S,
    identity: String,
    auth: RwLock<Option<AuthorizationToken>>,
    // Serializes public operations on this manager instance.
    ops: Mutex<()>,
}

impl<S: ConfigStore> ProxyManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            identity: "sysproxy".to_string(),
            auth: RwLock::new(None),
            ops: Mutex::new(()),
        }
    }

    /// Use a custom identity when opening store sessions.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Replace the instance-level authorization token used by writes.
    /// A per-call override always wins over this.
    pub async fn set_authorization(&self, token: Option<AuthorizationToken>) {
        *self.auth.write().await = token;
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Current proxy configuration of one interface.
    pub async fn get_configuration(&self, interface: &str) -> Result<ProxyConfiguration> {
        let _guard = self.ops.lock().await;
        let mut session = self.store.open_session(&self.identity).await?;
        self.read_one(&mut session, interface).await
    }

    /// Best-effort batch read over one session.
    ///
    /// Interfaces that cannot be resolved or have no proxy record are
    /// silently omitted; this is exploratory, unlike batch writes which
    /// report every failure.
    pub async fn get_configurations(
        &self,
        interfaces: &[String],
    ) -> Result<Vec<(String, ProxyConfiguration)>> {
        let _guard = self.ops.lock().await;
        let mut session = self.store.open_session(&self.identity).await?;

        let mut found = Vec::new();
        for name in interfaces {
            match self.read_one(&mut session, name).await {
                Ok(config) => found.push((name.clone(), config)),
                Err(ProxyError::InterfaceNotFound(_))
                | Err(ProxyError::ProtocolNotFound(_))
                | Err(ProxyError::ConfigNotFound(_)) => {
                    debug!(interface = %name, "skipping unresolved interface in batch read");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(found)
    }

    /// Names of every interface known to the store.
    pub async fn available_interfaces(&self) -> Result<Vec<String>> {
        Ok(self
            .interfaces_info()
            .await?
            .into_iter()
            .map(|info| info.name)
            .collect())
    }

    /// Detailed information for every interface known to the store.
    pub async fn interfaces_info(&self) -> Result<Vec<InterfaceInfo>> {
        let _guard = self.ops.lock().await;
        let mut session = self.store.open_session(&self.identity).await?;
        session.list_interfaces().await
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Write one interface's configuration with the standard retry
    /// policy and the instance-level authorization.
    pub async fn set_proxy(&self, interface: &str, config: &ProxyConfiguration) -> Result<()> {
        self.set_proxy_with(interface, config, RetryPolicy::standard(), None)
            .await
    }

    /// Write one interface's configuration.
    ///
    /// Runs as a single-element batch; if that one write fails, the
    /// underlying error is returned directly rather than wrapped in a
    /// batch-failure shape.
    pub async fn set_proxy_with(
        &self,
        interface: &str,
        config: &ProxyConfiguration,
        policy: RetryPolicy,
        auth: Option<AuthorizationToken>,
    ) -> Result<()> {
        let _guard = self.ops.lock().await;
        let entries = vec![(interface.to_string(), config.clone())];
        match self.write_batch_impl(&entries, policy, auth).await {
            Ok(_) => Ok(()),
            Err(ProxyError::BatchFailed { mut failures }) if failures.len() == 1 => {
                Err(failures.remove(0).1)
            }
            Err(other) => Err(other),
        }
    }

    /// Batch write with the standard retry policy and instance auth.
    pub async fn set_proxy_batch(
        &self,
        entries: &[(String, ProxyConfiguration)],
    ) -> Result<BatchResult> {
        self.set_proxy_batch_with(entries, RetryPolicy::standard(), None)
            .await
    }

    /// Write several interfaces' configurations in one lock/commit/apply
    /// cycle.
    ///
    /// Interfaces are processed in the order given; each failure is
    /// recorded without aborting the rest. When every interface fails
    /// the batch aborts with [`ProxyError::BatchFailed`] and nothing is
    /// committed. When commit or apply fails, no staged write has taken
    /// effect (staged records are session-local until commit), so the
    /// attempt's success bookkeeping is discarded along with the error.
    ///
    /// Lock contention retries per `policy`; the backoff sleep is a
    /// cooperative cancellation point, an in-flight commit/apply is not.
    pub async fn set_proxy_batch_with(
        &self,
        entries: &[(String, ProxyConfiguration)],
        policy: RetryPolicy,
        auth: Option<AuthorizationToken>,
    ) -> Result<BatchResult> {
        let _guard = self.ops.lock().await;
        self.write_batch_impl(entries, policy, auth).await
    }

    // ------------------------------------------------------------------
    // Convenience operations (read-modify-write over the primitives)
    // ------------------------------------------------------------------

    /// Disable every proxy mechanism on an interface.
    pub async fn disable_all_proxies(&self, interface: &str) -> Result<()> {
        let mut config = self.get_configuration(interface).await?;
        config.disable_all_proxies();
        self.set_proxy(interface, &config).await
    }

    /// Point HTTP and HTTPS traffic at the same proxy.
    pub async fn set_http_proxy(&self, host: &str, port: u16, interface: &str) -> Result<()> {
        let mut config = self.get_configuration(interface).await?;
        let proxy = ProxyServer::new(host, port);
        config.http_proxy = Some(proxy.clone());
        config.https_proxy = Some(proxy);
        self.set_proxy(interface, &config).await
    }

    /// Set the SOCKS proxy.
    pub async fn set_socks_proxy(&self, host: &str, port: u16, interface: &str) -> Result<()> {
        let mut config = self.get_configuration(interface).await?;
        config.socks_proxy = Some(ProxyServer::new(host, port));
        self.set_proxy(interface, &config).await
    }

    /// Enable PAC auto-configuration from a script URL.
    pub async fn set_pac_proxy(&self, url: url::Url, interface: &str) -> Result<()> {
        let mut config = self.get_configuration(interface).await?;
        config.auto_config_url = Some(PacConfiguration::new(url));
        self.set_proxy(interface, &config).await
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn read_one(
        &self,
        session: &mut S::Session,
        interface: &str,
    ) -> Result<ProxyConfiguration> {
        let handle = session
            .resolve_interface(interface)
            .await?
            .ok_or_else(|| ProxyError::InterfaceNotFound(interface.to_string()))?;
        let protocol = session
            .proxies_protocol(&handle)
            .await?
            .ok_or_else(|| ProxyError::ConfigNotFound(interface.to_string()))?;
        let record = session
            .proxy_record(&protocol)
            .await?
            .ok_or_else(|| ProxyError::ConfigNotFound(interface.to_string()))?;
        Ok(ProxyConfiguration::from_record(&record))
    }

    async fn write_batch_impl(
        &self,
        entries: &[(String, ProxyConfiguration)],
        policy: RetryPolicy,
        auth: Option<AuthorizationToken>,
    ) -> Result<BatchResult> {
        // Nothing to do: no session, no lock.
        if entries.is_empty() {
            return Ok(BatchResult::default());
        }

        let auth = match auth {
            Some(token) => Some(token),
            None => self.auth.read().await.clone(),
        };

        let mut last_error = ProxyError::LockFailed;
        for attempt in 0..=policy.max_retries {
            match self.attempt_batch(entries, auth.as_ref()).await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(attempt, "batch write succeeded after lock retries");
                    }
                    return Ok(result);
                }
                Err(err) if err.is_retryable() => {
                    last_error = err;
                    if attempt == policy.max_retries {
                        break;
                    }
                    let delay = policy.delay_for_attempt(attempt + 1);
                    debug!(attempt, ?delay, "store lock contended, backing off");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Err(ProxyError::RetryExhausted {
            last_error: last_error.to_string(),
        })
    }

    /// One full attempt: open, lock, apply the batch, commit+apply,
    /// unlock. The lock is released on every exit path.
    async fn attempt_batch(
        &self,
        entries: &[(String, ProxyConfiguration)],
        auth: Option<&AuthorizationToken>,
    ) -> Result<BatchResult> {
        let mut session = match auth {
            Some(token) => {
                self.store
                    .open_authorized_session(&self.identity, token)
                    .await?
            }
            None => self.store.open_session(&self.identity).await?,
        };

        if !session.lock(true).await? {
            return Err(ProxyError::LockFailed);
        }

        let outcome = self.apply_entries(&mut session, entries).await;

        // Single release point, the async equivalent of a deferred
        // unlock. A failed unlock is logged but never masks the
        // attempt's outcome.
        if let Err(err) = session.unlock().await {
            warn!(error = %err, "failed to unlock configuration store");
        }

        outcome
    }

    async fn apply_entries(
        &self,
        session: &mut S::Session,
        entries: &[(String, ProxyConfiguration)],
    ) -> Result<BatchResult> {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for (name, config) in entries {
            match self.apply_one(session, name, config).await {
                Ok(()) => succeeded.push(name.clone()),
                Err(err) => {
                    warn!(interface = %name, error = %err, "batch entry failed");
                    failed.push((name.clone(), err));
                }
            }
        }

        // Nothing succeeded: abort without committing so a fully failed
        // batch is distinguishable from an empty one.
        if succeeded.is_empty() {
            return Err(ProxyError::BatchFailed { failures: failed });
        }

        if !session.commit().await? {
            return Err(ProxyError::CommitFailed);
        }
        if !session.apply().await? {
            return Err(ProxyError::ApplyFailed);
        }

        info!(
            succeeded = succeeded.len(),
            failed = failed.len(),
            "batch write committed and applied"
        );
        Ok(BatchResult::new(succeeded, failed))
    }

    /// Resolve, merge and stage one interface's configuration.
    async fn apply_one(
        &self,
        session: &mut S::Session,
        interface: &str,
        config: &ProxyConfiguration,
    ) -> Result<()> {
        let handle = session
            .resolve_interface(interface)
            .await?
            .ok_or_else(|| ProxyError::InterfaceNotFound(interface.to_string()))?;
        let protocol = session
            .proxies_protocol(&handle)
            .await?
            .ok_or_else(|| ProxyError::ProtocolNotFound(interface.to_string()))?;

        // Merge over whatever is there so keys owned by other
        // subsystems survive a proxy-only update.
        let existing = session.proxy_record(&protocol).await?.unwrap_or_default();
        let merged = config.merge_into_record(&existing);

        if !session.set_proxy_record(&protocol, merged).await? {
            return Err(ProxyError::CommitFailed);
        }
        Ok(())
    }
}
