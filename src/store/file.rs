// ============================================================================
// File-Backed Configuration Store
// ============================================================================
//
// Durable store for the CLI: one JSON state file holding every
// interface entry, an exclusive lock file for cross-process mutual
// exclusion, and atomic temp-file replacement on commit so readers
// never observe a half-written state.
//
// Lock protocol: creating the lock file with create_new is the
// acquisition; EEXIST means another process holds it (contention, the
// retryable condition). The lock file is removed on unlock and, as a
// backstop, when the session is dropped.
//
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AuthorizationToken, ConfigStore, InterfaceInfo, StoreSession};
use crate::core::{ProxyError, RawRecord, Result};

/// Environment variable overriding the default state file location.
pub const STORE_ENV: &str = "SYSPROXY_STORE";

const DEFAULT_STORE_PATH: &str = "/var/lib/sysproxy/state.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InterfaceEntry {
    bsd_name: Option<String>,
    raw_type: Option<String>,
    enabled: bool,
    /// Proxy record; `None` when the interface has no proxy entry yet.
    proxies: Option<RawRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    generation: u64,
    applied_generation: u64,
    applied_at: Option<DateTime<Utc>>,
    interfaces: BTreeMap<String, InterfaceEntry>,
}

/// JSON-file configuration store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location (`SYSPROXY_STORE` env override,
    /// otherwise the system path).
    pub fn at_default_location() -> Self {
        let path = std::env::var(STORE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Add an interface entry to the state file, outside any session.
    ///
    /// Provisioning helper: the real system populates interfaces by
    /// itself, a file store needs them registered once.
    pub fn register_interface(&self, info: &InterfaceInfo) -> Result<()> {
        let mut state = load_state(&self.path)?;
        state
            .interfaces
            .entry(info.name.clone())
            .or_insert_with(|| InterfaceEntry {
                bsd_name: info.bsd_name.clone(),
                raw_type: info.raw_type.clone(),
                enabled: info.enabled,
                // A fresh interface carries an empty proxy record, the
                // way the system store attaches an empty proxies
                // protocol to every service.
                proxies: Some(RawRecord::new()),
            });
        save_state(&self.path, &state)
    }

    fn open(&self) -> Result<FileSession> {
        let state = load_state(&self.path)?;
        let id = Uuid::new_v4();
        debug!(session = %id, path = %self.path.display(), "opened file store session");
        Ok(FileSession {
            path: self.path.clone(),
            lock_path: self.lock_path(),
            id,
            state,
            holds_lock: false,
        })
    }
}

fn load_state(path: &Path) -> Result<StoreState> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|_| ProxyError::SessionCreationFailed),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(StoreState::default()),
        Err(err) => Err(ProxyError::Io(err.to_string())),
    }
}

fn save_state(path: &Path, state: &StoreState) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir)?;
    }
    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new()?,
    };
    let bytes = serde_json::to_vec_pretty(state)
        .map_err(|err| ProxyError::Unknown(err.to_string()))?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|err| ProxyError::Io(err.to_string()))?;
    Ok(())
}

#[async_trait]
impl ConfigStore for FileStore {
    type Session = FileSession;

    async fn open_session(&self, _identity: &str) -> Result<Self::Session> {
        self.open()
    }

    async fn open_authorized_session(
        &self,
        _identity: &str,
        _auth: &AuthorizationToken,
    ) -> Result<Self::Session> {
        self.open()
    }
}

/// Session over [`FileStore`]; mutations live in the session's state
/// snapshot until commit replaces the file atomically.
pub struct FileSession {
    path: PathBuf,
    lock_path: PathBuf,
    id: Uuid,
    state: StoreState,
    holds_lock: bool,
}

#[async_trait]
impl StoreSession for FileSession {
    type Interface = String;
    type ProxyHandle = String;

    async fn lock(&mut self, _wait: bool) -> Result<bool> {
        if let Some(dir) = self.lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
        {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", self.id);
                self.holds_lock = true;
                // The snapshot taken at open may predate another
                // writer's commit; re-read now that we are exclusive.
                self.state = load_state(&self.path)?;
                debug!(session = %self.id, "acquired store lock");
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                debug!(session = %self.id, "store lock contended");
                Ok(false)
            }
            Err(err) => Err(ProxyError::Io(err.to_string())),
        }
    }

    async fn unlock(&mut self) -> Result<()> {
        if !self.holds_lock {
            return Ok(());
        }
        self.holds_lock = false;
        match fs::remove_file(&self.lock_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => {
                warn!(session = %self.id, error = %err, "failed to remove lock file");
                Err(ProxyError::UnlockFailed)
            }
        }
    }

    async fn resolve_interface(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self.state.interfaces.contains_key(name).then(|| name.to_string()))
    }

    async fn proxies_protocol(&mut self, interface: &String) -> Result<Option<String>> {
        Ok(self
            .state
            .interfaces
            .contains_key(interface)
            .then(|| interface.clone()))
    }

    async fn proxy_record(&mut self, handle: &String) -> Result<Option<RawRecord>> {
        Ok(self
            .state
            .interfaces
            .get(handle)
            .and_then(|entry| entry.proxies.clone()))
    }

    async fn set_proxy_record(&mut self, handle: &String, record: RawRecord) -> Result<bool> {
        match self.state.interfaces.get_mut(handle) {
            Some(entry) => {
                entry.proxies = Some(record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit(&mut self) -> Result<bool> {
        self.state.generation += 1;
        save_state(&self.path, &self.state)?;
        debug!(session = %self.id, generation = self.state.generation, "committed store state");
        Ok(true)
    }

    async fn apply(&mut self) -> Result<bool> {
        self.state.applied_generation = self.state.generation;
        self.state.applied_at = Some(Utc::now());
        save_state(&self.path, &self.state)?;
        Ok(true)
    }

    async fn list_interfaces(&mut self) -> Result<Vec<InterfaceInfo>> {
        Ok(self
            .state
            .interfaces
            .iter()
            .map(|(name, entry)| InterfaceInfo {
                name: name.clone(),
                bsd_name: entry.bsd_name.clone(),
                raw_type: entry.raw_type.clone(),
                enabled: entry.enabled,
            })
            .collect())
    }
}

impl Drop for FileSession {
    // Never leave a dangling lock file behind.
    fn drop(&mut self) {
        if self.holds_lock {
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wifi() -> InterfaceInfo {
        InterfaceInfo {
            name: "Wi-Fi".into(),
            bsd_name: Some("en0".into()),
            raw_type: Some("IEEE80211".into()),
            enabled: true,
        }
    }

    #[tokio::test]
    async fn test_missing_state_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state.json"));
        let mut session = store.open_session("test").await.unwrap();
        assert!(session.list_interfaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state.json"));
        store.register_interface(&wifi()).unwrap();

        let mut session = store.open_session("test").await.unwrap();
        let interfaces = session.list_interfaces().await.unwrap();
        assert_eq!(interfaces.len(), 1);
        assert_eq!(interfaces[0].name, "Wi-Fi");
        assert_eq!(interfaces[0].bsd_name.as_deref(), Some("en0"));
    }

    #[tokio::test]
    async fn test_lock_file_blocks_second_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state.json"));

        let mut first = store.open_session("a").await.unwrap();
        let mut second = store.open_session("b").await.unwrap();

        assert!(first.lock(true).await.unwrap());
        assert!(!second.lock(true).await.unwrap());

        first.unlock().await.unwrap();
        assert!(second.lock(true).await.unwrap());
        second.unlock().await.unwrap();
    }

    #[tokio::test]
    async fn test_drop_removes_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state.json"));
        {
            let mut session = store.open_session("a").await.unwrap();
            assert!(session.lock(true).await.unwrap());
        }
        let mut next = store.open_session("b").await.unwrap();
        assert!(next.lock(true).await.unwrap());
        next.unlock().await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_is_durable_and_apply_stamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FileStore::new(&path);
        store.register_interface(&wifi()).unwrap();

        let mut session = store.open_session("a").await.unwrap();
        assert!(session.lock(true).await.unwrap());
        let record = serde_json::json!({"HTTPEnable": 1})
            .as_object()
            .cloned()
            .unwrap();
        assert!(
            session
                .set_proxy_record(&"Wi-Fi".to_string(), record)
                .await
                .unwrap()
        );
        assert!(session.commit().await.unwrap());
        assert!(session.apply().await.unwrap());
        session.unlock().await.unwrap();

        let mut reader = store.open_session("b").await.unwrap();
        let stored = reader
            .proxy_record(&"Wi-Fi".to_string())
            .await
            .unwrap()
            .expect("record persisted");
        assert_eq!(stored.get("HTTPEnable"), Some(&serde_json::json!(1)));

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["generation"], raw["applied_generation"]);
        assert!(raw["applied_at"].is_string());
    }

    #[tokio::test]
    async fn test_lock_rereads_state_committed_after_open() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state.json"));
        store.register_interface(&wifi()).unwrap();

        // Open before the other writer commits
        let mut late = store.open_session("late").await.unwrap();

        let mut writer = store.open_session("writer").await.unwrap();
        assert!(writer.lock(true).await.unwrap());
        let record = serde_json::json!({"SOCKSEnable": 1})
            .as_object()
            .cloned()
            .unwrap();
        writer
            .set_proxy_record(&"Wi-Fi".to_string(), record)
            .await
            .unwrap();
        writer.commit().await.unwrap();
        writer.unlock().await.unwrap();

        // The stale session sees the fresh state once it holds the lock
        assert!(late.lock(true).await.unwrap());
        assert!(
            late.proxy_record(&"Wi-Fi".to_string())
                .await
                .unwrap()
                .is_some()
        );
        late.unlock().await.unwrap();
    }
}
