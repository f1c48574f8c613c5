// ============================================================================
// In-Memory Configuration Store
// ============================================================================
//
// A fully functional store backed by shared process memory. Mutations
// stage inside the session and reach shared state only on commit, the
// lock is real mutual exclusion between sessions, and every externally
// observable operation is counted. Failure injection knobs make the
// store double as the test harness for the coordinator's contention and
// abort paths.
//
// ============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::{AuthorizationToken, ConfigStore, InterfaceInfo, StoreSession};
use crate::core::{RawRecord, Result};

/// Operation counters, snapshotted via [`MemoryStore::counters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounters {
    pub sessions_opened: usize,
    pub lock_attempts: usize,
    pub commits: usize,
    pub applies: usize,
}

#[derive(Default)]
struct SharedState {
    interfaces: Vec<InterfaceInfo>,
    records: HashMap<String, RawRecord>,
    lock_holder: Option<Uuid>,
    counters: StoreCounters,

    // Failure injection
    fail_lock_remaining: u32,
    fail_commit: bool,
    fail_apply: bool,
    missing_protocol: HashSet<String>,
    reject_writes: HashSet<String>,
}

/// Shared in-memory store. Cloning yields a handle to the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<SharedState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interface.
    pub fn add_interface(&self, info: InterfaceInfo) {
        let mut state = self.state.lock().unwrap();
        state.interfaces.push(info);
    }

    /// Register an enabled wired interface with just a name.
    pub fn add_named(&self, name: &str) {
        self.add_interface(InterfaceInfo {
            name: name.to_string(),
            bsd_name: None,
            raw_type: Some("Ethernet".to_string()),
            enabled: true,
        });
    }

    /// Seed the committed proxy record of an interface.
    pub fn set_record(&self, name: &str, record: RawRecord) {
        let mut state = self.state.lock().unwrap();
        state.records.insert(name.to_string(), record);
    }

    /// The committed record of an interface, for assertions.
    pub fn committed_record(&self, name: &str) -> Option<RawRecord> {
        self.state.lock().unwrap().records.get(name).cloned()
    }

    pub fn counters(&self) -> StoreCounters {
        self.state.lock().unwrap().counters
    }

    /// Make the next `n` lock attempts fail, simulating contention.
    pub fn fail_next_locks(&self, n: u32) {
        self.state.lock().unwrap().fail_lock_remaining = n;
    }

    /// Make every commit return `false`.
    pub fn fail_commits(&self, fail: bool) {
        self.state.lock().unwrap().fail_commit = fail;
    }

    /// Make every apply return `false`.
    pub fn fail_applies(&self, fail: bool) {
        self.state.lock().unwrap().fail_apply = fail;
    }

    /// Remove the proxies protocol entry of an interface.
    pub fn drop_protocol(&self, name: &str) {
        self.state.lock().unwrap().missing_protocol.insert(name.to_string());
    }

    /// Make record writes for an interface be rejected.
    pub fn reject_writes_for(&self, name: &str) {
        self.state.lock().unwrap().reject_writes.insert(name.to_string());
    }

    fn open(&self) -> MemorySession {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().counters.sessions_opened += 1;
        debug!(session = %id, "opened in-memory store session");
        MemorySession {
            state: Arc::clone(&self.state),
            id,
            staged: HashMap::new(),
            holds_lock: false,
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    type Session = MemorySession;

    async fn open_session(&self, _identity: &str) -> Result<Self::Session> {
        Ok(self.open())
    }

    async fn open_authorized_session(
        &self,
        _identity: &str,
        _auth: &AuthorizationToken,
    ) -> Result<Self::Session> {
        Ok(self.open())
    }
}

/// Session over [`MemoryStore`]; writes stage locally until commit.
pub struct MemorySession {
    state: Arc<Mutex<SharedState>>,
    id: Uuid,
    staged: HashMap<String, RawRecord>,
    holds_lock: bool,
}

#[async_trait]
impl StoreSession for MemorySession {
    type Interface = String;
    type ProxyHandle = String;

    async fn lock(&mut self, _wait: bool) -> Result<bool> {
        let mut state = self.state.lock()?;
        state.counters.lock_attempts += 1;

        if state.fail_lock_remaining > 0 {
            state.fail_lock_remaining -= 1;
            debug!(session = %self.id, "injected lock failure");
            return Ok(false);
        }
        match state.lock_holder {
            Some(holder) if holder != self.id => Ok(false),
            _ => {
                state.lock_holder = Some(self.id);
                self.holds_lock = true;
                Ok(true)
            }
        }
    }

    async fn unlock(&mut self) -> Result<()> {
        if self.holds_lock {
            let mut state = self.state.lock()?;
            state.lock_holder = None;
            self.holds_lock = false;
        }
        Ok(())
    }

    async fn resolve_interface(&mut self, name: &str) -> Result<Option<String>> {
        let state = self.state.lock()?;
        Ok(state
            .interfaces
            .iter()
            .find(|info| info.name == name)
            .map(|info| info.name.clone()))
    }

    async fn proxies_protocol(&mut self, interface: &String) -> Result<Option<String>> {
        let state = self.state.lock()?;
        if state.missing_protocol.contains(interface) {
            return Ok(None);
        }
        Ok(Some(interface.clone()))
    }

    async fn proxy_record(&mut self, handle: &String) -> Result<Option<RawRecord>> {
        if let Some(staged) = self.staged.get(handle) {
            return Ok(Some(staged.clone()));
        }
        let state = self.state.lock()?;
        Ok(state.records.get(handle).cloned())
    }

    async fn set_proxy_record(&mut self, handle: &String, record: RawRecord) -> Result<bool> {
        {
            let state = self.state.lock()?;
            if state.reject_writes.contains(handle) {
                return Ok(false);
            }
        }
        self.staged.insert(handle.clone(), record);
        Ok(true)
    }

    async fn commit(&mut self) -> Result<bool> {
        let mut state = self.state.lock()?;
        state.counters.commits += 1;
        if state.fail_commit {
            return Ok(false);
        }
        for (name, record) in self.staged.drain() {
            state.records.insert(name, record);
        }
        Ok(true)
    }

    async fn apply(&mut self) -> Result<bool> {
        let mut state = self.state.lock()?;
        state.counters.applies += 1;
        Ok(!state.fail_apply)
    }

    async fn list_interfaces(&mut self) -> Result<Vec<InterfaceInfo>> {
        let state = self.state.lock()?;
        Ok(state.interfaces.clone())
    }
}

impl Drop for MemorySession {
    // A dropped session must not wedge other writers.
    fn drop(&mut self) {
        if self.holds_lock
            && let Ok(mut state) = self.state.lock()
            && state.lock_holder == Some(self.id)
        {
            state.lock_holder = None;
        }
    }
}
