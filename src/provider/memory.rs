//! In-process session provider
//!
//! Sessions live in a map guarded by one reader/writer lock; each store
//! guards its own values with a second lock, so sessions never contend
//! with each other. Lock order is always registry first, then store.
//!
//! Nothing survives a restart and nothing is shared between processes.
//! Expiry is advisory: stores record when they expire, but entries are
//! only evicted by [`MemoryProvider::destroy`] or an explicit
//! [`MemoryProvider::purge_expired`].

use crate::id::redact;
use crate::provider::traits::{Provider, Store, StoreRef};
use crate::value::Value;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

static MEMORY_PROVIDER: LazyLock<Arc<MemoryProvider>> =
    LazyLock::new(|| Arc::new(MemoryProvider::new()));

/// The process-wide memory provider, registered as `"memory"`
pub fn memory_provider() -> Arc<MemoryProvider> {
    Arc::clone(&MEMORY_PROVIDER)
}

/// Values and bookkeeping for one session
#[derive(Debug)]
struct StoreState {
    sid: String,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
    max_age: i64,
    values: HashMap<String, Value>,
}

/// Store backed by a `HashMap` in process memory
#[derive(Debug)]
pub struct MemorySessionStore {
    state: RwLock<StoreState>,
}

impl MemorySessionStore {
    fn new(sid: &str, max_age: i64) -> Self {
        let now = Utc::now();
        Self {
            state: RwLock::new(StoreState {
                sid: sid.to_string(),
                created_at: now,
                last_accessed_at: now,
                max_age,
                values: HashMap::new(),
            }),
        }
    }

    /// When the store was initialized
    pub async fn created_at(&self) -> DateTime<Utc> {
        self.state.read().await.created_at
    }

    /// Last time a read or regeneration touched the store
    pub async fn last_accessed_at(&self) -> DateTime<Utc> {
        self.state.read().await.last_accessed_at
    }

    /// Lifetime in seconds recorded at initialization
    pub async fn max_age(&self) -> i64 {
        self.state.read().await.max_age
    }

    /// Last access plus max age
    pub async fn expires_at(&self) -> DateTime<Utc> {
        let state = self.state.read().await;
        Duration::try_seconds(state.max_age)
            .and_then(|age| state.last_accessed_at.checked_add_signed(age))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the advisory expiry time has passed
    pub async fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at().await
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.state.read().await.values.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.values.is_empty()
    }

    async fn touch(&self) {
        self.state.write().await.last_accessed_at = Utc::now();
    }

    async fn rebind(&self, sid: &str) {
        self.state.write().await.sid = sid.to_string();
    }
}

#[async_trait]
impl Store for MemorySessionStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.state.read().await.values.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) {
        self.state.write().await.values.insert(key.to_string(), value);
    }

    async fn remove(&self, key: &str) {
        self.state.write().await.values.remove(key);
    }

    async fn clear(&self) {
        self.state.write().await.values.clear();
    }

    async fn id(&self) -> String {
        self.state.read().await.sid.clone()
    }
}

/// Id-to-store map plus the most recently initialized max age
#[derive(Debug, Default)]
struct Registry {
    max_age: i64,
    sessions: HashMap<String, Arc<MemorySessionStore>>,
}

/// Provider keeping every session in process memory
///
/// `read` and `regenerate` spawn their access-time refresh on the current
/// Tokio runtime, so they must be called from within one.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    registry: Arc<RwLock<Registry>>,
}

impl MemoryProvider {
    /// Create an empty provider.
    ///
    /// Most applications use the shared [`memory_provider`] instead; a
    /// separate instance has its own id namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the last-access time of `sid` if it still exists
    pub async fn update(&self, sid: &str) {
        touch_session(&self.registry, sid).await;
    }

    /// Look up a store without refreshing it
    pub async fn store(&self, sid: &str) -> Option<Arc<MemorySessionStore>> {
        self.registry.read().await.sessions.get(sid).cloned()
    }

    /// Last-access time of `sid`, if it exists
    pub async fn last_accessed_at(&self, sid: &str) -> Option<DateTime<Utc>> {
        match self.store(sid).await {
            Some(store) => Some(store.last_accessed_at().await),
            None => None,
        }
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.registry.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.read().await.sessions.is_empty()
    }

    /// Destroy every session whose advisory expiry has passed.
    /// Returns the number of sessions removed.
    pub async fn purge_expired(&self) -> usize {
        let mut registry = self.registry.write().await;

        let mut expired = Vec::new();
        for (sid, store) in &registry.sessions {
            if store.is_expired().await {
                expired.push(sid.clone());
            }
        }

        for sid in &expired {
            registry.sessions.remove(sid);
            debug!("Purged expired session: {}", redact(sid));
        }

        if !expired.is_empty() {
            info!("Purged {} expired sessions", expired.len());
        }
        expired.len()
    }

    // Best effort: the task may run after the session is gone, or not at
    // all if the runtime shuts down first. Only advisory metadata changes.
    fn schedule_update(&self, sid: String) {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            touch_session(&registry, &sid).await;
        });
    }

    async fn create(&self, sid: &str, max_age: i64) -> Arc<MemorySessionStore> {
        let store = Arc::new(MemorySessionStore::new(sid, max_age));

        let mut registry = self.registry.write().await;
        registry.max_age = max_age;
        let replaced = registry
            .sessions
            .insert(sid.to_string(), Arc::clone(&store))
            .is_some();
        drop(registry);

        if replaced {
            info!("Reinitialized session: {}", redact(sid));
        } else {
            info!("Created session: {}", redact(sid));
        }
        store
    }
}

async fn touch_session(registry: &RwLock<Registry>, sid: &str) {
    let registry = registry.write().await;
    match registry.sessions.get(sid) {
        Some(store) => {
            store.touch().await;
            debug!("Refreshed session access time: {}", redact(sid));
        }
        None => debug!("Skipped refresh for departed session: {}", redact(sid)),
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    async fn read(&self, sid: &str, max_age: i64) -> StoreRef {
        let found = self.registry.read().await.sessions.get(sid).cloned();

        match found {
            Some(store) => {
                debug!("Resumed session: {}", redact(sid));
                self.schedule_update(sid.to_string());
                store
            }
            None => {
                warn!("Unknown session id {}, starting a new session", redact(sid));
                self.create(sid, max_age).await
            }
        }
    }

    async fn initialize(&self, sid: &str, max_age: i64) -> StoreRef {
        self.create(sid, max_age).await
    }

    async fn exists(&self, sid: &str) -> bool {
        self.registry.read().await.sessions.contains_key(sid)
    }

    async fn regenerate(&self, old_sid: &str, new_sid: &str) -> StoreRef {
        let mut registry = self.registry.write().await;

        match registry.sessions.remove(old_sid) {
            Some(store) => {
                // Rename and re-key under the same exclusive lock
                store.rebind(new_sid).await;
                registry
                    .sessions
                    .insert(new_sid.to_string(), Arc::clone(&store));
                drop(registry);

                info!(
                    "Regenerated session {} as {}",
                    redact(old_sid),
                    redact(new_sid)
                );
                self.schedule_update(new_sid.to_string());
                store
            }
            None => {
                let max_age = registry.max_age;
                drop(registry);
                self.create(new_sid, max_age).await
            }
        }
    }

    async fn destroy(&self, sid: &str) {
        let removed = self.registry.write().await.sessions.remove(sid);
        if removed.is_some() {
            info!("Destroyed session: {}", redact(sid));
        }
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
