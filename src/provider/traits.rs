//! Session storage abstraction
//!
//! A [`Provider`] owns the stores of one backend, keyed by session id.
//! A [`Store`] is the key/value bag of a single session. Both are shared
//! as trait objects so that backends can be swapped by name at startup.

use crate::value::Value;
use async_trait::async_trait;
use std::sync::Arc;

/// Per-session key/value container
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch a value, `None` if the key is absent
    async fn get(&self, key: &str) -> Option<Value>;

    /// Insert or overwrite a value
    async fn set(&self, key: &str, value: Value);

    /// Delete a key; absent keys are a no-op
    async fn remove(&self, key: &str);

    /// Drop every key, keeping the session itself alive
    async fn clear(&self);

    /// The session id this store is currently bound to
    async fn id(&self) -> String;
}

/// Shared handle to a store
pub type StoreRef = Arc<dyn Store>;

/// Backend that creates, finds, renames and destroys stores
///
/// Operations are infallible: absent sessions are reported through return
/// values, never as errors.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Return the store for `sid`, creating it under that id if absent
    async fn read(&self, sid: &str, max_age: i64) -> StoreRef;

    /// Create an empty store for `sid`, replacing any existing one
    async fn initialize(&self, sid: &str, max_age: i64) -> StoreRef;

    /// Whether a store exists for `sid`
    async fn exists(&self, sid: &str) -> bool;

    /// Move the store at `old_sid` to `new_sid`, keeping its values.
    /// Initializes `new_sid` if `old_sid` is unknown.
    async fn regenerate(&self, old_sid: &str, new_sid: &str) -> StoreRef;

    /// Forget the store for `sid`; unknown ids are a no-op
    async fn destroy(&self, sid: &str);

    /// Human-readable backend name for logs
    fn provider_name(&self) -> &'static str;
}

/// Shared handle to a provider
pub type ProviderRef = Arc<dyn Provider>;
