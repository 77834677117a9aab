//! Request-scoped session facade

use crate::config::Config;
use crate::cookies::{removal_cookie, session_cookie, CookieSink};
use crate::error::SatchelResult;
use crate::id::{redact, IdGenerator};
use crate::provider::{ProviderRef, StoreRef};
use crate::value::Value;
use std::sync::Arc;
use tracing::info;

/// A started session bound to one store for the duration of a request
///
/// Typed getters report a value of another type exactly like a missing key.
/// `pull*` is a get followed by a remove, not an atomic take: a concurrent
/// `set` of the same key from another request can land in between and be
/// removed.
pub struct Session {
    id: String,
    is_new: bool,
    store: StoreRef,
    provider: ProviderRef,
    config: Arc<Config>,
    ids: Arc<dyn IdGenerator>,
}

impl Session {
    pub(crate) fn new(
        id: String,
        is_new: bool,
        store: StoreRef,
        provider: ProviderRef,
        config: Arc<Config>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            id,
            is_new,
            store,
            provider,
            config,
            ids,
        }
    }

    /// Session id captured when the session was started (or last regenerated)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this request created the session
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key).await
    }

    pub async fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key).await? {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub async fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).await?.as_int()
    }

    pub async fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).await?.as_float()
    }

    pub async fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).await?.as_bool()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    pub async fn set(&self, key: &str, value: impl Into<Value>) {
        self.store.set(key, value.into()).await;
    }

    pub async fn remove(&self, key: &str) {
        self.store.remove(key).await;
    }

    /// Drop all values; the session and its id stay
    pub async fn clear(&self) {
        self.store.clear().await;
    }

    /// Get a value and remove it
    pub async fn pull(&self, key: &str) -> Option<Value> {
        let value = self.store.get(key).await;
        self.store.remove(key).await;
        value
    }

    /// Get a string and remove the key, whatever its type was
    pub async fn pull_string(&self, key: &str) -> Option<String> {
        let value = self.get_string(key).await;
        self.remove(key).await;
        value
    }

    pub async fn pull_int(&self, key: &str) -> Option<i64> {
        let value = self.get_int(key).await;
        self.remove(key).await;
        value
    }

    pub async fn pull_float(&self, key: &str) -> Option<f64> {
        let value = self.get_float(key).await;
        self.remove(key).await;
        value
    }

    pub async fn pull_bool(&self, key: &str) -> Option<bool> {
        let value = self.get_bool(key).await;
        self.remove(key).await;
        value
    }

    /// Move this session to a fresh id, keeping its values, and send the
    /// new id to the client. Used after login to defeat session fixation.
    pub async fn regenerate(&mut self, sink: &mut impl CookieSink) -> SatchelResult<()> {
        let new_id = self.ids.generate(self.config.cookie_length)?;
        self.store = self.provider.regenerate(&self.id, &new_id).await;

        info!(
            "Session {} regenerated via {}",
            redact(&self.id),
            self.provider.provider_name()
        );
        sink.add_cookie(session_cookie(&self.config.key, &new_id, self.config.max_age));
        self.id = new_id;
        Ok(())
    }

    /// End the session: forget it in the provider and expire the cookie
    pub async fn destroy(self, sink: &mut impl CookieSink) {
        self.provider.destroy(&self.id).await;
        sink.add_cookie(removal_cookie(&self.config.key));
    }
}
