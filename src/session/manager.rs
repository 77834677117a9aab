//! Session start-up: provider resolution and cookie handling

use crate::config::Config;
use crate::cookies::{read_session_id, session_cookie, CookieSink, CookieSource};
use crate::error::SatchelResult;
use crate::id::{redact, IdGenerator, RandomIdGenerator};
use crate::provider::registry::{registry, ProviderRegistry};
use crate::provider::{ProviderRef, StoreRef};
use crate::session::handle::Session;
use std::sync::Arc;
use tracing::debug;

/// Creates request-scoped [`Session`]s for one configuration
///
/// Build one at startup and share it; `start` is called once per request.
#[derive(Clone)]
pub struct SessionManager {
    provider: ProviderRef,
    config: Arc<Config>,
    ids: Arc<dyn IdGenerator>,
}

impl SessionManager {
    /// Validate `config` and resolve its provider from the process-wide registry
    pub fn new(config: Config) -> SatchelResult<Self> {
        Self::with_registry(registry(), config)
    }

    /// Like [`SessionManager::new`], resolving against a specific registry
    pub fn with_registry(registry: &ProviderRegistry, config: Config) -> SatchelResult<Self> {
        config.validate()?;
        let provider = registry.resolve(&config.provider)?;
        debug!(
            "Session manager using provider {} with cookie {}",
            config.provider, config.key
        );

        Ok(Self {
            provider,
            config: Arc::new(config),
            ids: Arc::new(RandomIdGenerator),
        })
    }

    /// Replace the session id source
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provider(&self) -> &ProviderRef {
        &self.provider
    }

    /// Bind a session to the current request.
    ///
    /// Without a session cookie, a new id is generated, initialized in the
    /// provider and sent back as an HttpOnly cookie. With one, the provider
    /// reads that id (creating it if unknown) and no cookie is written.
    pub async fn start(
        &self,
        sink: &mut impl CookieSink,
        source: &impl CookieSource,
    ) -> SatchelResult<Session> {
        match read_session_id(source, &self.config.key) {
            Some(sid) => {
                let store = self.provider.read(&sid, self.config.max_age).await;
                debug!("Started existing session {}", redact(&sid));
                Ok(self.bind(sid, store, false))
            }
            None => {
                let sid = self.ids.generate(self.config.cookie_length)?;
                let store = self.provider.initialize(&sid, self.config.max_age).await;
                sink.add_cookie(session_cookie(
                    &self.config.key,
                    &sid,
                    self.config.max_age,
                ));
                debug!("Started new session {}", redact(&sid));
                Ok(self.bind(sid, store, true))
            }
        }
    }

    fn bind(&self, sid: String, store: StoreRef, is_new: bool) -> Session {
        Session::new(
            sid,
            is_new,
            store,
            Arc::clone(&self.provider),
            Arc::clone(&self.config),
            Arc::clone(&self.ids),
        )
    }
}
