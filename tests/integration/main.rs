//! Integration tests for Satchel

use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

mod request_flow {
    use super::init_tracing;
    use cookie::{Cookie, CookieJar};
    use satchel::provider::{memory_provider, Provider};
    use satchel::{Config, SessionManager, Value};
    use serial_test::serial;

    fn config() -> Config {
        Config {
            provider: "memory".to_string(),
            key: "sid".to_string(),
            cookie_length: 32,
            max_age: 3600,
        }
    }

    /// Turn the cookies a response set into the jar of the next request
    fn next_request(response: &[Cookie<'static>]) -> CookieJar {
        let mut jar = CookieJar::new();
        for cookie in response {
            jar.add_original(cookie.clone());
        }
        jar
    }

    #[tokio::test]
    #[serial]
    async fn first_and_second_request() {
        init_tracing();
        let manager = SessionManager::new(config()).unwrap();

        // First request carries no cookie
        let mut response: Vec<Cookie<'static>> = Vec::new();
        let session = manager.start(&mut response, &CookieJar::new()).await.unwrap();
        session.set("user", "alice").await;
        session.set("visits", 1).await;

        let sid = session.id().to_string();
        assert_eq!(sid.len(), 32);
        assert!(memory_provider().exists(&sid).await);

        assert_eq!(response.len(), 1);
        let cookie = &response[0];
        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), sid);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age().map(|d| d.whole_seconds()), Some(3600));

        // Second request presents the cookie
        let request = next_request(&response);
        let mut response: Vec<Cookie<'static>> = Vec::new();
        let session = manager.start(&mut response, &request).await.unwrap();

        assert!(response.is_empty());
        assert_eq!(session.id(), sid);
        assert_eq!(session.get_string("user").await, Some("alice".to_string()));
        assert_eq!(session.get_int("visits").await, Some(1));
    }

    #[tokio::test]
    #[serial]
    async fn flash_message_survives_one_request() {
        init_tracing();
        let manager = SessionManager::new(config()).unwrap();

        let mut response: Vec<Cookie<'static>> = Vec::new();
        let session = manager.start(&mut response, &CookieJar::new()).await.unwrap();
        session.set("flash", "Profile saved").await;

        let request = next_request(&response);
        let session = manager.start(&mut Vec::<Cookie<'static>>::new(), &request).await.unwrap();
        assert_eq!(
            session.pull_string("flash").await,
            Some("Profile saved".to_string())
        );

        let session = manager.start(&mut Vec::<Cookie<'static>>::new(), &request).await.unwrap();
        assert_eq!(session.pull("flash").await, None);
    }

    #[tokio::test]
    #[serial]
    async fn login_regenerates_then_logout_destroys() {
        init_tracing();
        let manager = SessionManager::new(config()).unwrap();

        let mut response: Vec<Cookie<'static>> = Vec::new();
        let mut session = manager.start(&mut response, &CookieJar::new()).await.unwrap();
        session.set("cart", Value::from(serde_json::json!(["book"]))).await;
        let anonymous_id = session.id().to_string();

        let mut login_response: Vec<Cookie<'static>> = Vec::new();
        session.regenerate(&mut login_response).await.unwrap();
        let authenticated_id = session.id().to_string();

        assert_ne!(anonymous_id, authenticated_id);
        assert!(!memory_provider().exists(&anonymous_id).await);
        assert_eq!(login_response[0].value(), authenticated_id);

        // The old cookie now opens an empty session under the stale id
        let stale = manager
            .start(&mut Vec::<Cookie<'static>>::new(), &next_request(&response))
            .await
            .unwrap();
        assert_eq!(stale.get("cart").await, None);
        stale.destroy(&mut Vec::<Cookie<'static>>::new()).await;

        let session = manager
            .start(&mut Vec::<Cookie<'static>>::new(), &next_request(&login_response))
            .await
            .unwrap();
        assert!(session.contains("cart").await);

        let mut logout_response: Vec<Cookie<'static>> = Vec::new();
        session.destroy(&mut logout_response).await;
        assert!(!memory_provider().exists(&authenticated_id).await);
        assert_eq!(logout_response[0].value(), "");
    }
}

mod registry {
    use super::init_tracing;
    use satchel::provider::{registry, MemoryProvider, ProviderRegistry};
    use satchel::{register_provider, Config, SatchelError, SessionManager};
    use serial_test::serial;
    use std::sync::Arc;

    #[test]
    #[serial]
    fn memory_is_registered_by_default() {
        assert!(registry().contains("memory"));
    }

    #[test]
    #[serial]
    fn duplicate_global_registration_fails() {
        init_tracing();
        let err = register_provider("memory", Arc::new(MemoryProvider::new())).unwrap_err();
        assert!(matches!(err, SatchelError::ProviderAlreadyRegistered(_)));
        assert!(err.is_configuration());
    }

    #[test]
    #[serial]
    fn registration_after_first_use_fails() {
        init_tracing();
        SessionManager::new(Config::default()).unwrap();

        let err = register_provider("too-late", Arc::new(MemoryProvider::new())).unwrap_err();
        assert!(matches!(err, SatchelError::RegistrySealed(_)));
        assert!(err.hint().is_some());
    }

    #[test]
    fn unregistered_provider_fails_construction() {
        let config = Config {
            provider: "redis".to_string(),
            ..Config::default()
        };
        let result = SessionManager::with_registry(&ProviderRegistry::with_defaults(), config);
        assert!(matches!(result, Err(SatchelError::ProviderNotRegistered(_))));
    }
}

mod custom_provider {
    use async_trait::async_trait;
    use cookie::{Cookie, CookieJar};
    use satchel::provider::{MemoryProvider, Provider, ProviderRegistry, StoreRef};
    use satchel::{Config, SessionManager};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Delegates to a memory provider and counts reads
    #[derive(Default)]
    struct CountingProvider {
        inner: MemoryProvider,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl Provider for CountingProvider {
        async fn read(&self, sid: &str, max_age: i64) -> StoreRef {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read(sid, max_age).await
        }

        async fn initialize(&self, sid: &str, max_age: i64) -> StoreRef {
            self.inner.initialize(sid, max_age).await
        }

        async fn exists(&self, sid: &str) -> bool {
            self.inner.exists(sid).await
        }

        async fn regenerate(&self, old_sid: &str, new_sid: &str) -> StoreRef {
            self.inner.regenerate(old_sid, new_sid).await
        }

        async fn destroy(&self, sid: &str) {
            self.inner.destroy(sid).await
        }

        fn provider_name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn manager_uses_named_provider() {
        let provider = Arc::new(CountingProvider::default());
        let registry = ProviderRegistry::with_defaults();
        registry.register("counting", provider.clone()).unwrap();

        let config = Config {
            provider: "counting".to_string(),
            key: "app".to_string(),
            ..Config::default()
        };
        let manager = SessionManager::with_registry(&registry, config).unwrap();
        assert_eq!(manager.provider().provider_name(), "counting");

        let mut response: Vec<Cookie<'static>> = Vec::new();
        let session = manager.start(&mut response, &CookieJar::new()).await.unwrap();
        assert_eq!(provider.reads.load(Ordering::SeqCst), 0);

        let mut request = CookieJar::new();
        request.add_original(response[0].clone());
        manager.start(&mut Vec::<Cookie<'static>>::new(), &request).await.unwrap();

        assert_eq!(provider.reads.load(Ordering::SeqCst), 1);
        assert!(provider.exists(session.id()).await);
    }
}

mod concurrency {
    use cookie::{Cookie, CookieJar};
    use futures_util::future::join_all;
    use satchel::provider::{MemoryProvider, Provider, ProviderRegistry};
    use satchel::{Config, SessionManager};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn isolated_manager() -> (SessionManager, Arc<MemoryProvider>) {
        let provider = Arc::new(MemoryProvider::new());
        let registry = ProviderRegistry::new();
        registry.register("memory", provider.clone()).unwrap();
        let manager = SessionManager::with_registry(&registry, Config::default()).unwrap();
        (manager, provider)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_requests_get_distinct_sessions() {
        let (manager, provider) = isolated_manager();

        let starts = (0..100).map(|_| {
            let manager = manager.clone();
            async move {
                let mut response: Vec<Cookie<'static>> = Vec::new();
                let session = manager.start(&mut response, &CookieJar::new()).await.unwrap();
                session.id().to_string()
            }
        });
        let ids: HashSet<String> = join_all(starts).await.into_iter().collect();

        assert_eq!(ids.len(), 100);
        assert_eq!(provider.len().await, 100);
        for id in &ids {
            assert!(provider.exists(id).await);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_writers_on_one_session() {
        let (manager, _provider) = isolated_manager();
        let mut response: Vec<Cookie<'static>> = Vec::new();
        manager.start(&mut response, &CookieJar::new()).await.unwrap();
        let mut request = CookieJar::new();
        request.add_original(response[0].clone());

        let mut handles = Vec::new();
        for i in 0..32 {
            let manager = manager.clone();
            let request = request.clone();
            handles.push(tokio::spawn(async move {
                let session = manager
                    .start(&mut Vec::<Cookie<'static>>::new(), &request)
                    .await
                    .unwrap();
                session.set(&format!("k{i}"), i).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let session = manager.start(&mut Vec::<Cookie<'static>>::new(), &request).await.unwrap();
        for i in 0..32 {
            assert_eq!(session.get_int(&format!("k{i}")).await, Some(i));
        }
    }
}
