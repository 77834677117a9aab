//! Provider registry
//!
//! Maps provider names to provider instances. The process-wide registry
//! starts with `"memory"` and accepts further providers only until its
//! first lookup; after that it is sealed.

use crate::error::{SatchelError, SatchelResult};
use crate::provider::memory::memory_provider;
use crate::provider::traits::ProviderRef;
use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};
use tracing::{debug, info};

static GLOBAL_REGISTRY: LazyLock<ProviderRegistry> = LazyLock::new(ProviderRegistry::with_defaults);

/// The process-wide provider registry
pub fn registry() -> &'static ProviderRegistry {
    &GLOBAL_REGISTRY
}

/// Register a provider in the process-wide registry
///
/// Fails if the name is taken or a session manager has already been created.
pub fn register_provider(name: &str, provider: ProviderRef) -> SatchelResult<()> {
    registry().register(name, provider)
}

#[derive(Default)]
struct Entries {
    sealed: bool,
    providers: HashMap<String, ProviderRef>,
}

/// Name-to-provider mapping with register-then-use discipline
#[derive(Default)]
pub struct ProviderRegistry {
    entries: RwLock<Entries>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the shared memory provider as `"memory"`
    pub fn with_defaults() -> Self {
        let mut providers: HashMap<String, ProviderRef> = HashMap::new();
        providers.insert("memory".to_string(), memory_provider());
        Self {
            entries: RwLock::new(Entries {
                sealed: false,
                providers,
            }),
        }
    }

    /// Add a provider under `name`
    pub fn register(&self, name: &str, provider: ProviderRef) -> SatchelResult<()> {
        // Critical sections never panic, so a poisoned lock still holds consistent data
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if entries.providers.contains_key(name) {
            return Err(SatchelError::ProviderAlreadyRegistered(name.to_string()));
        }
        if entries.sealed {
            return Err(SatchelError::RegistrySealed(name.to_string()));
        }

        info!(
            "Registered session provider {} ({})",
            name,
            provider.provider_name()
        );
        entries.providers.insert(name.to_string(), provider);
        Ok(())
    }

    /// Resolve `name`, sealing the registry against further registration
    pub fn resolve(&self, name: &str) -> SatchelResult<ProviderRef> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.sealed {
            debug!("Sealing provider registry on first use");
            entries.sealed = true;
        }

        entries
            .providers
            .get(name)
            .cloned()
            .ok_or_else(|| SatchelError::ProviderNotRegistered(name.to_string()))
    }

    /// Look up `name` without sealing the registry
    pub fn get(&self, name: &str) -> Option<ProviderRef> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .providers
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .providers
            .contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = entries.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether a lookup has sealed the registry
    pub fn is_sealed(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sealed
    }
}
