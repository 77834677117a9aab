//! Session providers
//!
//! Backends are looked up by name through the provider registry:
//! - `memory`: in-process map, the only built-in provider

pub mod memory;
pub mod registry;
mod traits;

pub use memory::{memory_provider, MemoryProvider, MemorySessionStore};
pub use registry::{register_provider, registry, ProviderRegistry};
pub use traits::{Provider, ProviderRef, Store, StoreRef};
