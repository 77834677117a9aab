//! Satchel - server-side session state
//!
//! Binds an opaque, cookie-carried session id to a key/value store that
//! lives across requests. Storage backends are pluggable providers looked
//! up by name; an in-memory provider is built in.

pub mod config;
pub mod cookies;
pub mod error;
pub mod id;
pub mod provider;
pub mod session;
pub mod value;

pub use config::Config;
pub use error::{SatchelError, SatchelResult};
pub use provider::{register_provider, Provider, Store};
pub use session::{Session, SessionManager};
pub use value::Value;
