//! Session management module

pub mod handle;
pub mod manager;

pub use handle::Session;
pub use manager::SessionManager;
