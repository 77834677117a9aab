//! Configuration schema for a session manager
//!
//! Usually embedded as a `[session]` table in the application's config file.

use crate::error::{SatchelError, SatchelResult};
use serde::{Deserialize, Serialize};

/// Session settings, fixed for the lifetime of a `SessionManager`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registered provider name
    pub provider: String,

    /// Name of the cookie carrying the session id
    pub key: String,

    /// Length of generated session ids
    pub cookie_length: usize,

    /// Session lifetime in seconds (advisory for the memory provider)
    pub max_age: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: "memory".to_string(),
            key: "sid".to_string(),
            cookie_length: 32,
            max_age: 3600,
        }
    }
}

impl Config {
    /// Extract the `[session]` table from a parsed application config.
    /// A missing table yields the defaults.
    pub fn from_table(table: &toml::Table) -> SatchelResult<Self> {
        match table.get("session") {
            Some(section) => Ok(section.clone().try_into::<Config>()?),
            None => Ok(Self::default()),
        }
    }

    /// Check the settings for values a session manager cannot work with
    pub fn validate(&self) -> SatchelResult<()> {
        if self.provider.trim().is_empty() {
            return Err(SatchelError::invalid("provider name is empty"));
        }
        if !is_cookie_name(&self.key) {
            return Err(SatchelError::invalid(format!(
                "cookie key {:?} is not a valid cookie name",
                self.key
            )));
        }
        if self.cookie_length == 0 {
            return Err(SatchelError::invalid("cookie_length must be positive"));
        }
        if self.max_age < 0 {
            return Err(SatchelError::invalid("max_age must not be negative"));
        }
        Ok(())
    }
}

// RFC 6265 token: visible ASCII minus separators
fn is_cookie_name(name: &str) -> bool {
    const SEPARATORS: &[char] = &[
        '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', '{', '}',
    ];
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_graphic() && !SEPARATORS.contains(&c))
}
