//! Error types for Satchel
//!
//! All fallible operations return `SatchelResult<T>`. Absent keys and
//! unknown session ids are not errors; they surface as `Option`/`bool`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Satchel operations
pub type SatchelResult<T> = Result<T, SatchelError>;

/// All errors that can occur in Satchel
#[derive(Error, Debug)]
pub enum SatchelError {
    // Registry errors
    #[error("Session provider {0} is not registered")]
    ProviderNotRegistered(String),

    #[error("Session provider {0} is already registered")]
    ProviderAlreadyRegistered(String),

    #[error("Session provider {0} registered after the registry was first used")]
    RegistrySealed(String),

    // Identifier errors
    #[error("Failed to generate session id: {0}")]
    IdGeneration(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl SatchelError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a configuration error for a value that did not come from a file
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            path: PathBuf::from("<inline>"),
            reason: reason.into(),
        }
    }

    /// Whether this error is a startup misconfiguration rather than a runtime failure
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ProviderNotRegistered(_)
                | Self::ProviderAlreadyRegistered(_)
                | Self::RegistrySealed(_)
                | Self::ConfigInvalid { .. }
                | Self::TomlParse(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ProviderNotRegistered(_) => {
                Some("Call register_provider before creating a SessionManager")
            }
            Self::ProviderAlreadyRegistered(_) => Some("Register each provider name once"),
            Self::RegistrySealed(_) => {
                Some("Register providers at startup, before the first SessionManager::new")
            }
            _ => None,
        }
    }
}
