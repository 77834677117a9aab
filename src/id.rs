//! Session identifier generation

use crate::error::{SatchelError, SatchelResult};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Number of leading id characters kept in log output
const REDACTED_PREFIX_LEN: usize = 6;

/// Source of unguessable session ids
pub trait IdGenerator: Send + Sync {
    /// Produce a random string of exactly `len` characters
    fn generate(&self, len: usize) -> SatchelResult<String>;
}

/// Alphanumeric ids drawn from the operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self, len: usize) -> SatchelResult<String> {
        if len == 0 {
            return Err(SatchelError::IdGeneration(
                "requested id length is zero".to_string(),
            ));
        }

        Ok(OsRng
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect())
    }
}

/// Shorten an id for logging
pub fn redact(sid: &str) -> String {
    let prefix: String = sid.chars().take(REDACTED_PREFIX_LEN).collect();
    if sid.chars().count() > REDACTED_PREFIX_LEN {
        format!("{prefix}…")
    } else {
        prefix
    }
}
