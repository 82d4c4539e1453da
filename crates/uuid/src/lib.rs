//! UUID utilities for form registry identifiers.
//!
//! Forms, form resources, encounters and observations are identified by UUIDs that cross API
//! boundaries as strings. To keep lookups exact, the registry uses a *canonical* textual form:
//! **36 lowercase characters in the 8-4-4-4-12 hyphenated layout**.
//!
//! ## Canonical UUID form
//! - Length: 36
//! - Hex digits `0-9` and `a-f`, hyphens at offsets 8, 13, 18 and 23
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! Non-canonical input (uppercase, braces, the 32-character simple form) is rejected by
//! [`RegistryUuid::parse`] rather than normalised, so two spellings of the same identifier can
//! never coexist in a catalog.

use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;

/// Canonical UUID of a registry record.
///
/// Once constructed the value is known to be canonical, and [`Display`](fmt::Display) always
/// renders the hyphenated lowercase form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistryUuid(Uuid);

impl Default for RegistryUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryUuid {
    /// Allocates a fresh random (version 4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "UUID must be 36 lowercase characters in 8-4-4-4-12 form, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("'{}': {}", input, e)))
    }

    /// Returns true if `input` is in canonical form. This is a purely syntactic check.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 36
            && input.bytes().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => b == b'-',
                _ => matches!(b, b'0'..=b'9' | b'a'..=b'f'),
            })
    }
}

impl fmt::Display for RegistryUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RegistryUuid {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegistryUuid::parse(s)
    }
}

impl From<Uuid> for RegistryUuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RegistryUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RegistryUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RegistryUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}
