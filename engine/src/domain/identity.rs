//! Client identity value object
//!
//! The engine binds traffic to a single client UUID. Only the
//! canonical hyphenated UUIDv4 form is accepted: the configuration
//! document and the cache record both carry the id verbatim, so the
//! format is pinned at the boundary before any state is touched.

use std::fmt;
use std::str::FromStr;

use uuid::{Uuid, Variant};

use crate::domain::{DomainError, Result};

/// Canonical length of a hyphenated UUID string.
pub const CLIENT_ID_LEN: usize = 36;

/// A validated client identifier (canonical hyphenated UUIDv4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(String);

impl ClientId {
    /// Validate and wrap a candidate identifier.
    ///
    /// Accepts exactly the 36-character hyphenated form with version
    /// digit `4` and an RFC 4122 variant, matching what external
    /// controllers are allowed to send over the restart RPC.
    pub fn parse(candidate: &str) -> Result<Self> {
        if candidate.len() != CLIENT_ID_LEN {
            return Err(DomainError::InvalidIdentity(candidate.to_string()));
        }

        // `Uuid::try_parse` also accepts braced/simple/urn forms, but
        // those all differ in length, so the length check above pins
        // the hyphenated layout.
        let uuid = Uuid::try_parse(candidate)
            .map_err(|_| DomainError::InvalidIdentity(candidate.to_string()))?;

        if uuid.get_version_num() != 4 || uuid.get_variant() != Variant::RFC4122 {
            return Err(DomainError::InvalidIdentity(candidate.to_string()));
        }

        Ok(Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ClientId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
