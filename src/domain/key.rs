//! Counter key types.
//!
//! A counter is addressed by a tenant and a sequence class. Both parts are kept
//! as separate validated fields; backends derive their physical key from them
//! with an encoding that cannot collide, whatever characters a tenant contains.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum tenant identifier length in bytes.
pub const MAX_TENANT_LEN: usize = 64;

/// Maximum sequence class length in bytes.
pub const MAX_CLASS_LEN: usize = 32;

/// Class used when a caller does not name one.
pub const DEFAULT_CLASS: &str = "generic";

/// Opaque tenant (pharmacy/business) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Validate and wrap a tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the identifier is empty, padded
    /// with whitespace, contains control characters, or is too long.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Err("tenant id cannot be empty".to_string());
        }
        if raw.trim() != raw {
            return Err("tenant id cannot start or end with whitespace".to_string());
        }
        if raw.chars().any(char::is_control) {
            return Err("tenant id cannot contain control characters".to_string());
        }
        if raw.len() > MAX_TENANT_LEN {
            return Err(format!(
                "tenant id cannot exceed {MAX_TENANT_LEN} bytes (got {})",
                raw.len()
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numbering series tag, e.g. `sale` or `purchase`.
///
/// Any well-formed tag is accepted. Tags without a dedicated prefix share the
/// generic `TXN` prefix but still count independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SequenceClass(String);

impl SequenceClass {
    /// Validate and wrap a sequence class tag.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the tag is empty, contains
    /// whitespace or control characters, or is too long.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("sequence class cannot be empty".to_string());
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err("sequence class cannot contain whitespace or control characters".to_string());
        }
        if raw.len() > MAX_CLASS_LEN {
            return Err(format!(
                "sequence class cannot exceed {MAX_CLASS_LEN} bytes (got {})",
                raw.len()
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// The raw tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier prefix for this class.
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self.0.as_str() {
            "sale" => "SAL",
            "purchase" => "PUR",
            _ => "TXN",
        }
    }
}

impl Default for SequenceClass {
    fn default() -> Self {
        Self(DEFAULT_CLASS.to_string())
    }
}

impl TryFrom<String> for SequenceClass {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SequenceClass> for String {
    fn from(value: SequenceClass) -> Self {
        value.0
    }
}

impl fmt::Display for SequenceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite key of one counter record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CounterKey {
    /// Owning tenant.
    pub tenant: TenantId,
    /// Numbering series.
    pub class: SequenceClass,
}

impl CounterKey {
    /// Create a key from already validated parts.
    #[must_use]
    pub const fn new(tenant: TenantId, class: SequenceClass) -> Self {
        Self { tenant, class }
    }

    /// Validate raw parts into a key.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid part.
    pub fn parse(tenant: &str, class: &str) -> Result<Self, String> {
        Ok(Self::new(TenantId::parse(tenant)?, SequenceClass::parse(class)?))
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant, self.class)
    }
}
