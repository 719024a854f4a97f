//! Data Transfer Objects for API requests and responses.

use serde::{Deserialize, Serialize};

use super::{DEFAULT_CLASS, FormattedId};

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (0 = success, non-zero = error).
    pub code: i32,

    /// Human-readable message.
    pub message: String,

    /// Response data (null on error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a success response.
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

/// Counter address as sent by callers.
///
/// Used both as the JSON body of `next` and the query string of `current`.
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceRequest {
    /// Tenant identifier.
    pub tenant_id: String,

    /// Numbering series (default: `generic`).
    #[serde(default = "default_class")]
    pub sequence_class: String,
}

fn default_class() -> String {
    DEFAULT_CLASS.to_string()
}

/// Response for an issued identifier.
#[derive(Debug, Clone, Serialize)]
pub struct NextIdResponse {
    /// Formatted identifier, e.g. `SAL-000042`.
    pub id: FormattedId,
    /// Prefix part of `id`.
    pub prefix: &'static str,
    /// Numeric part of `id`.
    pub seq: u64,
    /// Tenant the identifier was issued for.
    pub tenant_id: String,
    /// Series the identifier was issued from.
    pub sequence_class: String,
}

impl NextIdResponse {
    /// Create a response for an identifier issued for `request`.
    #[must_use]
    pub fn new(request: SequenceRequest, id: FormattedId) -> Self {
        Self {
            id,
            prefix: id.prefix(),
            seq: id.seq(),
            tenant_id: request.tenant_id,
            sequence_class: request.sequence_class,
        }
    }
}

/// Response for a counter peek.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentResponse {
    /// Tenant identifier.
    pub tenant_id: String,
    /// Numbering series.
    pub sequence_class: String,
    /// Last issued value, `null` if nothing was issued yet.
    pub seq: Option<u64>,
}
