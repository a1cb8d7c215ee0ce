//! Attribute whitelisting for incoming mutation parameters.
//!
//! Whitelists are additive per role; an unmatched role yields `None`, which
//! callers must treat as "no permission to set any field", not as an empty
//! but permitted set. Fields outside the active whitelist are stripped,
//! never coerced.

use serde::Serialize;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Params
// ═══════════════════════════════════════════════════════════════════════════════

/// Incoming attribute set, as decoded from a request body.
pub type Params = serde_json::Map<String, serde_json::Value>;

// ═══════════════════════════════════════════════════════════════════════════════
// ParamsVariant
// ═══════════════════════════════════════════════════════════════════════════════

/// Action variant changing which fields are permitted.
///
/// `Update` omits assignment-only fields (organization links, form types)
/// that may only be set when a record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamsVariant {
    Default,
    Update,
}

impl Default for ParamsVariant {
    fn default() -> Self {
        Self::Default
    }
}

impl fmt::Display for ParamsVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Update => write!(f, "update"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FieldWhitelist
// ═══════════════════════════════════════════════════════════════════════════════

/// A static set of permitted field names for one (resource type, role,
/// variant) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWhitelist {
    fields: &'static [&'static str],
}

impl FieldWhitelist {
    pub const fn new(fields: &'static [&'static str]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    pub fn permits(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    /// Keep only whitelisted fields. Absent input fields are not an error;
    /// anything else is dropped.
    pub fn apply(&self, raw: &Params) -> Params {
        raw.iter()
            .filter(|(key, _)| self.permits(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Apply an optional whitelist: `None` means the role has no permission to
/// set any field, and the whole parameter set is refused.
pub fn apply_whitelist(whitelist: Option<&FieldWhitelist>, raw: &Params) -> Option<Params> {
    whitelist.map(|w| w.apply(raw))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
