//! Error taxonomy for the authorization core.
//!
//! Denials are never errors: a rule evaluating `false`, an empty scope, or a
//! refused params filter are ordinary values the caller translates into a
//! user-facing response. Errors here are configuration mistakes (caught at
//! startup when the policy registry is built) and programmer errors (a
//! mutating path that never consulted the gateway).

use thiserror::Error;

use crate::domain::ResourceType;

// ═══════════════════════════════════════════════════════════════════════════════
// ConfigError
// ═══════════════════════════════════════════════════════════════════════════════

/// Startup-time configuration failures. These must abort the process: a
/// misconfigured policy must never silently default to "allow".
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("alias cycle in {resource} rule set: {chain}")]
    AliasCycle {
        resource: ResourceType,
        chain: String,
    },

    #[error("alias '{alias}' in {resource} rule set points to unknown rule '{target}'")]
    DanglingAlias {
        resource: ResourceType,
        alias: &'static str,
        target: &'static str,
    },

    #[error("rule '{rule}' registered twice in {resource} rule set")]
    DuplicateRule {
        resource: ResourceType,
        rule: &'static str,
    },

    #[error("rule set for {0} is empty")]
    EmptyRuleSet(ResourceType),

    #[error("settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

// ═══════════════════════════════════════════════════════════════════════════════
// AuthzError
// ═══════════════════════════════════════════════════════════════════════════════

/// Programmer errors surfaced by the gateway's defense-in-depth checks.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A mutating request path completed without ever asking the gateway
    /// about the acted-upon resource. Distinct from a denial: this is a
    /// missing check, not a refused one.
    #[error("no authorization check recorded for {resource} {id:?}")]
    MissingCheck {
        resource: ResourceType,
        id: Option<String>,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_the_resource() {
        let err = ConfigError::DanglingAlias {
            resource: ResourceType::Report,
            alias: "new",
            target: "creat",
        };
        let msg = err.to_string();
        assert!(msg.contains("report"));
        assert!(msg.contains("new"));
        assert!(msg.contains("creat"));
    }
}
