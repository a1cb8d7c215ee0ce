//! The typed policy registry: one policy bundle per resource type, resolved
//! through an explicit table built once at startup.
//!
//! There is no name-based lookup: the [`Policed`] trait maps each record
//! type to its bundle field at compile time, and the closed
//! [`ResourceType`](crate::domain::ResourceType) enum drives the dynamic
//! entry points the middleware and CLI use. Building the registry validates
//! every rule set; a misconfiguration aborts startup instead of defaulting
//! to "allow".

use super::params::{FieldWhitelist, ParamsVariant};
use super::policies;
use super::roles::ActorContext;
use super::rules::RuleSet;
use super::scope::{ScopeSpec, ScopeVariant};
use crate::domain::{Collectivity, Ddfip, Office, Package, Publisher, Report, Resource, User};
use crate::error::ConfigError;

// ═══════════════════════════════════════════════════════════════════════════════
// PolicyBundle
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the gateway needs for one resource type: its rule set, its
/// scope builder, and its params whitelist table.
pub struct PolicyBundle<R: Resource> {
    pub rules: RuleSet<R>,
    pub scope: fn(&ActorContext<'_>, ScopeVariant) -> ScopeSpec,
    pub params: fn(&ActorContext<'_>, ParamsVariant) -> Option<&'static FieldWhitelist>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PolicyRegistry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable, process-wide policy configuration.
///
/// Built once at boot, shared behind an `Arc`, safe for concurrent access
/// by every request-handling task without locking.
pub struct PolicyRegistry {
    pub(crate) collectivities: PolicyBundle<Collectivity>,
    pub(crate) publishers: PolicyBundle<Publisher>,
    pub(crate) ddfips: PolicyBundle<Ddfip>,
    pub(crate) offices: PolicyBundle<Office>,
    pub(crate) packages: PolicyBundle<Package>,
    pub(crate) reports: PolicyBundle<Report>,
    pub(crate) users: PolicyBundle<User>,
}

impl PolicyRegistry {
    /// Assemble and validate the default policy set.
    ///
    /// Fails fast on any configuration error (alias cycles, dangling alias
    /// targets, empty rule sets).
    pub fn build() -> Result<Self, ConfigError> {
        Ok(Self {
            collectivities: policies::collectivities::bundle()?,
            publishers: policies::publishers::bundle()?,
            ddfips: policies::ddfips::bundle()?,
            offices: policies::offices::bundle()?,
            packages: policies::packages::bundle()?,
            reports: policies::reports::bundle()?,
            users: policies::users::bundle()?,
        })
    }

    /// The policy bundle for a record type.
    pub fn bundle<R: Policed>(&self) -> &PolicyBundle<R> {
        R::bundle(self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Policed
// ═══════════════════════════════════════════════════════════════════════════════

/// Maps a record type to its bundle in the registry.
pub trait Policed: Resource + Sized {
    fn bundle(registry: &PolicyRegistry) -> &PolicyBundle<Self>;
}

impl Policed for Collectivity {
    fn bundle(registry: &PolicyRegistry) -> &PolicyBundle<Self> {
        &registry.collectivities
    }
}

impl Policed for Publisher {
    fn bundle(registry: &PolicyRegistry) -> &PolicyBundle<Self> {
        &registry.publishers
    }
}

impl Policed for Ddfip {
    fn bundle(registry: &PolicyRegistry) -> &PolicyBundle<Self> {
        &registry.ddfips
    }
}

impl Policed for Office {
    fn bundle(registry: &PolicyRegistry) -> &PolicyBundle<Self> {
        &registry.offices
    }
}

impl Policed for Package {
    fn bundle(registry: &PolicyRegistry) -> &PolicyBundle<Self> {
        &registry.packages
    }
}

impl Policed for Report {
    fn bundle(registry: &PolicyRegistry) -> &PolicyBundle<Self> {
        &registry.reports
    }
}

impl Policed for User {
    fn bundle(registry: &PolicyRegistry) -> &PolicyBundle<Self> {
        &registry.users
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_builds() {
        // The complete policy set must pass startup validation.
        assert!(PolicyRegistry::build().is_ok());
    }
}
