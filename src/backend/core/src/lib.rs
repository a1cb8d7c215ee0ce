//! # Passerelle Core
//!
//! Authorization and visibility core for the Passerelle portal, where
//! collectivities and their publishers report tax anomalies to the fiscal
//! administration (DDFIP / DGFIP).
//!
//! ## Architecture
//!
//! - **Domain**: actors, organizations, and the protected records
//! - **Role Resolver**: one canonical role tag per actor
//! - **Rule Sets**: per-resource-type predicates, aliased, fail-closed
//! - **Relation Scoper**: storage-agnostic filter specifications with a
//!   hard empty sentinel for no-access roles
//! - **Params Filters**: per-role field whitelists for mutations
//! - **Gateway**: per-request facade with decision caching and
//!   missing-check journaling
//! - **Store**: in-memory adapter interpreting scope specifications
//!
//! The policy registry is immutable, built once at startup (failing fast on
//! misconfiguration), and shared across request tasks; everything
//! per-request lives in a [`authz::Gateway`].

pub mod authz;
pub mod config;
pub mod domain;
pub mod error;
pub mod store;
pub mod telemetry;

pub use error::{AuthzError, ConfigError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::authz::{
        resolve, ActorContext, CurrentActor, FieldWhitelist, FilterExpr, Gateway, Params,
        ParamsVariant, Policed, PolicyBundle, PolicyRegistry, RequestGateway, RequireRuleLayer,
        RoleTag, RuleSet, ScopeSpec, ScopeVariant, Target, ViewerType, MANAGE,
    };
    pub use crate::config::{GatewaySettings, Settings, TelemetrySettings};
    pub use crate::domain::{
        Actor, Collectivity, Ddfip, FieldValue, Office, OfficeId, Organization, OrganizationId,
        OrganizationKind, Package, PackageId, Priority, Publisher, Report, ReportId, ReportState,
        Resource, ResourceType, User, UserId,
    };
    pub use crate::error::{AuthzError, ConfigError};
    pub use crate::store::MemoryStore;
}
