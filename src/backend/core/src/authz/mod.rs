//! The authorization and visibility core.
//!
//! This module provides:
//! - **Role Resolver**: collapses an actor's flags and organization kind
//!   into one canonical [`RoleTag`]
//! - **Rule Sets**: per-resource-type named predicates with aliases and a
//!   `manage` catch-all, fail-closed
//! - **Relation Scoper**: per-resource-type scope builders producing
//!   storage-agnostic [`ScopeSpec`] filter specifications
//! - **Params Filters**: per-role field whitelists for incoming mutations
//! - **Gateway**: the per-request entry point with decision caching and
//!   missing-check journaling
//! - **Middleware**: an axum/tower layer converting class-level denials
//!   into 403 responses
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use passerelle_core::authz::{Gateway, PolicyRegistry, ScopeVariant, Target};
//!
//! // Once, at startup (fails fast on misconfiguration):
//! let registry = Arc::new(PolicyRegistry::build()?);
//!
//! // Per request:
//! let gateway = Gateway::new(registry.clone());
//! if gateway.authorize(Some(&actor), Target::Record(&report), "update") {
//!     let params = gateway
//!         .filtered_params::<Report>(Some(&actor), &raw, ParamsVariant::Update);
//!     // ...apply the mutation with `params`...
//! }
//!
//! // Listings:
//! let spec = gateway.scope::<Report>(Some(&actor), ScopeVariant::Default);
//! let rows = store.select(&spec);
//! ```

pub mod gateway;
pub mod middleware;
pub mod params;
pub mod policies;
pub mod registry;
pub mod roles;
pub mod rules;
pub mod scope;

pub use gateway::Gateway;
pub use middleware::{CurrentActor, RequestGateway, RequireRuleLayer, RequireRuleService};
pub use params::{FieldWhitelist, Params, ParamsVariant};
pub use registry::{Policed, PolicyBundle, PolicyRegistry};
pub use roles::{resolve, ActorContext, RoleTag, ViewerType};
pub use rules::{Rule, RuleSet, Target, MANAGE};
pub use scope::{DeletionFilter, FilterExpr, ScopeSpec, ScopeVariant};
