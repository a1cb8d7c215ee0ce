//! The authorization gateway: the single entry point request handlers use.
//!
//! One gateway is created per request. It answers yes/no questions
//! (delegating to the rule sets), builds narrowed scopes (delegating to the
//! relation scopers), and filters mutation parameters (delegating to the
//! params whitelists). Decisions are cached for the lifetime of the gateway
//! because a rule may be re-evaluated once per row of a listing; there is no
//! cross-request caching, since permissions can change between requests.
//!
//! Every `authorize` call is journaled so a boundary assertion can flag
//! mutating paths that never consulted the gateway at all — a programming
//! error, distinct from a denial.

use dashmap::{DashMap, DashSet};
use metrics::counter;
use std::sync::Arc;
use tracing::debug;

use super::params::{apply_whitelist, Params, ParamsVariant};
use super::registry::{Policed, PolicyRegistry};
use super::roles::ActorContext;
use super::rules::Target;
use super::scope::{ScopeSpec, ScopeVariant};
use crate::config::GatewaySettings;
use crate::domain::{Actor, Resource, ResourceType};
use crate::error::AuthzError;

// ═══════════════════════════════════════════════════════════════════════════════
// Cache keys
// ═══════════════════════════════════════════════════════════════════════════════

/// Key for a cached rule decision: actor identity, resource identity (or
/// class), and the canonical (post-alias) rule name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DecisionKey {
    actor: Option<String>,
    resource: ResourceType,
    record: Option<String>,
    rule: &'static str,
}

/// Key for a cached scope: actor identity, resource type, and the variant
/// with its options.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ScopeKey {
    actor: Option<String>,
    resource: ResourceType,
    variant: ScopeVariant,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Gateway
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-request authorization facade over the process-wide policy registry.
pub struct Gateway {
    registry: Arc<PolicyRegistry>,
    settings: GatewaySettings,
    decisions: DashMap<DecisionKey, bool>,
    scopes: DashMap<ScopeKey, ScopeSpec>,
    journal: DashSet<(ResourceType, Option<String>)>,
}

impl Gateway {
    pub fn new(registry: Arc<PolicyRegistry>) -> Self {
        Self::with_settings(registry, GatewaySettings::default())
    }

    pub fn with_settings(registry: Arc<PolicyRegistry>, settings: GatewaySettings) -> Self {
        Self {
            registry,
            settings,
            decisions: DashMap::new(),
            scopes: DashMap::new(),
            journal: DashSet::new(),
        }
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    // ─────────────────────────────────────────────────────────────────────────
    // authorize
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluate a named rule for an actor against a record or the record
    /// class. Denial is the `false` return value, never an error.
    pub fn authorize<R: Policed>(
        &self,
        actor: Option<&Actor>,
        target: Target<'_, R>,
        rule: &str,
    ) -> bool {
        let ctx = ActorContext::resolve(actor);
        let bundle = self.registry.bundle::<R>();
        let record_id = target.record().map(Resource::resource_id);

        if self.settings.journal_checks {
            self.journal.insert((R::TYPE, record_id.clone()));
        }

        // Unknown rule names (no rule, no manage fallback) deny without
        // touching the cache: only canonical names are cacheable.
        let Some(canonical) = bundle
            .rules
            .canonical_rule(rule)
            .or_else(|| bundle.rules.canonical_rule(super::rules::MANAGE))
        else {
            tracing::warn!(resource = %R::TYPE, rule, "unknown rule, denying");
            record_decision(R::TYPE, rule, false);
            return false;
        };

        let key = DecisionKey {
            actor: actor.map(|a| a.id.as_str().to_string()),
            resource: R::TYPE,
            record: record_id,
            rule: canonical,
        };

        if self.settings.cache_decisions {
            if let Some(cached) = self.decisions.get(&key) {
                return *cached;
            }
        }

        let allowed = bundle.rules.evaluate_canonical(&ctx, target, canonical);

        debug!(
            actor = ?key.actor,
            role = %ctx.role(),
            resource = %R::TYPE,
            record = ?key.record,
            rule = canonical,
            allowed,
            "authorization decision"
        );
        record_decision(R::TYPE, canonical, allowed);

        if self.settings.cache_decisions {
            self.decisions.insert(key, allowed);
        }
        allowed
    }

    /// Class-level check by resource type tag, for callers that do not know
    /// the record type statically (enforcement middleware, CLI).
    pub fn authorize_type(
        &self,
        actor: Option<&Actor>,
        resource: ResourceType,
        rule: &str,
    ) -> bool {
        use crate::domain::{Collectivity, Ddfip, Office, Package, Publisher, Report, User};

        match resource {
            ResourceType::Collectivity => {
                self.authorize::<Collectivity>(actor, Target::Class, rule)
            }
            ResourceType::Publisher => self.authorize::<Publisher>(actor, Target::Class, rule),
            ResourceType::Ddfip => self.authorize::<Ddfip>(actor, Target::Class, rule),
            ResourceType::Office => self.authorize::<Office>(actor, Target::Class, rule),
            ResourceType::Package => self.authorize::<Package>(actor, Target::Class, rule),
            ResourceType::Report => self.authorize::<Report>(actor, Target::Class, rule),
            ResourceType::User => self.authorize::<User>(actor, Target::Class, rule),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // scope
    // ─────────────────────────────────────────────────────────────────────────

    /// Build the scope narrowing a collection of `R` to what the actor may
    /// see. Roles with no visibility get the empty sentinel, not an error.
    pub fn scope<R: Policed>(&self, actor: Option<&Actor>, variant: ScopeVariant) -> ScopeSpec {
        let key = ScopeKey {
            actor: actor.map(|a| a.id.as_str().to_string()),
            resource: R::TYPE,
            variant,
        };

        if self.settings.cache_decisions {
            if let Some(cached) = self.scopes.get(&key) {
                return cached.clone();
            }
        }

        let ctx = ActorContext::resolve(actor);
        let spec = (self.registry.bundle::<R>().scope)(&ctx, variant);

        debug!(
            actor = ?key.actor,
            role = %ctx.role(),
            resource = %R::TYPE,
            variant = %variant,
            empty = spec.is_none(),
            "scope built"
        );

        if self.settings.cache_decisions {
            self.scopes.insert(key, spec.clone());
        }
        spec
    }

    /// Scope by resource type tag.
    pub fn scope_type(
        &self,
        actor: Option<&Actor>,
        resource: ResourceType,
        variant: ScopeVariant,
    ) -> ScopeSpec {
        use crate::domain::{Collectivity, Ddfip, Office, Package, Publisher, Report, User};

        match resource {
            ResourceType::Collectivity => self.scope::<Collectivity>(actor, variant),
            ResourceType::Publisher => self.scope::<Publisher>(actor, variant),
            ResourceType::Ddfip => self.scope::<Ddfip>(actor, variant),
            ResourceType::Office => self.scope::<Office>(actor, variant),
            ResourceType::Package => self.scope::<Package>(actor, variant),
            ResourceType::Report => self.scope::<Report>(actor, variant),
            ResourceType::User => self.scope::<User>(actor, variant),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // filtered_params
    // ─────────────────────────────────────────────────────────────────────────

    /// Strip unauthorized fields from an incoming attribute set.
    ///
    /// `None` means the role may not set any field at all — the caller must
    /// treat it as a refused mutation, not as an empty but permitted set.
    pub fn filtered_params<R: Policed>(
        &self,
        actor: Option<&Actor>,
        raw: &Params,
        variant: ParamsVariant,
    ) -> Option<Params> {
        let ctx = ActorContext::resolve(actor);
        let whitelist = (self.registry.bundle::<R>().params)(&ctx, variant);
        apply_whitelist(whitelist, raw)
    }

    /// Params filtering by resource type tag.
    pub fn filtered_params_type(
        &self,
        actor: Option<&Actor>,
        resource: ResourceType,
        raw: &Params,
        variant: ParamsVariant,
    ) -> Option<Params> {
        use crate::domain::{Collectivity, Ddfip, Office, Package, Publisher, Report, User};

        match resource {
            ResourceType::Collectivity => self.filtered_params::<Collectivity>(actor, raw, variant),
            ResourceType::Publisher => self.filtered_params::<Publisher>(actor, raw, variant),
            ResourceType::Ddfip => self.filtered_params::<Ddfip>(actor, raw, variant),
            ResourceType::Office => self.filtered_params::<Office>(actor, raw, variant),
            ResourceType::Package => self.filtered_params::<Package>(actor, raw, variant),
            ResourceType::Report => self.filtered_params::<Report>(actor, raw, variant),
            ResourceType::User => self.filtered_params::<User>(actor, raw, variant),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Missing-check detection
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether any `authorize` call was made for this target during the
    /// request.
    pub fn was_checked<R: Policed>(&self, target: Target<'_, R>) -> bool {
        self.journal
            .contains(&(R::TYPE, target.record().map(Resource::resource_id)))
    }

    /// Boundary assertion: fail when a mutating path never consulted the
    /// gateway for the acted-upon resource.
    pub fn assert_checked<R: Policed>(&self, target: Target<'_, R>) -> Result<(), AuthzError> {
        if self.was_checked(target) {
            Ok(())
        } else {
            Err(AuthzError::MissingCheck {
                resource: R::TYPE,
                id: target.record().map(Resource::resource_id),
            })
        }
    }
}

fn record_decision(resource: ResourceType, rule: &str, allowed: bool) {
    counter!(
        "passerelle_authz_decisions_total",
        "resource" => resource.as_str(),
        "rule" => rule.to_string(),
        "allowed" => if allowed { "true" } else { "false" },
    )
    .increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Organization, Report};

    fn gateway() -> Gateway {
        Gateway::new(Arc::new(PolicyRegistry::build().unwrap()))
    }

    fn reporter() -> Actor {
        Actor::new(
            "jeanne",
            "Jeanne",
            Organization::collectivity("bayonne", "fiscalite-sa"),
        )
    }

    #[test]
    fn test_decisions_are_cached_per_gateway() {
        let gateway = gateway();
        let actor = reporter();
        let report = Report::new("r1", "bayonne", "evaluation_local_habitation", "64102");

        let first = gateway.authorize(Some(&actor), Target::Record(&report), "update");
        let second = gateway.authorize(Some(&actor), Target::Record(&report), "update");
        assert!(first && second);
        assert_eq!(gateway.decisions.len(), 1);
    }

    #[test]
    fn test_alias_and_target_share_a_cache_entry() {
        // `edit` resolves to `update` before the cache key is built.
        let gateway = gateway();
        let actor = reporter();
        let report = Report::new("r1", "bayonne", "evaluation_local_habitation", "64102");

        gateway.authorize(Some(&actor), Target::Record(&report), "edit");
        gateway.authorize(Some(&actor), Target::Record(&report), "update");
        assert_eq!(gateway.decisions.len(), 1);
    }

    #[test]
    fn test_unknown_rule_falls_back_to_manage() {
        let gateway = gateway();
        let actor = reporter();

        // Every report rule set registers `manage`, so an unregistered name
        // collapses onto it; the journal still records the attempt.
        assert!(gateway.authorize::<Report>(Some(&actor), Target::Class, "frobnicate"));
        assert!(gateway.was_checked::<Report>(Target::Class));
    }

    #[test]
    fn test_journal_flags_missing_checks() {
        let gateway = gateway();
        let actor = reporter();
        let report = Report::new("r1", "bayonne", "evaluation_local_habitation", "64102");

        assert!(gateway.assert_checked(Target::Record(&report)).is_err());

        gateway.authorize(Some(&actor), Target::Record(&report), "show");
        assert!(gateway.assert_checked(Target::Record(&report)).is_ok());

        // Checking one record does not cover the class, nor another record.
        let other = Report::new("r2", "bayonne", "evaluation_local_habitation", "64102");
        assert!(gateway.assert_checked(Target::Record(&other)).is_err());
    }

    #[test]
    fn test_uncached_gateway_still_idempotent() {
        let registry = Arc::new(PolicyRegistry::build().unwrap());
        let settings = GatewaySettings {
            cache_decisions: false,
            ..GatewaySettings::default()
        };
        let gateway = Gateway::with_settings(registry, settings);
        let actor = reporter();
        let report = Report::new("r1", "bayonne", "evaluation_local_habitation", "64102");

        let first = gateway.authorize(Some(&actor), Target::Record(&report), "update");
        let second = gateway.authorize(Some(&actor), Target::Record(&report), "update");
        assert_eq!(first, second);
        assert!(gateway.decisions.is_empty());
    }

    #[test]
    fn test_dynamic_entry_points_match_typed_ones() {
        let gateway = gateway();
        let actor = reporter();

        assert_eq!(
            gateway.authorize_type(Some(&actor), ResourceType::Report, "create"),
            gateway.authorize::<Report>(Some(&actor), Target::Class, "create"),
        );
        assert_eq!(
            gateway.scope_type(Some(&actor), ResourceType::Ddfip, ScopeVariant::Default),
            gateway.scope::<crate::domain::Ddfip>(Some(&actor), ScopeVariant::Default),
        );
    }
}
