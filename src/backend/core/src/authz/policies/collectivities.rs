//! Access policy for collectivities.
//!
//! Collectivities are managed by super admins and by the publisher that
//! owns them, when the collectivity has delegated management to it. DDFIP
//! members have no visibility here: territory mapping lives outside this
//! core. The DGFIP observes everything read-only.

use crate::authz::params::{FieldWhitelist, ParamsVariant};
use crate::authz::registry::PolicyBundle;
use crate::authz::roles::ActorContext;
use crate::authz::rules::{RuleSet, Target, MANAGE};
use crate::authz::scope::{FilterExpr, ScopeSpec, ScopeVariant};
use crate::domain::{Collectivity, FieldValue, OrganizationKind};
use crate::error::ConfigError;

pub fn bundle() -> Result<PolicyBundle<Collectivity>, ConfigError> {
    Ok(PolicyBundle {
        rules: rules()?,
        scope,
        params,
    })
}

fn rules() -> Result<RuleSet<Collectivity>, ConfigError> {
    RuleSet::builder()
        .rule(MANAGE, manage)
        .rule("index", index)
        .rule("show", show)
        .rule("create", create)
        .rule("update", manage)
        .rule("destroy", manage)
        .rule("undiscard", manage)
        .alias("new", "create")
        .alias("edit", "update")
        .alias("remove", "destroy")
        .alias("destroy_all", "destroy")
        .alias("undiscard_all", "undiscard")
        .build()
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

fn manage(ctx: &ActorContext<'_>, target: Target<'_, Collectivity>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => ctx.publisher(),
        Some(collectivity) => {
            ctx.publisher()
                && ctx.owns_organization(&collectivity.publisher_id)
                && collectivity.allow_publisher_management
        }
    }
}

fn index(ctx: &ActorContext<'_>, _target: Target<'_, Collectivity>) -> bool {
    ctx.super_admin() || ctx.publisher() || ctx.dgfip() || ctx.collectivity()
}

fn show(ctx: &ActorContext<'_>, target: Target<'_, Collectivity>) -> bool {
    if ctx.super_admin() || ctx.dgfip() {
        return true;
    }
    match target.record() {
        None => ctx.publisher() || ctx.collectivity(),
        Some(collectivity) => {
            (ctx.publisher() && ctx.owns_organization(&collectivity.publisher_id))
                || (ctx.collectivity() && ctx.owns_organization(&collectivity.id))
        }
    }
}

fn create(ctx: &ActorContext<'_>, _target: Target<'_, Collectivity>) -> bool {
    ctx.super_admin() || ctx.publisher()
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope
// ─────────────────────────────────────────────────────────────────────────────

fn scope(ctx: &ActorContext<'_>, variant: ScopeVariant) -> ScopeSpec {
    let visible = if ctx.super_admin() || ctx.dgfip() {
        FilterExpr::All
    } else if ctx.publisher() {
        match ctx.organization_id() {
            Some(own) => FilterExpr::eq("publisher_id", own),
            None => FilterExpr::None,
        }
    } else if ctx.collectivity() {
        match ctx.organization_id() {
            Some(own) => FilterExpr::eq("id", own),
            None => FilterExpr::None,
        }
    } else {
        FilterExpr::None
    };

    // The actor's own row can only appear here for collectivity actors.
    let current = (ctx.organization_kind() == Some(OrganizationKind::Collectivity))
        .then(|| ctx.organization_id().map(FieldValue::from))
        .flatten();

    ScopeSpec::for_variant(visible, variant, current)
}

// ─────────────────────────────────────────────────────────────────────────────
// Params
// ─────────────────────────────────────────────────────────────────────────────

const SUPER_ADMIN_FIELDS: FieldWhitelist = FieldWhitelist::new(&[
    "name",
    "siren",
    "publisher_id",
    "contact_email",
    "allow_publisher_management",
]);

// The SIREN identifies the collectivity; it is assignment-only.
const SUPER_ADMIN_UPDATE_FIELDS: FieldWhitelist = FieldWhitelist::new(&[
    "name",
    "publisher_id",
    "contact_email",
    "allow_publisher_management",
]);

const PUBLISHER_ADMIN_FIELDS: FieldWhitelist =
    FieldWhitelist::new(&["name", "siren", "contact_email"]);

const PUBLISHER_ADMIN_UPDATE_FIELDS: FieldWhitelist =
    FieldWhitelist::new(&["name", "contact_email"]);

const COLLECTIVITY_ADMIN_FIELDS: FieldWhitelist = FieldWhitelist::new(&["contact_email"]);

fn params(ctx: &ActorContext<'_>, variant: ParamsVariant) -> Option<&'static FieldWhitelist> {
    if ctx.super_admin() {
        return Some(match variant {
            ParamsVariant::Default => &SUPER_ADMIN_FIELDS,
            ParamsVariant::Update => &SUPER_ADMIN_UPDATE_FIELDS,
        });
    }
    if ctx.publisher_admin() {
        return Some(match variant {
            ParamsVariant::Default => &PUBLISHER_ADMIN_FIELDS,
            ParamsVariant::Update => &PUBLISHER_ADMIN_UPDATE_FIELDS,
        });
    }
    if ctx.collectivity() && ctx.organization_admin() {
        return Some(&COLLECTIVITY_ADMIN_FIELDS);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Actor, Organization};

    fn publisher_actor() -> Actor {
        Actor::new("lea", "Lea", Organization::publisher("fiscalite-sa"))
    }

    fn bayonne() -> Collectivity {
        Collectivity::new("bayonne", "fiscalite-sa", "Bayonne", "217640102")
    }

    #[test]
    fn test_publisher_manages_own_collectivities() {
        let actor = publisher_actor();
        let ctx = ActorContext::resolve(Some(&actor));
        let rules = rules().unwrap();

        assert!(rules.evaluate(&ctx, Target::Record(&bayonne()), "update"));

        let foreign = Collectivity::new("anglet", "other-sa", "Anglet", "217640024");
        assert!(!rules.evaluate(&ctx, Target::Record(&foreign), "update"));
    }

    #[test]
    fn test_delegation_flag_gates_publisher_management() {
        let actor = publisher_actor();
        let ctx = ActorContext::resolve(Some(&actor));
        let rules = rules().unwrap();

        let undelegated = bayonne().publisher_managed(false);
        assert!(!rules.evaluate(&ctx, Target::Record(&undelegated), "update"));
        // Reading stays allowed through the ownership link.
        assert!(rules.evaluate(&ctx, Target::Record(&undelegated), "show"));
    }

    #[test]
    fn test_ddfip_has_no_scope() {
        let actor = Actor::new("marc", "Marc", Organization::ddfip("ddfip-64")).organization_admin();
        let ctx = ActorContext::resolve(Some(&actor));
        assert!(scope(&ctx, ScopeVariant::Default).is_none());
    }

    #[test]
    fn test_destroyable_is_a_noop_for_publishers() {
        // A publisher's own row never appears in a collectivity collection.
        let actor = publisher_actor().organization_admin();
        let ctx = ActorContext::resolve(Some(&actor));

        let spec = scope(&ctx, ScopeVariant::destroyable());
        assert_eq!(spec, ScopeSpec::kept(FilterExpr::eq("publisher_id", &crate::domain::OrganizationId::new("fiscalite-sa"))));
    }

    #[test]
    fn test_params_by_role() {
        let actor = publisher_actor().organization_admin();
        let ctx = ActorContext::resolve(Some(&actor));
        assert!(params(&ctx, ParamsVariant::Default).unwrap().permits("siren"));
        assert!(!params(&ctx, ParamsVariant::Update).unwrap().permits("siren"));
        assert!(!params(&ctx, ParamsVariant::Default).unwrap().permits("publisher_id"));

        // Non-admin publisher users get nothing.
        let plain = publisher_actor();
        let ctx = ActorContext::resolve(Some(&plain));
        assert!(params(&ctx, ParamsVariant::Default).is_none());
    }
}
