//! Access policy for user accounts (as managed records).
//!
//! Organization admins manage the accounts of their own organization; only
//! super admins can move an account between organizations, grant the
//! organization-admin flag, or grant super-admin. Nobody bulk-destroys
//! their own account: the `destroyable` scope excludes it by default, and
//! the instance-level `destroy` rule refuses it outright.

use crate::authz::params::{FieldWhitelist, ParamsVariant};
use crate::authz::registry::PolicyBundle;
use crate::authz::roles::ActorContext;
use crate::authz::rules::{RuleSet, Target, MANAGE};
use crate::authz::scope::{FilterExpr, ScopeSpec, ScopeVariant};
use crate::domain::{FieldValue, User};
use crate::error::ConfigError;

pub fn bundle() -> Result<PolicyBundle<User>, ConfigError> {
    Ok(PolicyBundle {
        rules: rules()?,
        scope,
        params,
    })
}

fn rules() -> Result<RuleSet<User>, ConfigError> {
    RuleSet::builder()
        .rule(MANAGE, manage)
        .rule("show", show)
        .rule("destroy", destroy)
        .alias("index", "manage")
        .alias("new", "create")
        .alias("create", "manage")
        .alias("edit", "update")
        .alias("update", "manage")
        .alias("remove", "destroy")
        .alias("destroy_all", "destroy")
        .alias("undiscard", "manage")
        .alias("undiscard_all", "undiscard")
        .build()
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the record belongs to the actor's own organization.
fn same_organization(ctx: &ActorContext<'_>, user: &User) -> bool {
    ctx.organization_kind() == Some(user.organization_kind)
        && ctx.owns_organization(&user.organization_id)
}

fn manage(ctx: &ActorContext<'_>, target: Target<'_, User>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => ctx.organization_admin(),
        Some(user) => ctx.organization_admin() && same_organization(ctx, user),
    }
}

fn show(ctx: &ActorContext<'_>, target: Target<'_, User>) -> bool {
    if manage(ctx, target) {
        return true;
    }
    // Anybody may read their own account.
    target
        .record()
        .is_some_and(|user| ctx.user_id() == Some(&user.id))
}

fn destroy(ctx: &ActorContext<'_>, target: Target<'_, User>) -> bool {
    match target.record() {
        None => manage(ctx, target),
        Some(user) => manage(ctx, target) && ctx.user_id() != Some(&user.id),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope
// ─────────────────────────────────────────────────────────────────────────────

fn scope(ctx: &ActorContext<'_>, variant: ScopeVariant) -> ScopeSpec {
    let visible = if ctx.super_admin() {
        FilterExpr::All
    } else if ctx.organization_admin() {
        match (ctx.organization_kind(), ctx.organization_id()) {
            (Some(kind), Some(own)) => FilterExpr::eq("organization_kind", kind)
                .and(FilterExpr::eq("organization_id", own)),
            _ => FilterExpr::None,
        }
    } else {
        FilterExpr::None
    };

    // The actor's own account can appear in any user collection.
    let current = ctx.user_id().map(FieldValue::from);

    ScopeSpec::for_variant(visible, variant, current)
}

// ─────────────────────────────────────────────────────────────────────────────
// Params
// ─────────────────────────────────────────────────────────────────────────────

const SUPER_ADMIN_FIELDS: FieldWhitelist = FieldWhitelist::new(&[
    "first_name",
    "last_name",
    "email",
    "organization_admin",
    "super_admin",
    "organization_kind",
    "organization_id",
    "office_ids",
]);

// Accounts cannot move between organizations after creation.
const SUPER_ADMIN_UPDATE_FIELDS: FieldWhitelist = FieldWhitelist::new(&[
    "first_name",
    "last_name",
    "email",
    "organization_admin",
    "super_admin",
    "office_ids",
]);

const DDFIP_ADMIN_FIELDS: FieldWhitelist =
    FieldWhitelist::new(&["first_name", "last_name", "email", "office_ids"]);

const ORGANIZATION_ADMIN_FIELDS: FieldWhitelist =
    FieldWhitelist::new(&["first_name", "last_name", "email"]);

fn params(ctx: &ActorContext<'_>, variant: ParamsVariant) -> Option<&'static FieldWhitelist> {
    if ctx.super_admin() {
        return Some(match variant {
            ParamsVariant::Default => &SUPER_ADMIN_FIELDS,
            ParamsVariant::Update => &SUPER_ADMIN_UPDATE_FIELDS,
        });
    }
    if ctx.ddfip_admin() {
        return Some(&DDFIP_ADMIN_FIELDS);
    }
    if ctx.organization_admin() {
        return Some(&ORGANIZATION_ADMIN_FIELDS);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Actor, Organization, OrganizationKind};

    fn ddfip_admin() -> Actor {
        Actor::new("marie", "Marie", Organization::ddfip("ddfip-64")).organization_admin()
    }

    fn colleague() -> User {
        User::new(
            "marc",
            OrganizationKind::Ddfip,
            "ddfip-64",
            "marc@dgfip.finances.gouv.fr",
        )
    }

    #[test]
    fn test_admin_manages_own_organization_accounts() {
        let actor = ddfip_admin();
        let ctx = ActorContext::resolve(Some(&actor));
        let rules = rules().unwrap();

        assert!(rules.evaluate(&ctx, Target::Record(&colleague()), "update"));

        let foreign = User::new(
            "jeanne",
            OrganizationKind::Collectivity,
            "bayonne",
            "jeanne@bayonne.fr",
        );
        assert!(!rules.evaluate(&ctx, Target::Record(&foreign), "update"));
        assert!(!rules.evaluate(&ctx, Target::Record(&foreign), "show"));
    }

    #[test]
    fn test_same_kind_and_id_both_required() {
        // An organization id match alone is not enough: the kind must
        // match too.
        let actor = ddfip_admin();
        let ctx = ActorContext::resolve(Some(&actor));
        let rules = rules().unwrap();

        let homonym = User::new(
            "x",
            OrganizationKind::Collectivity,
            "ddfip-64",
            "x@example.fr",
        );
        assert!(!rules.evaluate(&ctx, Target::Record(&homonym), "update"));
    }

    #[test]
    fn test_nobody_destroys_their_own_account() {
        let actor = ddfip_admin();
        let ctx = ActorContext::resolve(Some(&actor));
        let rules = rules().unwrap();

        let own_account = User::new(
            "marie",
            OrganizationKind::Ddfip,
            "ddfip-64",
            "marie@dgfip.finances.gouv.fr",
        );
        assert!(!rules.evaluate(&ctx, Target::Record(&own_account), "destroy"));
        assert!(rules.evaluate(&ctx, Target::Record(&colleague()), "destroy"));
    }

    #[test]
    fn test_destroyable_scope_excludes_current_account() {
        let actor = ddfip_admin();
        let ctx = ActorContext::resolve(Some(&actor));

        let own_account = User::new(
            "marie",
            OrganizationKind::Ddfip,
            "ddfip-64",
            "marie@dgfip.finances.gouv.fr",
        );

        let spec = scope(&ctx, ScopeVariant::destroyable());
        assert!(!spec.matches(&own_account));
        assert!(spec.matches(&colleague()));

        let spec = scope(
            &ctx,
            ScopeVariant::Destroyable {
                exclude_current: false,
            },
        );
        assert!(spec.matches(&own_account));
    }

    #[test]
    fn test_self_read_without_admin() {
        let actor = Actor::new("marc", "Marc", Organization::ddfip("ddfip-64"));
        let ctx = ActorContext::resolve(Some(&actor));
        let rules = rules().unwrap();

        assert!(rules.evaluate(&ctx, Target::Record(&colleague()), "show"));
        assert!(!rules.evaluate(&ctx, Target::Record(&colleague()), "update"));

        // But no listing scope.
        assert!(scope(&ctx, ScopeVariant::Default).is_none());
    }

    #[test]
    fn test_admin_whitelists_never_carry_privilege_fields() {
        for actor in [
            ddfip_admin(),
            Actor::new("lea", "Lea", Organization::publisher("fiscalite-sa"))
                .organization_admin(),
            Actor::new(
                "jeanne",
                "Jeanne",
                Organization::collectivity("bayonne", "fiscalite-sa"),
            )
            .organization_admin(),
        ] {
            let ctx = ActorContext::resolve(Some(&actor));
            for variant in [ParamsVariant::Default, ParamsVariant::Update] {
                let whitelist = params(&ctx, variant).unwrap();
                assert!(!whitelist.permits("organization_admin"));
                assert!(!whitelist.permits("organization_id"));
                assert!(!whitelist.permits("organization_kind"));
                assert!(!whitelist.permits("super_admin"));
            }
        }
    }
}
