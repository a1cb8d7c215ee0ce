//! Access policy for transmission packages.
//!
//! Packages are built by a collectivity (or its publisher, on the
//! collectivity's behalf) and transmitted to a DDFIP. DDFIP admins see two
//! distinct ownership paths, merged as a union: packages addressed to their
//! DDFIP once transmitted, and packages already assigned to one of their
//! offices.

use crate::authz::params::{FieldWhitelist, ParamsVariant};
use crate::authz::registry::PolicyBundle;
use crate::authz::roles::ActorContext;
use crate::authz::rules::{RuleSet, Target, MANAGE};
use crate::authz::scope::{FilterExpr, ScopeSpec, ScopeVariant};
use crate::domain::Package;
use crate::error::ConfigError;

pub fn bundle() -> Result<PolicyBundle<Package>, ConfigError> {
    Ok(PolicyBundle {
        rules: rules()?,
        scope,
        params,
    })
}

fn rules() -> Result<RuleSet<Package>, ConfigError> {
    RuleSet::builder()
        .rule(MANAGE, manage)
        .rule("index", index)
        .rule("show", show)
        .rule("create", create)
        .rule("transmit", transmit)
        .rule("assign", assign)
        .alias("new", "create")
        .alias("edit", "update")
        .alias("update", "manage")
        .alias("remove", "destroy")
        .alias("destroy", "manage")
        .alias("destroy_all", "destroy")
        .alias("undiscard", "manage")
        .alias("undiscard_all", "undiscard")
        .build()
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the actor's organization built this package.
fn owner(ctx: &ActorContext<'_>, package: &Package) -> bool {
    (ctx.collectivity() && ctx.owns_organization(&package.collectivity_id))
        || (ctx.publisher()
            && package
                .publisher_id
                .as_ref()
                .is_some_and(|id| ctx.owns_organization(id)))
}

fn manage(ctx: &ActorContext<'_>, target: Target<'_, Package>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => ctx.collectivity() || ctx.publisher(),
        // Transmitted packages are frozen for the reporting side.
        Some(package) => owner(ctx, package) && !package.transmitted(),
    }
}

fn index(ctx: &ActorContext<'_>, _target: Target<'_, Package>) -> bool {
    ctx.super_admin() || ctx.collectivity() || ctx.publisher() || ctx.ddfip()
}

fn show(ctx: &ActorContext<'_>, target: Target<'_, Package>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => ctx.collectivity() || ctx.publisher() || ctx.ddfip(),
        Some(package) => {
            owner(ctx, package)
                || (ctx.ddfip_admin()
                    && package.transmitted()
                    && package
                        .ddfip_id
                        .as_ref()
                        .is_some_and(|id| ctx.owns_organization(id)))
                || (ctx.ddfip()
                    && package
                        .assigned_office_id
                        .as_ref()
                        .is_some_and(|id| ctx.member_of_office(id)))
        }
    }
}

fn create(ctx: &ActorContext<'_>, _target: Target<'_, Package>) -> bool {
    ctx.super_admin() || ctx.collectivity() || ctx.publisher()
}

fn transmit(ctx: &ActorContext<'_>, target: Target<'_, Package>) -> bool {
    match target.record() {
        None => ctx.collectivity() || ctx.publisher(),
        Some(package) => owner(ctx, package) && !package.transmitted(),
    }
}

fn assign(ctx: &ActorContext<'_>, target: Target<'_, Package>) -> bool {
    match target.record() {
        None => ctx.ddfip_admin(),
        Some(package) => {
            ctx.ddfip_admin()
                && package.transmitted()
                && package
                    .ddfip_id
                    .as_ref()
                    .is_some_and(|id| ctx.owns_organization(id))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope
// ─────────────────────────────────────────────────────────────────────────────

fn scope(ctx: &ActorContext<'_>, variant: ScopeVariant) -> ScopeSpec {
    let visible = if ctx.super_admin() {
        FilterExpr::All
    } else if ctx.collectivity() {
        match ctx.organization_id() {
            Some(own) => FilterExpr::eq("collectivity_id", own),
            None => FilterExpr::None,
        }
    } else if ctx.publisher() {
        match ctx.organization_id() {
            Some(own) => FilterExpr::eq("publisher_id", own),
            None => FilterExpr::None,
        }
    } else if ctx.ddfip_admin() {
        // Two ownership paths, merged: addressed-and-transmitted, plus
        // already assigned to one of this admin's DDFIP offices. The union
        // keeps both sub-scopes instead of overwriting one with the other.
        let addressed = match ctx.organization_id() {
            Some(own) => {
                FilterExpr::eq("ddfip_id", own).and(FilterExpr::eq("transmitted", true))
            }
            None => FilterExpr::None,
        };
        addressed.or(FilterExpr::any_of("assigned_office_id", ctx.office_ids()))
    } else if ctx.ddfip() {
        FilterExpr::any_of("assigned_office_id", ctx.office_ids())
    } else {
        FilterExpr::None
    };

    ScopeSpec::for_variant(visible, variant, None)
}

// ─────────────────────────────────────────────────────────────────────────────
// Params
// ─────────────────────────────────────────────────────────────────────────────

const SUPER_ADMIN_FIELDS: FieldWhitelist = FieldWhitelist::new(&["reference", "ddfip_id"]);

const OWNER_FIELDS: FieldWhitelist = FieldWhitelist::new(&["reference"]);

const DDFIP_ADMIN_FIELDS: FieldWhitelist = FieldWhitelist::new(&["assigned_office_id"]);

fn params(ctx: &ActorContext<'_>, variant: ParamsVariant) -> Option<&'static FieldWhitelist> {
    if ctx.super_admin() {
        return Some(match variant {
            ParamsVariant::Default => &SUPER_ADMIN_FIELDS,
            ParamsVariant::Update => &OWNER_FIELDS,
        });
    }
    if ctx.collectivity() || ctx.publisher() {
        return Some(&OWNER_FIELDS);
    }
    if ctx.ddfip_admin() {
        return Some(&DDFIP_ADMIN_FIELDS);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Actor, OfficeId, Organization};
    use chrono::Utc;

    fn ddfip_admin() -> Actor {
        Actor::new("marie", "Marie", Organization::ddfip("ddfip-64"))
            .organization_admin()
            .in_offices([OfficeId::new("pelp-bayonne")])
    }

    #[test]
    fn test_union_of_ownership_paths_for_ddfip_admin() {
        let actor = ddfip_admin();
        let ctx = ActorContext::resolve(Some(&actor));
        let spec = scope(&ctx, ScopeVariant::Default);

        // Path 1: transmitted to this DDFIP.
        let addressed = Package::new("p1", "bayonne", "2024-05-0001")
            .transmitted_to("ddfip-64", Utc::now());
        assert!(spec.matches(&addressed));

        // Path 2: assigned to a member office, even when addressed
        // elsewhere (reassignment across departments).
        let assigned = Package::new("p2", "dax", "2024-05-0002")
            .transmitted_to("ddfip-40", Utc::now())
            .assigned_to("pelp-bayonne");
        assert!(spec.matches(&assigned));

        // Neither path: untransmitted draft.
        let draft = Package::new("p3", "bayonne", "2024-05-0003");
        assert!(!spec.matches(&draft));
    }

    #[test]
    fn test_owner_loses_manage_after_transmission() {
        let actor = Actor::new(
            "jeanne",
            "Jeanne",
            Organization::collectivity("bayonne", "fiscalite-sa"),
        );
        let ctx = ActorContext::resolve(Some(&actor));
        let rules = rules().unwrap();

        let draft = Package::new("p1", "bayonne", "2024-05-0001");
        assert!(rules.evaluate(&ctx, Target::Record(&draft), "update"));
        assert!(rules.evaluate(&ctx, Target::Record(&draft), "transmit"));

        let sent = draft.transmitted_to("ddfip-64", Utc::now());
        assert!(!rules.evaluate(&ctx, Target::Record(&sent), "update"));
        assert!(!rules.evaluate(&ctx, Target::Record(&sent), "transmit"));
        // Reading its own transmitted package stays allowed.
        assert!(rules.evaluate(&ctx, Target::Record(&sent), "show"));
    }

    #[test]
    fn test_publisher_sees_only_packages_it_built() {
        let actor = Actor::new("lea", "Lea", Organization::publisher("fiscalite-sa"));
        let ctx = ActorContext::resolve(Some(&actor));
        let spec = scope(&ctx, ScopeVariant::Default);

        let own = Package::new("p1", "bayonne", "2024-05-0001")
            .made_by_publisher("fiscalite-sa");
        // Built directly by the collectivity: no publisher_id at all.
        let direct = Package::new("p2", "bayonne", "2024-05-0002");

        assert!(spec.matches(&own));
        assert!(!spec.matches(&direct));
    }

    #[test]
    fn test_assign_requires_transmitted_to_own_ddfip() {
        let actor = ddfip_admin();
        let ctx = ActorContext::resolve(Some(&actor));
        let rules = rules().unwrap();

        let foreign = Package::new("p1", "dax", "2024-05-0001")
            .transmitted_to("ddfip-40", Utc::now());
        assert!(!rules.evaluate(&ctx, Target::Record(&foreign), "assign"));

        let own = Package::new("p2", "bayonne", "2024-05-0002")
            .transmitted_to("ddfip-64", Utc::now());
        assert!(rules.evaluate(&ctx, Target::Record(&own), "assign"));
    }
}
