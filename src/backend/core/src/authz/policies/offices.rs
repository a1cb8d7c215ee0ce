//! Access policy for DDFIP offices (guichets).

use crate::authz::params::{FieldWhitelist, ParamsVariant};
use crate::authz::registry::PolicyBundle;
use crate::authz::roles::ActorContext;
use crate::authz::rules::{RuleSet, Target, MANAGE};
use crate::authz::scope::{FilterExpr, ScopeSpec, ScopeVariant};
use crate::domain::Office;
use crate::error::ConfigError;

pub fn bundle() -> Result<PolicyBundle<Office>, ConfigError> {
    Ok(PolicyBundle {
        rules: rules()?,
        scope,
        params,
    })
}

fn rules() -> Result<RuleSet<Office>, ConfigError> {
    RuleSet::builder()
        .rule(MANAGE, manage)
        .rule("index", index)
        .rule("show", show)
        .rule("assign_users", manage)
        .alias("new", "create")
        .alias("create", "manage")
        .alias("edit", "update")
        .alias("update", "manage")
        .alias("remove", "destroy")
        .alias("destroy", "manage")
        .alias("destroy_all", "destroy")
        .alias("undiscard", "manage")
        .alias("undiscard_all", "undiscard")
        .build()
}

fn manage(ctx: &ActorContext<'_>, target: Target<'_, Office>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => ctx.ddfip_admin(),
        Some(office) => ctx.ddfip_admin() && ctx.owns_organization(&office.ddfip_id),
    }
}

fn index(ctx: &ActorContext<'_>, _target: Target<'_, Office>) -> bool {
    ctx.super_admin() || ctx.ddfip()
}

fn show(ctx: &ActorContext<'_>, target: Target<'_, Office>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => ctx.ddfip(),
        Some(office) => {
            (ctx.ddfip_admin() && ctx.owns_organization(&office.ddfip_id))
                || (ctx.ddfip() && ctx.member_of_office(&office.id))
        }
    }
}

fn scope(ctx: &ActorContext<'_>, variant: ScopeVariant) -> ScopeSpec {
    let visible = if ctx.super_admin() {
        FilterExpr::All
    } else if ctx.ddfip_admin() {
        match ctx.organization_id() {
            Some(own) => FilterExpr::eq("ddfip_id", own),
            None => FilterExpr::None,
        }
    } else if ctx.ddfip() {
        // Non-admin DDFIP members see the offices they belong to.
        FilterExpr::any_of("id", ctx.office_ids())
    } else {
        FilterExpr::None
    };

    // An office is never the actor's own row; exclude_current is a no-op.
    ScopeSpec::for_variant(visible, variant, None)
}

const SUPER_ADMIN_FIELDS: FieldWhitelist =
    FieldWhitelist::new(&["ddfip_id", "name", "competences"]);

// An office cannot move between DDFIPs after creation.
const SUPER_ADMIN_UPDATE_FIELDS: FieldWhitelist = FieldWhitelist::new(&["name", "competences"]);

const DDFIP_ADMIN_FIELDS: FieldWhitelist = FieldWhitelist::new(&["name", "competences"]);

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
    None
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Actor, OfficeId, Organization};

    fn pelp() -> Office {
        Office::new("pelp-bayonne", "ddfip-64", "PELP Bayonne")
    }

    #[test]
    fn test_ddfip_user_sees_only_member_offices() {
        let actor = Actor::new("marc", "Marc", Organization::ddfip("ddfip-64"))
            .in_offices([OfficeId::new("pelp-bayonne")]);
        let ctx = ActorContext::resolve(Some(&actor));

        let spec = scope(&ctx, ScopeVariant::Default);
        assert!(spec.matches(&pelp()));
        assert!(!spec.matches(&Office::new("sip-pau", "ddfip-64", "SIP Pau")));
    }

    #[test]
    fn test_ddfip_user_without_offices_sees_nothing() {
        let actor = Actor::new("marc", "Marc", Organization::ddfip("ddfip-64"));
        let ctx = ActorContext::resolve(Some(&actor));
        assert!(scope(&ctx, ScopeVariant::Default).is_none());
    }

    #[test]
    fn test_ddfip_admin_manages_own_offices() {
        let actor =
            Actor::new("marie", "Marie", Organization::ddfip("ddfip-64")).organization_admin();
        let ctx = ActorContext::resolve(Some(&actor));
        let rules = rules().unwrap();

        assert!(rules.evaluate(&ctx, Target::Record(&pelp()), "update"));
        assert!(rules.evaluate(&ctx, Target::Record(&pelp()), "assign_users"));

        let foreign = Office::new("sip-dax", "ddfip-40", "SIP Dax");
        assert!(!rules.evaluate(&ctx, Target::Record(&foreign), "update"));
    }
}
