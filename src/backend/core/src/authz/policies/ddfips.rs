//! Access policy for DDFIPs.
//!
//! DDFIPs are administered by super admins; their own members can see them,
//! and their admins can edit contact details. Nobody else has any
//! visibility: a collectivity listing DDFIPs gets the empty sentinel.

use crate::authz::params::{FieldWhitelist, ParamsVariant};
use crate::authz::registry::PolicyBundle;
use crate::authz::roles::ActorContext;
use crate::authz::rules::{RuleSet, Target, MANAGE};
use crate::authz::scope::{FilterExpr, ScopeSpec, ScopeVariant};
use crate::domain::{Ddfip, FieldValue, OrganizationKind};
use crate::error::ConfigError;

pub fn bundle() -> Result<PolicyBundle<Ddfip>, ConfigError> {
    Ok(PolicyBundle {
        rules: rules()?,
        scope,
        params,
    })
}

fn rules() -> Result<RuleSet<Ddfip>, ConfigError> {
    RuleSet::builder()
        .rule(MANAGE, manage)
        .rule("show", show)
        .rule("update", update)
        .alias("index", "manage")
        .alias("new", "create")
        .alias("create", "manage")
        .alias("edit", "update")
        .alias("remove", "destroy")
        .alias("destroy", "manage")
        .alias("destroy_all", "destroy")
        .alias("undiscard", "manage")
        .alias("undiscard_all", "undiscard")
        .build()
}

fn manage(ctx: &ActorContext<'_>, _target: Target<'_, Ddfip>) -> bool {
    ctx.super_admin()
}

fn show(ctx: &ActorContext<'_>, target: Target<'_, Ddfip>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => ctx.ddfip(),
        Some(ddfip) => ctx.ddfip() && ctx.owns_organization(&ddfip.id),
    }
}

fn update(ctx: &ActorContext<'_>, target: Target<'_, Ddfip>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => ctx.ddfip_admin(),
        Some(ddfip) => ctx.ddfip_admin() && ctx.owns_organization(&ddfip.id),
    }
}

fn scope(ctx: &ActorContext<'_>, variant: ScopeVariant) -> ScopeSpec {
    let visible = if ctx.super_admin() {
        FilterExpr::All
    } else if ctx.ddfip() {
        match ctx.organization_id() {
            Some(own) => FilterExpr::eq("id", own),
            None => FilterExpr::None,
        }
    } else {
        FilterExpr::None
    };

    let current = (ctx.organization_kind() == Some(OrganizationKind::Ddfip))
        .then(|| ctx.organization_id().map(FieldValue::from))
        .flatten();

    ScopeSpec::for_variant(visible, variant, current)
}

const SUPER_ADMIN_FIELDS: FieldWhitelist =
    FieldWhitelist::new(&["name", "code_departement", "contact_email"]);

// The département code is the DDFIP's identity; assignment-only.
const SUPER_ADMIN_UPDATE_FIELDS: FieldWhitelist =
    FieldWhitelist::new(&["name", "contact_email"]);

const DDFIP_ADMIN_FIELDS: FieldWhitelist = FieldWhitelist::new(&["contact_email"]);

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
