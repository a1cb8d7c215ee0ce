//! Access policy for publishers.
//!
//! Publishers are administered by super admins; a publisher-affiliated
//! actor can see its own organization and, if admin, edit it.

use crate::authz::params::{FieldWhitelist, ParamsVariant};
use crate::authz::registry::PolicyBundle;
use crate::authz::roles::ActorContext;
use crate::authz::rules::{RuleSet, Target, MANAGE};
use crate::authz::scope::{FilterExpr, ScopeSpec, ScopeVariant};
use crate::domain::{FieldValue, OrganizationKind, Publisher};
use crate::error::ConfigError;

pub fn bundle() -> Result<PolicyBundle<Publisher>, ConfigError> {
    Ok(PolicyBundle {
        rules: rules()?,
        scope,
        params,
    })
}

fn rules() -> Result<RuleSet<Publisher>, ConfigError> {
    RuleSet::builder()
        .rule(MANAGE, manage)
        .rule("show", show)
        .rule("update", update)
        .alias("new", "create")
        .alias("create", "manage")
        .alias("edit", "update")
        .alias("remove", "destroy")
        .alias("destroy", "manage")
        .alias("destroy_all", "destroy")
        .alias("undiscard", "manage")
        .alias("undiscard_all", "undiscard")
        .alias("index", "manage")
        .build()
}

fn manage(ctx: &ActorContext<'_>, _target: Target<'_, Publisher>) -> bool {
    ctx.super_admin()
}

fn show(ctx: &ActorContext<'_>, target: Target<'_, Publisher>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => ctx.publisher(),
        Some(publisher) => ctx.publisher() && ctx.owns_organization(&publisher.id),
    }
}

fn update(ctx: &ActorContext<'_>, target: Target<'_, Publisher>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => ctx.publisher_admin(),
        Some(publisher) => ctx.publisher_admin() && ctx.owns_organization(&publisher.id),
    }
}

fn scope(ctx: &ActorContext<'_>, variant: ScopeVariant) -> ScopeSpec {
    let visible = if ctx.super_admin() {
        FilterExpr::All
    } else if ctx.publisher() {
        match ctx.organization_id() {
            Some(own) => FilterExpr::eq("id", own),
            None => FilterExpr::None,
        }
    } else {
        FilterExpr::None
    };

    let current = (ctx.organization_kind() == Some(OrganizationKind::Publisher))
        .then(|| ctx.organization_id().map(FieldValue::from))
        .flatten();

    ScopeSpec::for_variant(visible, variant, current)
}

const SUPER_ADMIN_FIELDS: FieldWhitelist =
    FieldWhitelist::new(&["name", "siret", "contact_email"]);

const PUBLISHER_ADMIN_FIELDS: FieldWhitelist = FieldWhitelist::new(&["name", "contact_email"]);

fn params(ctx: &ActorContext<'_>, _variant: ParamsVariant) -> Option<&'static FieldWhitelist> {
    if ctx.super_admin() {
        Some(&SUPER_ADMIN_FIELDS)
    } else if ctx.publisher_admin() {
        Some(&PUBLISHER_ADMIN_FIELDS)
    } else {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
