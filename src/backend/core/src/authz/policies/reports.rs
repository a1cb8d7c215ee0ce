//! Access policy for reports (signalements).
//!
//! The reporting side (collectivity, or its publisher) owns a report while
//! it is being packed; once transmitted it belongs to the instruction side:
//! the destination DDFIP's admins, then the assigned office's members. The
//! DGFIP observes every transmitted report nationwide, read-only.

use crate::authz::params::{FieldWhitelist, ParamsVariant};
use crate::authz::registry::PolicyBundle;
use crate::authz::roles::{ActorContext, ViewerType};
use crate::authz::rules::{RuleSet, Target, MANAGE};
use crate::authz::scope::{FilterExpr, ScopeSpec, ScopeVariant};
use crate::domain::Report;
use crate::error::ConfigError;

pub fn bundle() -> Result<PolicyBundle<Report>, ConfigError> {
    Ok(PolicyBundle {
        rules: rules()?,
        scope,
        params,
    })
}

fn rules() -> Result<RuleSet<Report>, ConfigError> {
    RuleSet::builder()
        .rule(MANAGE, manage)
        .rule("index", index)
        .rule("show", show)
        .rule("create", create)
        .rule("transmit", transmit)
        .rule("assign_office", assign_office)
        .rule("approve", resolve)
        .rule("reject", resolve)
        // Re-homing a report's collectivity under another publisher is a
        // support operation, explicitly narrower than `manage`.
        .rule("assign_publisher", assign_publisher)
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

/// Whether the actor's organization drafted this report.
fn owner(ctx: &ActorContext<'_>, report: &Report) -> bool {
    (ctx.collectivity() && ctx.owns_organization(&report.collectivity_id))
        || (ctx.publisher()
            && report
                .publisher_id
                .as_ref()
                .is_some_and(|id| ctx.owns_organization(id)))
}

/// Whether the report was transmitted to the actor's DDFIP.
fn addressed_to(ctx: &ActorContext<'_>, report: &Report) -> bool {
    report.state.transmitted()
        && report
            .ddfip_id
            .as_ref()
            .is_some_and(|id| ctx.owns_organization(id))
}

fn manage(ctx: &ActorContext<'_>, target: Target<'_, Report>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => ctx.collectivity() || ctx.publisher(),
        // Reports freeze for the reporting side once transmitted.
        Some(report) => owner(ctx, report) && report.state.packing(),
    }
}

fn index(ctx: &ActorContext<'_>, _target: Target<'_, Report>) -> bool {
    !ctx.anonymous()
}

fn show(ctx: &ActorContext<'_>, target: Target<'_, Report>) -> bool {
    if ctx.super_admin() {
        return true;
    }
    match target.record() {
        None => !ctx.anonymous(),
        Some(report) => {
            owner(ctx, report)
                || (ctx.dgfip() && report.state.transmitted())
                || (ctx.ddfip_admin() && addressed_to(ctx, report))
                || (ctx.ddfip()
                    && report
                        .office_id
                        .as_ref()
                        .is_some_and(|id| ctx.member_of_office(id)))
        }
    }
}

fn create(ctx: &ActorContext<'_>, _target: Target<'_, Report>) -> bool {
    ctx.super_admin() || ctx.collectivity() || ctx.publisher()
}

fn transmit(ctx: &ActorContext<'_>, target: Target<'_, Report>) -> bool {
    match target.record() {
        None => ctx.collectivity() || ctx.publisher(),
        Some(report) => owner(ctx, report) && report.state == crate::domain::ReportState::Ready,
    }
}

fn assign_office(ctx: &ActorContext<'_>, target: Target<'_, Report>) -> bool {
    match target.record() {
        None => ctx.ddfip_admin(),
        Some(report) => ctx.ddfip_admin() && addressed_to(ctx, report),
    }
}

/// Approve or reject an assigned report.
fn resolve(ctx: &ActorContext<'_>, target: Target<'_, Report>) -> bool {
    match target.record() {
        None => ctx.ddfip_admin() || ctx.ddfip_form_admin(),
        Some(report) => {
            report.state.resolvable()
                && ((ctx.ddfip_admin() && addressed_to(ctx, report))
                    || (ctx.ddfip_form_admin()
                        && report
                            .office_id
                            .as_ref()
                            .is_some_and(|id| ctx.member_of_office(id))))
        }
    }
}

fn assign_publisher(ctx: &ActorContext<'_>, _target: Target<'_, Report>) -> bool {
    ctx.super_admin()
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope
// ─────────────────────────────────────────────────────────────────────────────

fn scope(ctx: &ActorContext<'_>, variant: ScopeVariant) -> ScopeSpec {
    let visible = if ctx.super_admin() {
        FilterExpr::All
    } else if ctx.dgfip() {
        FilterExpr::eq("transmitted", true)
    } else if ctx.publisher() {
        match ctx.organization_id() {
            Some(own) => FilterExpr::eq("publisher_id", own),
            None => FilterExpr::None,
        }
    } else {
        // The remaining roles group by viewer type for visibility.
        match ctx.viewer_type() {
            Some(ViewerType::Collectivity) => match ctx.organization_id() {
                Some(own) => FilterExpr::eq("collectivity_id", own),
                None => FilterExpr::None,
            },
            Some(ViewerType::DdfipAdmin) => match ctx.organization_id() {
                Some(own) => {
                    FilterExpr::eq("ddfip_id", own).and(FilterExpr::eq("transmitted", true))
                }
                None => FilterExpr::None,
            },
            Some(ViewerType::DdfipUser) => FilterExpr::any_of("office_id", ctx.office_ids()),
            None => FilterExpr::None,
        }
    };

    ScopeSpec::for_variant(visible, variant, None)
}

// ─────────────────────────────────────────────────────────────────────────────
// Params
// ─────────────────────────────────────────────────────────────────────────────

const SUPER_ADMIN_FIELDS: FieldWhitelist = FieldWhitelist::new(&[
    "form_type",
    "code_insee",
    "priority",
    "observations",
    "office_id",
]);

const REPORTER_FIELDS: FieldWhitelist =
    FieldWhitelist::new(&["form_type", "code_insee", "priority", "observations"]);

// The form type fixes which anomaly screens apply; it cannot change after
// creation.
const REPORTER_UPDATE_FIELDS: FieldWhitelist =
    FieldWhitelist::new(&["code_insee", "priority", "observations"]);

const DDFIP_ADMIN_FIELDS: FieldWhitelist = FieldWhitelist::new(&["office_id", "priority"]);

fn params(ctx: &ActorContext<'_>, variant: ParamsVariant) -> Option<&'static FieldWhitelist> {
    if ctx.super_admin() {
        return Some(&SUPER_ADMIN_FIELDS);
    }
    if ctx.collectivity() || ctx.publisher() {
        return Some(match variant {
            ParamsVariant::Default => &REPORTER_FIELDS,
            ParamsVariant::Update => &REPORTER_UPDATE_FIELDS,
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
