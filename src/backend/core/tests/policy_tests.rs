//! Integration tests for the authorization core's contract:
//! super-admin visibility, empty sentinels, alias transparency, params
//! whitelisting, decision idempotence, and the cross-role scenarios.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use passerelle_core::prelude::*;

// ============================================================================
// Fixtures
// ============================================================================

fn registry() -> Arc<PolicyRegistry> {
    Arc::new(PolicyRegistry::build().expect("default policy registry must build"))
}

fn gateway() -> Gateway {
    Gateway::new(registry())
}

fn super_admin() -> Actor {
    Actor::new("root", "Root", Organization::dgfip("dgfip")).super_admin()
}

fn collectivity_actor() -> Actor {
    Actor::new(
        "jeanne",
        "Jeanne",
        Organization::collectivity("bayonne", "fiscalite-sa"),
    )
}

fn publisher_admin() -> Actor {
    Actor::new("lea", "Lea", Organization::publisher("fiscalite-sa")).organization_admin()
}

fn ddfip_admin() -> Actor {
    Actor::new("marie", "Marie", Organization::ddfip("ddfip-64")).organization_admin()
}

fn report_store() -> MemoryStore<Report> {
    MemoryStore::from_rows(vec![
        Report::new("r1", "bayonne", "evaluation_local_habitation", "64102"),
        Report::new("r2", "anglet", "evaluation_local_habitation", "64024")
            .transmitted_to("ddfip-64"),
        Report::new("r3", "dax", "occupation_local_habitation", "40088")
            .transmitted_to("ddfip-40"),
        Report::new("r4", "bayonne", "occupation_local_habitation", "64102")
            .discarded(Utc::now()),
    ])
}

fn ddfip_store() -> MemoryStore<Ddfip> {
    MemoryStore::from_rows(vec![
        Ddfip::new("ddfip-64", "DDFIP des Pyrénées-Atlantiques", "64"),
        Ddfip::new("ddfip-40", "DDFIP des Landes", "40"),
        Ddfip::new("ddfip-closed", "DDFIP dissoute", "99").discarded(Utc::now()),
    ])
}

// ============================================================================
// Super-admin visibility
// ============================================================================

#[test]
fn test_super_admin_default_scope_is_unrestricted_kept_set() {
    let gateway = gateway();
    let actor = super_admin();

    for resource in ResourceType::ALL {
        let spec = gateway.scope_type(Some(&actor), resource, ScopeVariant::Default);
        assert_eq!(
            spec,
            ScopeSpec::all_kept(),
            "super admin must see all kept {resource} records"
        );
    }

    // Concretely: every kept report, none of the discarded ones.
    let spec = gateway.scope::<Report>(Some(&actor), ScopeVariant::Default);
    let store = report_store();
    let rows = store.select(&spec);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.is_kept()));
}

// ============================================================================
// Empty sentinel
// ============================================================================

#[test]
fn test_no_visibility_roles_get_the_empty_sentinel() {
    let gateway = gateway();

    // Scenario 1: a collectivity actor over the DDFIP type.
    let actor = collectivity_actor();
    let spec = gateway.scope::<Ddfip>(Some(&actor), ScopeVariant::Default);
    assert!(spec.is_none());
    assert!(ddfip_store().select(&spec).is_empty());

    // Anonymous over everything.
    for resource in ResourceType::ALL {
        let spec = gateway.scope_type(None, resource, ScopeVariant::Default);
        assert!(spec.is_none(), "anonymous must not see {resource} records");
    }
}

#[test]
fn test_empty_sentinel_never_degrades_to_all_rows() {
    let gateway = gateway();
    let actor = collectivity_actor();

    let spec = gateway.scope::<Ddfip>(Some(&actor), ScopeVariant::Default);
    let store = ddfip_store();
    assert_eq!(store.count(&spec), 0);
    assert!(store.len() > 0);
}

// ============================================================================
// Alias transparency
// ============================================================================

#[test]
fn test_alias_transparency_for_every_role() {
    let gateway = gateway();
    let report = Report::new("r1", "bayonne", "evaluation_local_habitation", "64102");

    let actors = [
        None,
        Some(super_admin()),
        Some(collectivity_actor()),
        Some(publisher_admin()),
        Some(ddfip_admin()),
    ];

    for actor in &actors {
        let actor = actor.as_ref();

        // Scenario 4: `new` is an alias of `create`, class-level.
        assert_eq!(
            gateway.authorize::<Report>(actor, Target::Class, "new"),
            gateway.authorize::<Report>(actor, Target::Class, "create"),
        );

        // Instance-level aliases resolve identically too.
        assert_eq!(
            gateway.authorize(actor, Target::Record(&report), "edit"),
            gateway.authorize(actor, Target::Record(&report), "update"),
        );
        assert_eq!(
            gateway.authorize(actor, Target::Record(&report), "remove"),
            gateway.authorize(actor, Target::Record(&report), "destroy"),
        );
    }
}

// ============================================================================
// Params filtering
// ============================================================================

#[test]
fn test_filtered_params_output_is_subset_of_whitelist() {
    let gateway = gateway();

    let raw: Params = json!({
        "first_name": "Marc",
        "last_name": "Duhau",
        "email": "marc@dgfip.finances.gouv.fr",
        "organization_admin": "true",
        "organization_id": "bayonne",
        "super_admin": true,
        "unknown_field": 42,
    })
    .as_object()
    .unwrap()
    .clone();

    let actors = [
        Some(super_admin()),
        Some(collectivity_actor()),
        Some(publisher_admin()),
        Some(ddfip_admin()),
        None,
    ];

    for actor in &actors {
        for variant in [ParamsVariant::Default, ParamsVariant::Update] {
            let Some(filtered) =
                gateway.filtered_params::<User>(actor.as_ref(), &raw, variant)
            else {
                continue;
            };
            // Every surviving key came from the input and is whitelisted;
            // the unknown field never survives.
            assert!(filtered.keys().all(|k| raw.contains_key(k)));
            assert!(!filtered.contains_key("unknown_field"));
        }
    }
}

#[test]
fn test_ddfip_admin_cannot_grant_privileges_via_params() {
    // Scenario 3: a DDFIP admin submits organization_admin/organization_id
    // for a user it does not manage. The whitelist excludes both entirely.
    let gateway = gateway();
    let actor = ddfip_admin();

    let raw: Params = json!({
        "organization_admin": "true",
        "organization_id": "bayonne",
    })
    .as_object()
    .unwrap()
    .clone();

    let filtered = gateway
        .filtered_params::<User>(Some(&actor), &raw, ParamsVariant::Update)
        .expect("ddfip admins may edit their own users");
    assert!(filtered.is_empty());

    // And the cross-tenant mutation itself is denied at the rule level.
    let foreign = User::new(
        "jeanne",
        OrganizationKind::Collectivity,
        "bayonne",
        "jeanne@bayonne.fr",
    );
    assert!(!gateway.authorize(Some(&actor), Target::Record(&foreign), "update"));
}

#[test]
fn test_unmatched_role_params_are_refused_not_empty() {
    let gateway = gateway();
    let actor = collectivity_actor(); // not an organization admin

    let raw: Params = json!({"email": "x@example.fr"}).as_object().unwrap().clone();
    assert_eq!(
        gateway.filtered_params::<User>(Some(&actor), &raw, ParamsVariant::Default),
        None
    );
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_authorize_is_idempotent_cached_and_uncached() {
    let actor = collectivity_actor();
    let report = Report::new("r1", "bayonne", "evaluation_local_habitation", "64102");

    // Cached: same gateway, repeated calls.
    let cached = gateway();
    let first = cached.authorize(Some(&actor), Target::Record(&report), "update");
    let second = cached.authorize(Some(&actor), Target::Record(&report), "update");
    assert_eq!(first, second);

    // Uncached: a fresh gateway with caching disabled gives the same
    // answer for the same (actor, resource, rule).
    let settings = GatewaySettings {
        cache_decisions: false,
        ..GatewaySettings::default()
    };
    let uncached = Gateway::with_settings(registry(), settings);
    assert_eq!(
        uncached.authorize(Some(&actor), Target::Record(&report), "update"),
        first
    );
}

// ============================================================================
// Destroyable / undiscardable variants
// ============================================================================

#[test]
fn test_publisher_admin_destroyable_scope_scenario() {
    // Scenario 2: exclude_current is a no-op over collectivities (a
    // publisher's own row cannot appear there)...
    let gateway = gateway();
    let actor = publisher_admin();

    let own_collectivity = Collectivity::new("bayonne", "fiscalite-sa", "Bayonne", "217640102");
    let spec = gateway.scope::<Collectivity>(Some(&actor), ScopeVariant::destroyable());
    assert!(spec.matches(&own_collectivity));

    // ...but over publishers it excludes the actor's own organization,
    // unless exclude_current is turned off.
    let own_publisher = Publisher::new("fiscalite-sa", "Fiscalite SA", "51234567800012");
    let spec = gateway.scope::<Publisher>(Some(&actor), ScopeVariant::destroyable());
    assert!(!spec.matches(&own_publisher));

    let spec = gateway.scope::<Publisher>(
        Some(&actor),
        ScopeVariant::Destroyable {
            exclude_current: false,
        },
    );
    assert!(spec.matches(&own_publisher));
}

#[test]
fn test_undiscardable_is_the_logical_complement() {
    let gateway = gateway();
    let actor = super_admin();
    let store = report_store();

    let default = gateway.scope::<Report>(Some(&actor), ScopeVariant::Default);
    let undiscardable = gateway.scope::<Report>(Some(&actor), ScopeVariant::Undiscardable);

    let kept = store.count(&default);
    let discarded = store.count(&undiscardable);
    assert_eq!(kept + discarded, store.len());
    assert!(store
        .select(&undiscardable)
        .iter()
        .all(|r| r.is_discarded()));
}

// ============================================================================
// Catch-all override (Scenario 5)
// ============================================================================

#[test]
fn test_explicit_rule_overrides_manage_catchall() {
    let gateway = gateway();

    // `manage` is true for a collectivity actor at class level...
    let actor = collectivity_actor();
    assert!(gateway.authorize::<Report>(Some(&actor), Target::Class, MANAGE));
    // ...but the explicit assign_publisher rule still denies it.
    assert!(!gateway.authorize::<Report>(Some(&actor), Target::Class, "assign_publisher"));

    // Super admins pass both.
    let root = super_admin();
    assert!(gateway.authorize::<Report>(Some(&root), Target::Class, MANAGE));
    assert!(gateway.authorize::<Report>(Some(&root), Target::Class, "assign_publisher"));
}

// ============================================================================
// Scoped listings end to end
// ============================================================================

#[test]
fn test_ddfip_admin_listing_sees_only_transmitted_reports_for_its_ddfip() {
    let gateway = gateway();
    let actor = ddfip_admin();
    let store = report_store();

    let spec = gateway.scope::<Report>(Some(&actor), ScopeVariant::Default);
    let rows = store.select(&spec);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].resource_id(), "r2");
}

#[test]
fn test_collectivity_listing_sees_only_its_own_reports() {
    let gateway = gateway();
    let actor = collectivity_actor();
    let store = report_store();

    let spec = gateway.scope::<Report>(Some(&actor), ScopeVariant::Default);
    let rows = store.select(&spec);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].resource_id(), "r1");
}

#[test]
fn test_row_level_checks_agree_with_the_scope() {
    // The per-row `show` rule and the listing scope never disagree for
    // DDFIP admins over the fixture set.
    let gateway = gateway();
    let actor = ddfip_admin();
    let store = report_store();

    let spec = gateway.scope::<Report>(Some(&actor), ScopeVariant::Default);
    for report in store.select(&ScopeSpec::all_kept()) {
        assert_eq!(
            spec.matches(report),
            gateway.authorize(Some(&actor), Target::Record(report), "show"),
            "scope and show disagree on {}",
            report.resource_id()
        );
    }
}
