//! `passerelle scope` — list the records a user is entitled to see.

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use tabled::Tabled;

use passerelle_core::authz::{Gateway, ScopeVariant};
use passerelle_core::domain::{Resource, ResourceType};
use passerelle_core::store::MemoryStore;

use crate::fixtures::FixtureSet;
use crate::output::{self, OutputFormat};

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum VariantArg {
    #[default]
    Default,
    Destroyable,
    Undiscardable,
}

#[derive(Debug, Args)]
pub struct ScopeArgs {
    /// Acting user id from the fixtures (omit for anonymous)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Resource type to list (e.g. `reports`, `collectivities`)
    pub resource: String,

    /// Scope variant
    #[arg(long, value_enum, default_value = "default")]
    pub variant: VariantArg,

    /// With `--variant destroyable`: keep the actor's own record in scope
    #[arg(long)]
    pub include_current: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct ScopeRow {
    id: String,
    details: String,
}

pub fn execute(
    args: ScopeArgs,
    fixtures: &FixtureSet,
    gateway: &Gateway,
    format: OutputFormat,
) -> Result<()> {
    let actor = fixtures.actor(args.user.as_deref())?;
    let (resource, _) = super::parse_target(&args.resource)?;

    let variant = match args.variant {
        VariantArg::Default => ScopeVariant::Default,
        VariantArg::Destroyable => ScopeVariant::Destroyable {
            exclude_current: !args.include_current,
        },
        VariantArg::Undiscardable => ScopeVariant::Undiscardable,
    };

    let spec = gateway.scope_type(actor, resource, variant);
    if spec.is_none() {
        output::print_denied(&format!(
            "{} has no visibility into {}",
            args.user.as_deref().unwrap_or("anonymous"),
            args.resource
        ));
        return Ok(());
    }

    let rows = collect_rows(fixtures, resource, &spec);
    output::print_list(&rows, format);
    Ok(())
}

fn collect_rows(
    fixtures: &FixtureSet,
    resource: ResourceType,
    spec: &passerelle_core::authz::ScopeSpec,
) -> Vec<ScopeRow> {
    fn rows<R: Resource>(
        store: &MemoryStore<R>,
        spec: &passerelle_core::authz::ScopeSpec,
        describe: impl Fn(&R) -> String,
    ) -> Vec<ScopeRow> {
        store
            .select(spec)
            .into_iter()
            .map(|record| ScopeRow {
                id: record.resource_id(),
                details: describe(record),
            })
            .collect()
    }

    match resource {
        ResourceType::Collectivity => rows(&fixtures.collectivity_store(), spec, |c| {
            format!("{} (publisher {})", c.name, c.publisher_id)
        }),
        ResourceType::Publisher => rows(&fixtures.publisher_store(), spec, |p| p.name.clone()),
        ResourceType::Ddfip => rows(&fixtures.ddfip_store(), spec, |d| {
            format!("{} ({})", d.name, d.code_departement)
        }),
        ResourceType::Office => rows(&fixtures.office_store(), spec, |o| {
            format!("{} (ddfip {})", o.name, o.ddfip_id)
        }),
        ResourceType::Package => rows(&fixtures.package_store(), spec, |p| {
            let status = if p.transmitted() { "transmitted" } else { "packing" };
            format!("{} [{}]", p.reference, status)
        }),
        ResourceType::Report => rows(&fixtures.report_store(), spec, |r| {
            format!("{} / {} [{}]", r.form_type, r.code_insee, r.state)
        }),
        ResourceType::User => rows(&fixtures.user_store(), spec, |u| {
            format!("{} {} <{}>", u.first_name, u.last_name, u.email)
        }),
    }
}
