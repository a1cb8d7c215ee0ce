//! `passerelle check` — answer a single authorization question.

use anyhow::{Context, Result};
use clap::Args;

use passerelle_core::authz::{Gateway, Target};
use passerelle_core::domain::{Actor, ResourceType};

use crate::fixtures::FixtureSet;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Acting user id from the fixtures (omit for anonymous)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Target: `<resource>` for class-level checks, `<resource>:<id>` for a
    /// record (e.g. `reports`, `report:r1`)
    pub target: String,

    /// Rule name (e.g. index, show, update, destroy, transmit)
    pub rule: String,
}

pub fn execute(
    args: CheckArgs,
    fixtures: &FixtureSet,
    gateway: &Gateway,
    _format: OutputFormat,
) -> Result<()> {
    let actor = fixtures.actor(args.user.as_deref())?;
    let (resource, id) = super::parse_target(&args.target)?;

    let allowed = match id {
        None => gateway.authorize_type(actor, resource, &args.rule),
        Some(id) => authorize_record(gateway, fixtures, actor, resource, id, &args.rule)?,
    };

    let who = args.user.as_deref().unwrap_or("anonymous");
    if allowed {
        output::print_success(&format!("{} may {} {}", who, args.rule, args.target));
    } else {
        output::print_denied(&format!("{} may not {} {}", who, args.rule, args.target));
        std::process::exit(2);
    }
    Ok(())
}

fn authorize_record(
    gateway: &Gateway,
    fixtures: &FixtureSet,
    actor: Option<&Actor>,
    resource: ResourceType,
    id: &str,
    rule: &str,
) -> Result<bool> {
    let missing = || format!("no {resource} '{id}' in fixtures");

    Ok(match resource {
        ResourceType::Collectivity => {
            let store = fixtures.collectivity_store();
            let record = store.find(id).with_context(missing)?;
            gateway.authorize(actor, Target::Record(record), rule)
        }
        ResourceType::Publisher => {
            let store = fixtures.publisher_store();
            let record = store.find(id).with_context(missing)?;
            gateway.authorize(actor, Target::Record(record), rule)
        }
        ResourceType::Ddfip => {
            let store = fixtures.ddfip_store();
            let record = store.find(id).with_context(missing)?;
            gateway.authorize(actor, Target::Record(record), rule)
        }
        ResourceType::Office => {
            let store = fixtures.office_store();
            let record = store.find(id).with_context(missing)?;
            gateway.authorize(actor, Target::Record(record), rule)
        }
        ResourceType::Package => {
            let store = fixtures.package_store();
            let record = store.find(id).with_context(missing)?;
            gateway.authorize(actor, Target::Record(record), rule)
        }
        ResourceType::Report => {
            let store = fixtures.report_store();
            let record = store.find(id).with_context(missing)?;
            gateway.authorize(actor, Target::Record(record), rule)
        }
        ResourceType::User => {
            let store = fixtures.user_store();
            let record = store.find(id).with_context(missing)?;
            gateway.authorize(actor, Target::Record(record), rule)
        }
    })
}
