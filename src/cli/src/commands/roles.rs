//! `passerelle roles` — show resolved role tags for fixture actors.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use passerelle_core::authz::resolve;

use crate::fixtures::FixtureSet;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct RolesArgs {
    /// Only show this user
    #[arg(short, long)]
    pub user: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct RoleRow {
    id: String,
    name: String,
    organization: String,
    role: String,
    viewer_type: String,
}

pub fn execute(args: RolesArgs, fixtures: &FixtureSet, format: OutputFormat) -> Result<()> {
    let rows: Vec<RoleRow> = fixtures
        .actors
        .iter()
        .filter(|actor| {
            args.user
                .as_deref()
                .map_or(true, |id| actor.id.as_str() == id)
        })
        .map(|actor| {
            let role = resolve(Some(actor));
            RoleRow {
                id: actor.id.to_string(),
                name: actor.name.clone(),
                organization: format!(
                    "{} ({})",
                    actor.organization.id(),
                    actor.organization.kind()
                ),
                role: role.to_string(),
                viewer_type: role
                    .viewer_type()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            }
        })
        .collect();

    output::print_list(&rows, format);
    Ok(())
}
