//! Passerelle CLI - inspect authorization policies against fixture data.
//!
//! Loads a YAML fixture bundle (actors and records) and answers policy
//! queries the way the portal's request handlers would: `check` for rule
//! decisions, `scope` for visibility listings, `params` for attribute
//! filtering, and `roles` for role resolution.

mod commands;
mod fixtures;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use passerelle_core::authz::{Gateway, PolicyRegistry};
use passerelle_core::config::Settings;
use passerelle_core::telemetry;

use commands::{check, params, roles, scope};
use fixtures::FixtureSet;
use output::OutputFormat;

/// Passerelle - authorization policy inspector
#[derive(Parser)]
#[command(
    name = "passerelle",
    version,
    about = "Passerelle - authorization policy inspector",
    long_about = "Run authorization queries (rule checks, visibility scopes, params \
                  filtering, role resolution) against a fixture bundle.",
    propagate_version = true
)]
pub struct Cli {
    /// Fixture bundle to query
    #[arg(short, long, global = true, env = "PASSERELLE_FIXTURES", default_value = "fixtures.yaml")]
    fixtures: PathBuf,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single authorization question
    Check(check::CheckArgs),

    /// List the records a user is entitled to see
    Scope(scope::ScopeArgs),

    /// Show what survives the params filter for a role
    Params(params::ParamsArgs),

    /// Show resolved role tags for fixture actors
    Roles(roles::RolesArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let settings = Settings::load().unwrap_or_default();
    telemetry::init_tracing(&settings.telemetry);

    let fixtures = FixtureSet::load(&cli.fixtures)?;
    let registry =
        Arc::new(PolicyRegistry::build().context("policy registry failed validation")?);
    let gateway = Gateway::with_settings(registry, settings.gateway);
    let format = cli.output;

    let result = match cli.command {
        Commands::Check(args) => check::execute(args, &fixtures, &gateway, format),
        Commands::Scope(args) => scope::execute(args, &fixtures, &gateway, format),
        Commands::Params(args) => params::execute(args, &fixtures, &gateway, format),
        Commands::Roles(args) => roles::execute(args, &fixtures, format),
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
