//! `passerelle params` — show what survives the params filter for a role.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};

use passerelle_core::authz::{Gateway, Params, ParamsVariant};

use crate::fixtures::FixtureSet;
use crate::output::{self, OutputFormat};

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum ParamsVariantArg {
    #[default]
    Default,
    Update,
}

#[derive(Debug, Args)]
pub struct ParamsArgs {
    /// Acting user id from the fixtures (omit for anonymous)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Resource type the params are for (e.g. `users`)
    pub resource: String,

    /// Inline JSON object with the raw parameters
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,

    /// Read the raw parameters from a JSON file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Action variant
    #[arg(long, value_enum, default_value = "default")]
    pub variant: ParamsVariantArg,
}

pub fn execute(
    args: ParamsArgs,
    fixtures: &FixtureSet,
    gateway: &Gateway,
    format: OutputFormat,
) -> Result<()> {
    let actor = fixtures.actor(args.user.as_deref())?;
    let (resource, _) = super::parse_target(&args.resource)?;

    let raw_text = match (&args.json, &args.file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("cannot read params file {}", path.display()))?,
        (None, None) => bail!("provide raw parameters with --json or --file"),
    };
    let raw: Params = serde_json::from_str(&raw_text).context("raw parameters must be a JSON object")?;

    let variant = match args.variant {
        ParamsVariantArg::Default => ParamsVariant::Default,
        ParamsVariantArg::Update => ParamsVariant::Update,
    };

    match gateway.filtered_params_type(actor, resource, &raw, variant) {
        Some(filtered) => {
            let dropped: Vec<&String> =
                raw.keys().filter(|k| !filtered.contains_key(*k)).collect();
            if !dropped.is_empty() {
                output::print_denied(&format!(
                    "stripped: {}",
                    dropped
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            output::print_value(&filtered, format);
        }
        None => {
            output::print_denied(&format!(
                "{} may not set any {} field",
                args.user.as_deref().unwrap_or("anonymous"),
                args.resource
            ));
            std::process::exit(2);
        }
    }
    Ok(())
}
