//! CLI subcommands.

pub mod check;
pub mod params;
pub mod roles;
pub mod scope;

use anyhow::{bail, Result};
use passerelle_core::domain::ResourceType;

/// Parse a target argument: `<resource>` or `<resource>:<id>`.
pub fn parse_target(raw: &str) -> Result<(ResourceType, Option<&str>)> {
    let (resource, id) = match raw.split_once(':') {
        Some((resource, id)) if !id.is_empty() => (resource, Some(id)),
        Some((_, _)) => bail!("empty record id in target '{raw}'"),
        None => (raw, None),
    };
    let resource: ResourceType = resource.parse().map_err(anyhow::Error::msg)?;
    Ok((resource, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(
            parse_target("reports").unwrap(),
            (ResourceType::Report, None)
        );
        assert_eq!(
            parse_target("report:r1").unwrap(),
            (ResourceType::Report, Some("r1"))
        );
        assert!(parse_target("report:").is_err());
        assert!(parse_target("widgets").is_err());
    }
}
