//! Fixture bundles: a YAML snapshot of actors and records the CLI runs
//! policy queries against.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use passerelle_core::prelude::*;

/// A complete fixture set.
///
/// Every section is optional; missing sections are empty collections.
#[derive(Debug, Default, Deserialize)]
pub struct FixtureSet {
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub collectivities: Vec<Collectivity>,
    #[serde(default)]
    pub publishers: Vec<Publisher>,
    #[serde(default)]
    pub ddfips: Vec<Ddfip>,
    #[serde(default)]
    pub offices: Vec<Office>,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl FixtureSet {
    /// Load a fixture bundle from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read fixture file {}", path.display()))?;
        let fixtures: FixtureSet = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid fixture file {}", path.display()))?;
        Ok(fixtures)
    }

    /// Find an actor by id. `None` input means anonymous.
    pub fn actor(&self, id: Option<&str>) -> Result<Option<&Actor>> {
        match id {
            None => Ok(None),
            Some(id) => self
                .actors
                .iter()
                .find(|a| a.id.as_str() == id)
                .map(Some)
                .with_context(|| format!("no actor '{id}' in fixtures")),
        }
    }

    pub fn collectivity_store(&self) -> MemoryStore<Collectivity> {
        MemoryStore::from_rows(self.collectivities.clone())
    }

    pub fn publisher_store(&self) -> MemoryStore<Publisher> {
        MemoryStore::from_rows(self.publishers.clone())
    }

    pub fn ddfip_store(&self) -> MemoryStore<Ddfip> {
        MemoryStore::from_rows(self.ddfips.clone())
    }

    pub fn office_store(&self) -> MemoryStore<Office> {
        MemoryStore::from_rows(self.offices.clone())
    }

    pub fn package_store(&self) -> MemoryStore<Package> {
        MemoryStore::from_rows(self.packages.clone())
    }

    pub fn report_store(&self) -> MemoryStore<Report> {
        MemoryStore::from_rows(self.reports.clone())
    }

    pub fn user_store(&self) -> MemoryStore<User> {
        MemoryStore::from_rows(self.users.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
actors:
  - id: jeanne
    name: Jeanne
    organization: { kind: collectivity, id: bayonne, publisher_id: fiscalite-sa }
  - id: marie
    name: Marie
    organization: { kind: ddfip, id: ddfip-64 }
    organization_admin: true
reports:
  - id: r1
    collectivity_id: bayonne
    form_type: evaluation_local_habitation
    code_insee: "64102"
    state: draft
"#;

    #[test]
    fn test_parse_sample_fixtures() {
        let fixtures: FixtureSet = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(fixtures.actors.len(), 2);
        assert_eq!(fixtures.reports.len(), 1);
        assert!(fixtures.collectivities.is_empty());

        let marie = fixtures.actor(Some("marie")).unwrap().unwrap();
        assert!(marie.organization_admin);
        assert!(fixtures.actor(None).unwrap().is_none());
        assert!(fixtures.actor(Some("nobody")).is_err());
    }
}
