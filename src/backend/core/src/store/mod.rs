//! In-memory persistence adapter interpreting scope specifications.
//!
//! The core never runs queries itself: scope builders return a
//! [`ScopeSpec`] and an adapter interprets it against its collection. This
//! in-memory adapter backs tests, fixtures, and the CLI; a real datastore
//! adapter would translate the same specification into its query language.
//!
//! The empty sentinel short-circuits before any row is visited: a
//! no-access scope can never degrade into a full scan.

use crate::authz::ScopeSpec;
use crate::domain::Resource;

// ═══════════════════════════════════════════════════════════════════════════════
// MemoryStore
// ═══════════════════════════════════════════════════════════════════════════════

/// A flat collection of records of one type.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore<R> {
    rows: Vec<R>,
}

impl<R: Resource> MemoryStore<R> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn insert(&mut self, row: R) {
        self.rows.push(row);
    }

    /// Total rows, kept and discarded.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows matching the scope, in insertion order.
    pub fn select(&self, spec: &ScopeSpec) -> Vec<&R> {
        if spec.is_none() {
            return Vec::new();
        }
        self.rows.iter().filter(|row| spec.matches(*row)).collect()
    }

    /// Number of rows the scope admits.
    pub fn count(&self, spec: &ScopeSpec) -> usize {
        if spec.is_none() {
            return 0;
        }
        self.rows.iter().filter(|row| spec.matches(*row)).count()
    }

    /// Find one row by identity, ignoring scopes. Callers must still
    /// authorize the record itself.
    pub fn find(&self, id: &str) -> Option<&R> {
        self.rows.iter().find(|row| row.resource_id() == id)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::FilterExpr;
    use crate::domain::{OrganizationId, Report};
    use chrono::Utc;

    fn store() -> MemoryStore<Report> {
        MemoryStore::from_rows(vec![
            Report::new("r1", "bayonne", "evaluation_local_habitation", "64102"),
            Report::new("r2", "anglet", "evaluation_local_habitation", "64024"),
            Report::new("r3", "bayonne", "occupation_local_habitation", "64102")
                .discarded(Utc::now()),
        ])
    }

    #[test]
    fn test_empty_sentinel_yields_zero_rows() {
        let store = store();
        assert!(store.select(&ScopeSpec::none()).is_empty());
        assert_eq!(store.count(&ScopeSpec::none()), 0);
    }

    #[test]
    fn test_default_scope_excludes_discarded() {
        let store = store();
        let spec = ScopeSpec::kept(FilterExpr::eq(
            "collectivity_id",
            &OrganizationId::new("bayonne"),
        ));
        let rows = store.select(&spec);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].resource_id(), "r1");
    }

    #[test]
    fn test_all_kept() {
        let store = store();
        assert_eq!(store.count(&ScopeSpec::all_kept()), 2);
    }

    #[test]
    fn test_find_ignores_scope() {
        let store = store();
        assert!(store.find("r3").is_some());
        assert!(store.find("r9").is_none());
    }
}
