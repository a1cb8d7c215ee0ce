//! Relation scoping: explicit filter specifications instead of live query
//! chaining.
//!
//! Scope builders produce a [`ScopeSpec`] value — a small expression tree a
//! persistence adapter interprets — so the core stays storage-agnostic and
//! testable without a datastore. The empty sentinel is load-bearing: a role
//! with no visibility gets [`ScopeSpec::none`], and interpreting it must
//! yield zero rows, never the unrestricted set.

use serde::Serialize;
use std::fmt;

use crate::domain::{FieldValue, Resource};

// ═══════════════════════════════════════════════════════════════════════════════
// ScopeVariant
// ═══════════════════════════════════════════════════════════════════════════════

/// Named scope variant requested by a caller.
///
/// `Destroyable` and `Undiscardable` compose on top of the default variant:
/// same visibility expression, different selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeVariant {
    Default,
    Destroyable { exclude_current: bool },
    Undiscardable,
}

impl ScopeVariant {
    /// The `destroyable` variant with its default `exclude_current: true`.
    pub fn destroyable() -> Self {
        Self::Destroyable {
            exclude_current: true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Destroyable { .. } => "destroyable",
            Self::Undiscardable => "undiscardable",
        }
    }
}

impl Default for ScopeVariant {
    fn default() -> Self {
        Self::Default
    }
}

impl fmt::Display for ScopeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FilterExpr
// ═══════════════════════════════════════════════════════════════════════════════

/// Visibility expression over record fields.
///
/// `None` is the null-collection sentinel; the constructors absorb it so a
/// denied branch can never silently widen a composed expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpr {
    /// No visibility at all. Matches nothing.
    None,
    /// Unrestricted visibility. Matches everything.
    All,
    /// Field equals value.
    Eq(&'static str, FieldValue),
    /// Field is one of the values. Empty value lists match nothing.
    In(&'static str, Vec<FieldValue>),
    Not(Box<FilterExpr>),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    pub fn eq(field: &'static str, value: impl Into<FieldValue>) -> Self {
        Self::Eq(field, value.into())
    }

    pub fn any_of<V: Into<FieldValue>>(
        field: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<FieldValue> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            Self::None
        } else {
            Self::In(field, values)
        }
    }

    /// Conjunction. `None` absorbs; `All` is the identity.
    pub fn and(self, other: FilterExpr) -> Self {
        match (self, other) {
            (Self::None, _) | (_, Self::None) => Self::None,
            (Self::All, other) => other,
            (expr, Self::All) => expr,
            (Self::And(mut terms), other) => {
                terms.push(other);
                Self::And(terms)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    /// Union. `None` is the identity; `All` absorbs.
    pub fn or(self, other: FilterExpr) -> Self {
        match (self, other) {
            (Self::None, other) => other,
            (expr, Self::None) => expr,
            (Self::All, _) | (_, Self::All) => Self::All,
            (Self::Or(mut branches), other) => {
                branches.push(other);
                Self::Or(branches)
            }
            (a, b) => Self::Or(vec![a, b]),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Evaluate the expression against a record.
    pub fn matches<R: Resource>(&self, record: &R) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Eq(field, value) => {
                // Null never equals anything, including Null: an absent
                // foreign key matches no ownership filter.
                let actual = record.field(field);
                actual != FieldValue::Null && actual == *value
            }
            Self::In(field, values) => {
                let actual = record.field(field);
                actual != FieldValue::Null && values.contains(&actual)
            }
            Self::Not(inner) => !inner.matches(record),
            Self::And(terms) => terms.iter().all(|t| t.matches(record)),
            Self::Or(branches) => branches.iter().any(|b| b.matches(record)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DeletionFilter
// ═══════════════════════════════════════════════════════════════════════════════

/// Soft-delete selection applied on top of the visibility expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionFilter {
    /// Only kept (not soft-deleted) records.
    Kept,
    /// Only soft-deleted records (the `undiscardable` complement).
    Discarded,
    /// No soft-delete constraint.
    Any,
}

impl DeletionFilter {
    pub fn admits<R: Resource>(&self, record: &R) -> bool {
        match self {
            Self::Kept => record.is_kept(),
            Self::Discarded => record.is_discarded(),
            Self::Any => true,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ScopeSpec
// ═══════════════════════════════════════════════════════════════════════════════

/// A complete scope: visibility expression plus soft-delete selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeSpec {
    pub expr: FilterExpr,
    pub deletion: DeletionFilter,
}

impl ScopeSpec {
    /// The null-collection sentinel: no access, zero rows.
    pub fn none() -> Self {
        Self {
            expr: FilterExpr::None,
            deletion: DeletionFilter::Kept,
        }
    }

    /// All kept records, unrestricted (the super-admin default scope).
    pub fn all_kept() -> Self {
        Self::kept(FilterExpr::All)
    }

    /// Kept records matching `expr`.
    pub fn kept(expr: FilterExpr) -> Self {
        Self {
            expr,
            deletion: DeletionFilter::Kept,
        }
    }

    /// Soft-deleted records matching `expr`.
    pub fn discarded(expr: FilterExpr) -> Self {
        Self {
            expr,
            deletion: DeletionFilter::Discarded,
        }
    }

    /// Whether this is the no-access sentinel.
    pub fn is_none(&self) -> bool {
        self.expr.is_none()
    }

    /// Narrow the scope by excluding records whose `field` equals `value`
    /// (the `exclude_current` composition on `destroyable` scopes).
    pub fn excluding(mut self, field: &'static str, value: impl Into<FieldValue>) -> Self {
        self.expr = self
            .expr
            .and(FilterExpr::Not(Box::new(FilterExpr::eq(field, value))));
        self
    }

    /// Evaluate the full scope against a record.
    pub fn matches<R: Resource>(&self, record: &R) -> bool {
        !self.is_none() && self.deletion.admits(record) && self.expr.matches(record)
    }

    /// Build the requested variant from a visibility expression.
    ///
    /// `current` is the identity (under the `id` field) of the actor's own
    /// row in this collection, when one can appear there; `destroyable`
    /// excludes it by default. When the actor's identity cannot appear in
    /// the collection, pass `None` and the exclusion is a no-op.
    pub fn for_variant(
        visible: FilterExpr,
        variant: ScopeVariant,
        current: Option<FieldValue>,
    ) -> Self {
        match variant {
            ScopeVariant::Default => Self::kept(visible),
            ScopeVariant::Destroyable { exclude_current } => {
                let spec = Self::kept(visible);
                match current {
                    Some(value) if exclude_current => spec.excluding("id", value),
                    _ => spec,
                }
            }
            ScopeVariant::Undiscardable => Self::discarded(visible),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
