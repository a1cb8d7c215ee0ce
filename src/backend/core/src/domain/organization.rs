//! Organizations: the tenant entities actors belong to.
//!
//! An organization is exactly one of four kinds. Collectivities are owned by
//! a publisher (the software vendor transmitting on their behalf); DDFIPs are
//! departmental fiscal administrations; the DGFIP is a singleton national
//! administration.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::OrganizationId;

// ═══════════════════════════════════════════════════════════════════════════════
// OrganizationKind
// ═══════════════════════════════════════════════════════════════════════════════

/// The kind discriminant of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationKind {
    Collectivity,
    Publisher,
    Ddfip,
    Dgfip,
}

impl OrganizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collectivity => "collectivity",
            Self::Publisher => "publisher",
            Self::Ddfip => "ddfip",
            Self::Dgfip => "dgfip",
        }
    }
}

impl fmt::Display for OrganizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Organization
// ═══════════════════════════════════════════════════════════════════════════════

/// The tenant an actor belongs to.
///
/// Effective permissions are always a pure function of the actor's flags,
/// the organization kind, the organization identity, and the target record —
/// nothing here is mutable per-request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Organization {
    Collectivity {
        id: OrganizationId,
        /// The publisher transmitting on this collectivity's behalf.
        publisher_id: OrganizationId,
    },
    Publisher {
        id: OrganizationId,
    },
    Ddfip {
        id: OrganizationId,
    },
    Dgfip {
        id: OrganizationId,
    },
}

impl Organization {
    pub fn collectivity(id: impl Into<OrganizationId>, publisher_id: impl Into<OrganizationId>) -> Self {
        Self::Collectivity {
            id: id.into(),
            publisher_id: publisher_id.into(),
        }
    }

    pub fn publisher(id: impl Into<OrganizationId>) -> Self {
        Self::Publisher { id: id.into() }
    }

    pub fn ddfip(id: impl Into<OrganizationId>) -> Self {
        Self::Ddfip { id: id.into() }
    }

    pub fn dgfip(id: impl Into<OrganizationId>) -> Self {
        Self::Dgfip { id: id.into() }
    }

    /// The organization's identity.
    pub fn id(&self) -> &OrganizationId {
        match self {
            Self::Collectivity { id, .. }
            | Self::Publisher { id }
            | Self::Ddfip { id }
            | Self::Dgfip { id } => id,
        }
    }

    /// The kind discriminant.
    pub fn kind(&self) -> OrganizationKind {
        match self {
            Self::Collectivity { .. } => OrganizationKind::Collectivity,
            Self::Publisher { .. } => OrganizationKind::Publisher,
            Self::Ddfip { .. } => OrganizationKind::Ddfip,
            Self::Dgfip { .. } => OrganizationKind::Dgfip,
        }
    }

    /// The owning publisher, for collectivities.
    pub fn publisher_id(&self) -> Option<&OrganizationId> {
        match self {
            Self::Collectivity { publisher_id, .. } => Some(publisher_id),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_discriminant() {
        let org = Organization::collectivity("bayonne", "fiscalite-sa");
        assert_eq!(org.kind(), OrganizationKind::Collectivity);
        assert_eq!(org.id().as_str(), "bayonne");
        assert_eq!(org.publisher_id().unwrap().as_str(), "fiscalite-sa");

        let org = Organization::ddfip("ddfip-64");
        assert_eq!(org.kind(), OrganizationKind::Ddfip);
        assert!(org.publisher_id().is_none());
    }

    #[test]
    fn test_serde_tagged_kind() {
        let org = Organization::publisher("fiscalite-sa");
        let json = serde_json::to_string(&org).unwrap();
        assert!(json.contains("\"kind\":\"publisher\""));

        let back: Organization = serde_json::from_str(&json).unwrap();
        assert_eq!(back, org);
    }
}
