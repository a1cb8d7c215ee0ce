//! The authenticated principal making a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{OfficeId, UserId};
use super::organization::Organization;

// ═══════════════════════════════════════════════════════════════════════════════
// Actor
// ═══════════════════════════════════════════════════════════════════════════════

/// An authenticated principal.
///
/// Actors are created by the invitation/registration flow and soft-discarded,
/// never deleted. The authorization core receives an already-authenticated
/// `Actor` from the session layer; `None` stands for an anonymous request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Unique identifier.
    pub id: UserId,

    /// Display name.
    pub name: String,

    /// The organization this actor belongs to (exactly one).
    pub organization: Organization,

    /// Administrator of the actor's own organization.
    #[serde(default)]
    pub organization_admin: bool,

    /// Platform-wide super administrator.
    #[serde(default)]
    pub super_admin: bool,

    /// Form administrator. Only meaningful for DDFIP members.
    #[serde(default)]
    pub form_admin: bool,

    /// DDFIP office memberships. Empty for non-DDFIP actors.
    #[serde(default)]
    pub office_ids: Vec<OfficeId>,

    /// Soft-delete timestamp.
    #[serde(default)]
    pub discarded_at: Option<DateTime<Utc>>,
}

impl Actor {
    /// Create an actor with no elevated flags.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, organization: Organization) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            organization,
            organization_admin: false,
            super_admin: false,
            form_admin: false,
            office_ids: Vec::new(),
            discarded_at: None,
        }
    }

    /// Mark as administrator of the actor's organization.
    pub fn organization_admin(mut self) -> Self {
        self.organization_admin = true;
        self
    }

    /// Mark as platform super administrator.
    pub fn super_admin(mut self) -> Self {
        self.super_admin = true;
        self
    }

    /// Mark as DDFIP form administrator.
    pub fn form_admin(mut self) -> Self {
        self.form_admin = true;
        self
    }

    /// Record DDFIP office memberships.
    pub fn in_offices(mut self, office_ids: impl IntoIterator<Item = OfficeId>) -> Self {
        self.office_ids = office_ids.into_iter().collect();
        self
    }

    pub fn is_kept(&self) -> bool {
        self.discarded_at.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
