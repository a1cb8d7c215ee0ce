//! Role resolution: collapsing an actor's flags and organization kind into a
//! single canonical role tag.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Actor, OfficeId, Organization, OrganizationId, OrganizationKind, UserId};

// ═══════════════════════════════════════════════════════════════════════════════
// RoleTag
// ═══════════════════════════════════════════════════════════════════════════════

/// The canonical permission role of an actor.
///
/// Every valid actor maps to exactly one tag; an absent actor maps to
/// [`RoleTag::Anonymous`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTag {
    Anonymous,
    Collectivity,
    Publisher,
    PublisherAdmin,
    DdfipUser,
    DdfipAdmin,
    DdfipFormAdmin,
    Dgfip,
    SuperAdmin,
}

impl RoleTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Collectivity => "collectivity",
            Self::Publisher => "publisher",
            Self::PublisherAdmin => "publisher_admin",
            Self::DdfipUser => "ddfip_user",
            Self::DdfipAdmin => "ddfip_admin",
            Self::DdfipFormAdmin => "ddfip_form_admin",
            Self::Dgfip => "dgfip",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Coarser visibility grouping, for roles whose several tags share
    /// visibility semantics (used by visibility-scoped search).
    pub fn viewer_type(&self) -> Option<ViewerType> {
        match self {
            Self::Collectivity => Some(ViewerType::Collectivity),
            Self::DdfipUser | Self::DdfipFormAdmin => Some(ViewerType::DdfipUser),
            Self::DdfipAdmin => Some(ViewerType::DdfipAdmin),
            _ => None,
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse visibility classification shared by several role tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerType {
    Collectivity,
    DdfipUser,
    DdfipAdmin,
}

impl ViewerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collectivity => "collectivity",
            Self::DdfipUser => "ddfip_user",
            Self::DdfipAdmin => "ddfip_admin",
        }
    }
}

impl fmt::Display for ViewerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resolution
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolve an actor to its canonical role tag.
///
/// Pure and total: the super-admin flag wins over everything; otherwise the
/// organization kind sets the base role, the organization-admin flag upgrades
/// DDFIP and Publisher members to their `_admin` variant, and the form-admin
/// flag upgrades `ddfip_user` only when not already admin.
pub fn resolve(actor: Option<&Actor>) -> RoleTag {
    let Some(actor) = actor else {
        return RoleTag::Anonymous;
    };

    if actor.super_admin {
        return RoleTag::SuperAdmin;
    }

    match actor.organization.kind() {
        OrganizationKind::Collectivity => RoleTag::Collectivity,
        OrganizationKind::Publisher => {
            if actor.organization_admin {
                RoleTag::PublisherAdmin
            } else {
                RoleTag::Publisher
            }
        }
        OrganizationKind::Ddfip => {
            if actor.organization_admin {
                RoleTag::DdfipAdmin
            } else if actor.form_admin {
                RoleTag::DdfipFormAdmin
            } else {
                RoleTag::DdfipUser
            }
        }
        OrganizationKind::Dgfip => RoleTag::Dgfip,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ActorContext
// ═══════════════════════════════════════════════════════════════════════════════

/// An actor together with its resolved role, as seen by rule predicates,
/// scope builders, and params filters.
///
/// Every predicate helper is total: asking a question that does not apply to
/// the actor's organization kind answers `false` rather than failing (e.g.
/// [`ActorContext::ddfip_admin`] on a publisher-affiliated actor).
#[derive(Debug, Clone, Copy)]
pub struct ActorContext<'a> {
    actor: Option<&'a Actor>,
    role: RoleTag,
}

impl<'a> ActorContext<'a> {
    /// Resolve the role once and capture the actor for predicate access.
    pub fn resolve(actor: Option<&'a Actor>) -> Self {
        Self {
            actor,
            role: resolve(actor),
        }
    }

    pub fn actor(&self) -> Option<&'a Actor> {
        self.actor
    }

    pub fn role(&self) -> RoleTag {
        self.role
    }

    pub fn viewer_type(&self) -> Option<ViewerType> {
        self.role.viewer_type()
    }

    pub fn user_id(&self) -> Option<&'a UserId> {
        self.actor.map(|a| &a.id)
    }

    pub fn organization(&self) -> Option<&'a Organization> {
        self.actor.map(|a| &a.organization)
    }

    pub fn organization_id(&self) -> Option<&'a OrganizationId> {
        self.organization().map(Organization::id)
    }

    pub fn organization_kind(&self) -> Option<OrganizationKind> {
        self.organization().map(Organization::kind)
    }

    /// DDFIP office memberships; empty for non-DDFIP actors.
    pub fn office_ids(&self) -> &'a [OfficeId] {
        self.actor.map_or(&[], |a| a.office_ids.as_slice())
    }

    /// Whether `id` is the actor's own organization.
    pub fn owns_organization(&self, id: &OrganizationId) -> bool {
        self.organization_id() == Some(id)
    }

    /// Whether `id` is one of the actor's office memberships.
    pub fn member_of_office(&self, id: &OfficeId) -> bool {
        self.office_ids().contains(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Role predicates
    // ─────────────────────────────────────────────────────────────────────────

    pub fn anonymous(&self) -> bool {
        self.role == RoleTag::Anonymous
    }

    pub fn super_admin(&self) -> bool {
        self.role == RoleTag::SuperAdmin
    }

    /// The organization-admin flag, whatever the organization kind.
    pub fn organization_admin(&self) -> bool {
        self.actor.is_some_and(|a| a.organization_admin)
    }

    pub fn collectivity(&self) -> bool {
        self.role == RoleTag::Collectivity
    }

    /// Publisher-affiliated, admin or not.
    pub fn publisher(&self) -> bool {
        matches!(self.role, RoleTag::Publisher | RoleTag::PublisherAdmin)
    }

    pub fn publisher_admin(&self) -> bool {
        self.role == RoleTag::PublisherAdmin
    }

    /// DDFIP-affiliated, whatever the narrower role.
    pub fn ddfip(&self) -> bool {
        matches!(
            self.role,
            RoleTag::DdfipUser | RoleTag::DdfipAdmin | RoleTag::DdfipFormAdmin
        )
    }

    pub fn ddfip_admin(&self) -> bool {
        self.role == RoleTag::DdfipAdmin
    }

    pub fn ddfip_form_admin(&self) -> bool {
        self.role == RoleTag::DdfipFormAdmin
    }

    pub fn dgfip(&self) -> bool {
        self.role == RoleTag::Dgfip
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Organization;

    fn collectivity_actor() -> Actor {
        Actor::new("u1", "Jeanne", Organization::collectivity("bayonne", "fiscalite-sa"))
    }

    #[test]
    fn test_anonymous_resolution() {
        assert_eq!(resolve(None), RoleTag::Anonymous);
    }

    #[test]
    fn test_super_admin_wins_over_everything() {
        let actor = collectivity_actor().organization_admin().super_admin();
        assert_eq!(resolve(Some(&actor)), RoleTag::SuperAdmin);

        let actor = Actor::new("u2", "Paul", Organization::ddfip("ddfip-64"))
            .form_admin()
            .super_admin();
        assert_eq!(resolve(Some(&actor)), RoleTag::SuperAdmin);
    }

    #[test]
    fn test_collectivity_admin_flag_does_not_upgrade() {
        let actor = collectivity_actor().organization_admin();
        assert_eq!(resolve(Some(&actor)), RoleTag::Collectivity);
    }

    #[test]
    fn test_publisher_admin_upgrade() {
        let actor = Actor::new("u3", "Lea", Organization::publisher("fiscalite-sa"));
        assert_eq!(resolve(Some(&actor)), RoleTag::Publisher);

        let actor = actor.organization_admin();
        assert_eq!(resolve(Some(&actor)), RoleTag::PublisherAdmin);
    }

    #[test]
    fn test_ddfip_upgrades() {
        let base = Actor::new("u4", "Marc", Organization::ddfip("ddfip-64"));
        assert_eq!(resolve(Some(&base)), RoleTag::DdfipUser);

        let form_admin = base.clone().form_admin();
        assert_eq!(resolve(Some(&form_admin)), RoleTag::DdfipFormAdmin);

        // The admin flag wins over the form-admin flag.
        let admin = form_admin.organization_admin();
        assert_eq!(resolve(Some(&admin)), RoleTag::DdfipAdmin);
    }

    #[test]
    fn test_dgfip_singleton_kind() {
        let actor = Actor::new("u5", "Nadia", Organization::dgfip("dgfip"));
        assert_eq!(resolve(Some(&actor)), RoleTag::Dgfip);
    }

    #[test]
    fn test_viewer_type_grouping() {
        assert_eq!(RoleTag::Collectivity.viewer_type(), Some(ViewerType::Collectivity));
        assert_eq!(RoleTag::DdfipUser.viewer_type(), Some(ViewerType::DdfipUser));
        assert_eq!(RoleTag::DdfipFormAdmin.viewer_type(), Some(ViewerType::DdfipUser));
        assert_eq!(RoleTag::DdfipAdmin.viewer_type(), Some(ViewerType::DdfipAdmin));
        assert_eq!(RoleTag::Publisher.viewer_type(), None);
        assert_eq!(RoleTag::SuperAdmin.viewer_type(), None);
    }

    #[test]
    fn test_mismatched_shape_answers_false() {
        let actor = Actor::new("u6", "Lea", Organization::publisher("fiscalite-sa"));
        let ctx = ActorContext::resolve(Some(&actor));
        assert!(!ctx.ddfip_admin());
        assert!(!ctx.collectivity());
        assert!(ctx.publisher());
        assert!(ctx.office_ids().is_empty());
    }
}
