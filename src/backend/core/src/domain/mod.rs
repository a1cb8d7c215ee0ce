//! Domain model: principals, organizations, and the protected records the
//! authorization core rules over.

pub mod actor;
pub mod ids;
pub mod organization;
pub mod records;

pub use actor::Actor;
pub use ids::{OfficeId, OrganizationId, PackageId, ReportId, UserId};
pub use organization::{Organization, OrganizationKind};
pub use records::{
    Collectivity, Ddfip, FieldValue, Office, Package, Priority, Publisher, Report, ReportState,
    Resource, ResourceType, User,
};
