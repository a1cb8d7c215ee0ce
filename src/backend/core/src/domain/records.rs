//! Protected resource records and the field-access contract used by the
//! relation scoper's filter interpreter.
//!
//! Every record carries a `discarded_at` soft-delete state ("kept" vs
//! "discarded") and the ownership foreign keys the scoping rules consult.
//! Records are plain values: the authorization core never loads them itself,
//! it only inspects the ones callers hand it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{OfficeId, OrganizationId, PackageId, ReportId, UserId};
use super::organization::OrganizationKind;

// ═══════════════════════════════════════════════════════════════════════════════
// ResourceType
// ═══════════════════════════════════════════════════════════════════════════════

/// Tag identifying a protected resource type.
///
/// The policy registry is keyed by this closed enumeration, so an
/// "unregistered resource type" is unrepresentable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Collectivity,
    Publisher,
    Ddfip,
    Office,
    Package,
    Report,
    User,
}

impl ResourceType {
    pub const ALL: [ResourceType; 7] = [
        Self::Collectivity,
        Self::Publisher,
        Self::Ddfip,
        Self::Office,
        Self::Package,
        Self::Report,
        Self::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collectivity => "collectivity",
            Self::Publisher => "publisher",
            Self::Ddfip => "ddfip",
            Self::Office => "office",
            Self::Package => "package",
            Self::Report => "report",
            Self::User => "user",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept plural spellings, the form used on listing routes.
        match s {
            "collectivity" | "collectivities" => Ok(Self::Collectivity),
            "publisher" | "publishers" => Ok(Self::Publisher),
            "ddfip" | "ddfips" => Ok(Self::Ddfip),
            "office" | "offices" => Ok(Self::Office),
            "package" | "packages" => Ok(Self::Package),
            "report" | "reports" => Ok(Self::Report),
            "user" | "users" => Ok(Self::User),
            other => Err(format!("unknown resource type: {other}")),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FieldValue
// ═══════════════════════════════════════════════════════════════════════════════

/// A record field value, as seen by the filter interpreter.
///
/// `Null` stands both for an absent optional field and for a field name the
/// record does not define; comparing anything against `Null` is `false`, so a
/// mistyped field name narrows to nothing rather than widening to everything.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Id(String),
    Text(String),
    Bool(bool),
    Kind(OrganizationKind),
    State(ReportState),
    Null,
}

impl FieldValue {
    pub fn id(id: impl fmt::Display) -> Self {
        Self::Id(id.to_string())
    }

    /// Map an optional foreign key to `Id` or `Null`.
    pub fn opt_id<T: fmt::Display>(id: Option<&T>) -> Self {
        id.map_or(Self::Null, |id| Self::id(id))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<OrganizationKind> for FieldValue {
    fn from(kind: OrganizationKind) -> Self {
        Self::Kind(kind)
    }
}

impl From<ReportState> for FieldValue {
    fn from(state: ReportState) -> Self {
        Self::State(state)
    }
}

impl From<&OrganizationId> for FieldValue {
    fn from(id: &OrganizationId) -> Self {
        Self::Id(id.as_str().to_string())
    }
}

impl From<&OfficeId> for FieldValue {
    fn from(id: &OfficeId) -> Self {
        Self::Id(id.as_str().to_string())
    }
}

impl From<&UserId> for FieldValue {
    fn from(id: &UserId) -> Self {
        Self::Id(id.as_str().to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resource trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Contract every protected record type fulfils.
///
/// `field` backs the storage-agnostic filter interpreter: scope
/// specifications name fields, and the persistence adapter resolves them
/// through this accessor. Unknown names yield [`FieldValue::Null`].
pub trait Resource {
    /// The registry tag for this record type.
    const TYPE: ResourceType;

    /// Canonical identity string, used for cache keys and check journaling.
    fn resource_id(&self) -> String;

    /// Soft-delete timestamp.
    fn discarded_at(&self) -> Option<DateTime<Utc>>;

    /// Resolve a named field for filtering.
    fn field(&self, name: &str) -> FieldValue;

    fn is_kept(&self) -> bool {
        self.discarded_at().is_none()
    }

    fn is_discarded(&self) -> bool {
        !self.is_kept()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Collectivity
// ═══════════════════════════════════════════════════════════════════════════════

/// A local collectivity (commune, EPCI, département) registered on the
/// portal through its publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectivity {
    pub id: OrganizationId,
    pub publisher_id: OrganizationId,
    pub name: String,
    /// SIREN registration number.
    pub siren: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    /// Whether the owning publisher may manage this collectivity's records.
    #[serde(default = "default_true")]
    pub allow_publisher_management: bool,
    #[serde(default)]
    pub discarded_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Collectivity {
    pub fn new(
        id: impl Into<OrganizationId>,
        publisher_id: impl Into<OrganizationId>,
        name: impl Into<String>,
        siren: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            publisher_id: publisher_id.into(),
            name: name.into(),
            siren: siren.into(),
            contact_email: None,
            allow_publisher_management: true,
            discarded_at: None,
        }
    }

    pub fn discarded(mut self, at: DateTime<Utc>) -> Self {
        self.discarded_at = Some(at);
        self
    }

    pub fn publisher_managed(mut self, allowed: bool) -> Self {
        self.allow_publisher_management = allowed;
        self
    }
}

impl Resource for Collectivity {
    const TYPE: ResourceType = ResourceType::Collectivity;

    fn resource_id(&self) -> String {
        self.id.as_str().to_string()
    }

    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(&self.id),
            "publisher_id" => FieldValue::from(&self.publisher_id),
            "allow_publisher_management" => FieldValue::from(self.allow_publisher_management),
            _ => FieldValue::Null,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Publisher
// ═══════════════════════════════════════════════════════════════════════════════

/// A software vendor transmitting reports on behalf of its collectivities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: OrganizationId,
    pub name: String,
    /// SIRET registration number.
    pub siret: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub discarded_at: Option<DateTime<Utc>>,
}

impl Publisher {
    pub fn new(
        id: impl Into<OrganizationId>,
        name: impl Into<String>,
        siret: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            siret: siret.into(),
            contact_email: None,
            discarded_at: None,
        }
    }

    pub fn discarded(mut self, at: DateTime<Utc>) -> Self {
        self.discarded_at = Some(at);
        self
    }
}

impl Resource for Publisher {
    const TYPE: ResourceType = ResourceType::Publisher;

    fn resource_id(&self) -> String {
        self.id.as_str().to_string()
    }

    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(&self.id),
            _ => FieldValue::Null,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Ddfip
// ═══════════════════════════════════════════════════════════════════════════════

/// A departmental fiscal administration (DDFIP).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ddfip {
    pub id: OrganizationId,
    pub name: String,
    /// INSEE département code ("64", "2A", "976").
    pub code_departement: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub discarded_at: Option<DateTime<Utc>>,
}

impl Ddfip {
    pub fn new(
        id: impl Into<OrganizationId>,
        name: impl Into<String>,
        code_departement: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code_departement: code_departement.into(),
            contact_email: None,
            discarded_at: None,
        }
    }

    pub fn discarded(mut self, at: DateTime<Utc>) -> Self {
        self.discarded_at = Some(at);
        self
    }
}

impl Resource for Ddfip {
    const TYPE: ResourceType = ResourceType::Ddfip;

    fn resource_id(&self) -> String {
        self.id.as_str().to_string()
    }

    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(&self.id),
            _ => FieldValue::Null,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Office
// ═══════════════════════════════════════════════════════════════════════════════

/// A DDFIP office (guichet) that instructs assigned reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub id: OfficeId,
    pub ddfip_id: OrganizationId,
    pub name: String,
    /// Anomaly categories this office is competent for.
    #[serde(default)]
    pub competences: Vec<String>,
    #[serde(default)]
    pub discarded_at: Option<DateTime<Utc>>,
}

impl Office {
    pub fn new(
        id: impl Into<OfficeId>,
        ddfip_id: impl Into<OrganizationId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            ddfip_id: ddfip_id.into(),
            name: name.into(),
            competences: Vec::new(),
            discarded_at: None,
        }
    }

    pub fn discarded(mut self, at: DateTime<Utc>) -> Self {
        self.discarded_at = Some(at);
        self
    }
}

impl Resource for Office {
    const TYPE: ResourceType = ResourceType::Office;

    fn resource_id(&self) -> String {
        self.id.as_str().to_string()
    }

    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(&self.id),
            "ddfip_id" => FieldValue::from(&self.ddfip_id),
            _ => FieldValue::Null,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Package
// ═══════════════════════════════════════════════════════════════════════════════

/// A transmission package: a batch of reports a collectivity (or its
/// publisher) transmits to a DDFIP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub collectivity_id: OrganizationId,
    /// Set when the package was built by the collectivity's publisher.
    #[serde(default)]
    pub publisher_id: Option<OrganizationId>,
    /// Destination DDFIP, set at transmission.
    #[serde(default)]
    pub ddfip_id: Option<OrganizationId>,
    /// Office the DDFIP assigned the package to.
    #[serde(default)]
    pub assigned_office_id: Option<OfficeId>,
    /// Human-readable reference ("2024-05-0003").
    pub reference: String,
    #[serde(default)]
    pub transmitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub discarded_at: Option<DateTime<Utc>>,
}

impl Package {
    pub fn new(
        id: impl Into<PackageId>,
        collectivity_id: impl Into<OrganizationId>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            collectivity_id: collectivity_id.into(),
            publisher_id: None,
            ddfip_id: None,
            assigned_office_id: None,
            reference: reference.into(),
            transmitted_at: None,
            discarded_at: None,
        }
    }

    pub fn made_by_publisher(mut self, publisher_id: impl Into<OrganizationId>) -> Self {
        self.publisher_id = Some(publisher_id.into());
        self
    }

    pub fn transmitted_to(mut self, ddfip_id: impl Into<OrganizationId>, at: DateTime<Utc>) -> Self {
        self.ddfip_id = Some(ddfip_id.into());
        self.transmitted_at = Some(at);
        self
    }

    pub fn assigned_to(mut self, office_id: impl Into<OfficeId>) -> Self {
        self.assigned_office_id = Some(office_id.into());
        self
    }

    pub fn discarded(mut self, at: DateTime<Utc>) -> Self {
        self.discarded_at = Some(at);
        self
    }

    pub fn transmitted(&self) -> bool {
        self.transmitted_at.is_some()
    }
}

impl Resource for Package {
    const TYPE: ResourceType = ResourceType::Package;

    fn resource_id(&self) -> String {
        self.id.as_str().to_string()
    }

    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::Id(self.id.as_str().to_string()),
            "collectivity_id" => FieldValue::from(&self.collectivity_id),
            "publisher_id" => FieldValue::opt_id(self.publisher_id.as_ref()),
            "ddfip_id" => FieldValue::opt_id(self.ddfip_id.as_ref()),
            "assigned_office_id" => FieldValue::opt_id(self.assigned_office_id.as_ref()),
            "transmitted" => FieldValue::from(self.transmitted()),
            _ => FieldValue::Null,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Report
// ═══════════════════════════════════════════════════════════════════════════════

/// Lifecycle state of a report (signalement).
///
/// Only the states the authorization predicates consult are modeled;
/// transition business rules live outside this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportState {
    Draft,
    Ready,
    Transmitted,
    Acknowledged,
    Assigned,
    Approved,
    Rejected,
}

impl ReportState {
    /// Still being put together by the reporting side.
    pub fn packing(&self) -> bool {
        matches!(self, Self::Draft | Self::Ready)
    }

    /// Transmitted to the fiscal administration (in any downstream state).
    pub fn transmitted(&self) -> bool {
        *self >= Self::Transmitted
    }

    /// Under or past instruction by an office.
    pub fn resolvable(&self) -> bool {
        matches!(self, Self::Assigned | Self::Approved | Self::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ready => "ready",
            Self::Transmitted => "transmitted",
            Self::Acknowledged => "acknowledged",
            Self::Assigned => "assigned",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Urgency assessment carried by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// A tax-anomaly report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub collectivity_id: OrganizationId,
    /// Set when the report was drafted by the collectivity's publisher.
    #[serde(default)]
    pub publisher_id: Option<OrganizationId>,
    /// Transmission package the report was sent in.
    #[serde(default)]
    pub package_id: Option<PackageId>,
    /// Destination DDFIP, set at transmission.
    #[serde(default)]
    pub ddfip_id: Option<OrganizationId>,
    /// Office assigned to instruct the report.
    #[serde(default)]
    pub office_id: Option<OfficeId>,
    /// Anomaly form type ("evaluation_local_habitation", ...).
    pub form_type: String,
    /// INSEE code of the commune the anomaly concerns.
    pub code_insee: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub observations: Option<String>,
    pub state: ReportState,
    #[serde(default)]
    pub discarded_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn new(
        id: impl Into<ReportId>,
        collectivity_id: impl Into<OrganizationId>,
        form_type: impl Into<String>,
        code_insee: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            collectivity_id: collectivity_id.into(),
            publisher_id: None,
            package_id: None,
            ddfip_id: None,
            office_id: None,
            form_type: form_type.into(),
            code_insee: code_insee.into(),
            priority: Priority::default(),
            observations: None,
            state: ReportState::Draft,
            discarded_at: None,
        }
    }

    pub fn made_by_publisher(mut self, publisher_id: impl Into<OrganizationId>) -> Self {
        self.publisher_id = Some(publisher_id.into());
        self
    }

    pub fn in_state(mut self, state: ReportState) -> Self {
        self.state = state;
        self
    }

    pub fn transmitted_to(mut self, ddfip_id: impl Into<OrganizationId>) -> Self {
        self.ddfip_id = Some(ddfip_id.into());
        if !self.state.transmitted() {
            self.state = ReportState::Transmitted;
        }
        self
    }

    pub fn assigned_to(mut self, office_id: impl Into<OfficeId>) -> Self {
        self.office_id = Some(office_id.into());
        self.state = ReportState::Assigned;
        self
    }

    pub fn discarded(mut self, at: DateTime<Utc>) -> Self {
        self.discarded_at = Some(at);
        self
    }
}

impl Resource for Report {
    const TYPE: ResourceType = ResourceType::Report;

    fn resource_id(&self) -> String {
        self.id.as_str().to_string()
    }

    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::Id(self.id.as_str().to_string()),
            "collectivity_id" => FieldValue::from(&self.collectivity_id),
            "publisher_id" => FieldValue::opt_id(self.publisher_id.as_ref()),
            "package_id" => FieldValue::opt_id(self.package_id.as_ref()),
            "ddfip_id" => FieldValue::opt_id(self.ddfip_id.as_ref()),
            "office_id" => FieldValue::opt_id(self.office_id.as_ref()),
            "state" => FieldValue::from(self.state),
            "transmitted" => FieldValue::from(self.state.transmitted()),
            _ => FieldValue::Null,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// User (as a managed record)
// ═══════════════════════════════════════════════════════════════════════════════

/// A user account as a *managed record* on the admin screens.
///
/// Distinct from [`super::actor::Actor`], which is the authenticated
/// principal: a `User` row is what organization admins list, invite, and
/// edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub organization_kind: OrganizationKind,
    pub organization_id: OrganizationId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub organization_admin: bool,
    #[serde(default)]
    pub super_admin: bool,
    #[serde(default)]
    pub office_ids: Vec<OfficeId>,
    #[serde(default)]
    pub discarded_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        id: impl Into<UserId>,
        organization_kind: OrganizationKind,
        organization_id: impl Into<OrganizationId>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            organization_kind,
            organization_id: organization_id.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: email.into(),
            organization_admin: false,
            super_admin: false,
            office_ids: Vec::new(),
            discarded_at: None,
        }
    }

    pub fn named(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn organization_admin(mut self) -> Self {
        self.organization_admin = true;
        self
    }

    pub fn discarded(mut self, at: DateTime<Utc>) -> Self {
        self.discarded_at = Some(at);
        self
    }
}

impl Resource for User {
    const TYPE: ResourceType = ResourceType::User;

    fn resource_id(&self) -> String {
        self.id.as_str().to_string()
    }

    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(&self.id),
            "organization_id" => FieldValue::from(&self.organization_id),
            "organization_kind" => FieldValue::from(self.organization_kind),
            "organization_admin" => FieldValue::from(self.organization_admin),
            _ => FieldValue::Null,
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
    fn test_resource_type_parse() {
        assert_eq!("reports".parse::<ResourceType>().unwrap(), ResourceType::Report);
        assert_eq!("ddfip".parse::<ResourceType>().unwrap(), ResourceType::Ddfip);
        assert!("widgets".parse::<ResourceType>().is_err());
    }

    #[test]
    fn test_report_state_ordering() {
        assert!(ReportState::Draft.packing());
        assert!(ReportState::Ready.packing());
        assert!(!ReportState::Transmitted.packing());
        assert!(ReportState::Transmitted.transmitted());
        assert!(ReportState::Approved.transmitted());
        assert!(!ReportState::Ready.transmitted());
        assert!(ReportState::Assigned.resolvable());
        assert!(!ReportState::Acknowledged.resolvable());
    }

    #[test]
    fn test_field_access_unknown_is_null() {
        let report = Report::new("r1", "bayonne", "evaluation_local_habitation", "64102");
        assert_eq!(report.field("no_such_field"), FieldValue::Null);
        assert_eq!(report.field("ddfip_id"), FieldValue::Null);
        assert_eq!(
            report.field("collectivity_id"),
            FieldValue::Id("bayonne".into())
        );
    }

    #[test]
    fn test_package_transmitted_field() {
        let package = Package::new("p1", "bayonne", "2024-05-0001");
        assert_eq!(package.field("transmitted"), FieldValue::Bool(false));

        let package = package.transmitted_to("ddfip-64", chrono::Utc::now());
        assert_eq!(package.field("transmitted"), FieldValue::Bool(true));
        assert_eq!(package.field("ddfip_id"), FieldValue::Id("ddfip-64".into()));
    }
}
