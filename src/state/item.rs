use crate::session::TargetMember;
use crate::state::{Field, MemberRecord, SyncStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Terminal output of the crawl
///
/// Items are serialized with a `kind` tag next to the record fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    /// Session-level status marker
    Status(StatusUpdate),
    /// A member's demographics and eligibility
    Member(MemberRecord),
    /// Outcome of a validation-mode login
    Validation(ValidationResult),
    /// An eligibility confirmation document was requested
    EligibilityRequested(EligibilityConfirmation),
}

impl Item {
    /// Stable kind name, matching the serialized tag
    pub fn kind(&self) -> &'static str {
        match self {
            Item::Status(_) => "status",
            Item::Member(_) => "member",
            Item::Validation(_) => "validation",
            Item::EligibilityRequested(_) => "eligibility_requested",
        }
    }

    /// Portal username the item belongs to, when known
    pub fn username(&self) -> Option<&str> {
        let username = match self {
            Item::Status(status) => status.record.get(Field::Username),
            Item::Member(record) => record.get(Field::Username),
            Item::Validation(validation) => validation.record.get(Field::Username),
            Item::EligibilityRequested(_) => "",
        };
        Some(username).filter(|u| !u.is_empty())
    }

    pub fn subscriber_id(&self) -> Option<&str> {
        let subscriber_id = match self {
            Item::Status(status) => status.record.get(Field::SubscriberId),
            Item::Member(record) => record.get(Field::SubscriberId),
            Item::Validation(validation) => validation.record.get(Field::SubscriberId),
            Item::EligibilityRequested(confirmation) => confirmation.subscriber_id.as_str(),
        };
        Some(subscriber_id).filter(|s| !s.is_empty())
    }

    pub fn sync_status(&self) -> Option<SyncStatus> {
        match self {
            Item::Status(status) => Some(status.record.sync_status()),
            Item::Member(record) => Some(record.sync_status()),
            Item::Validation(_) => None,
            Item::EligibilityRequested(confirmation) => Some(confirmation.mco_sync_status),
        }
    }
}

/// Session status marker, carrying the partial-mode target list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(flatten)]
    pub record: MemberRecord,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<TargetMember>,
}

/// Whether a credential could log in and reach its facilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(flatten)]
    pub record: MemberRecord,

    pub result: ValidationOutcome,

    /// Facility id to label, for successful validations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid_map: Option<BTreeMap<String, String>>,
}

impl ValidationResult {
    pub fn valid(record: MemberRecord, fid_map: BTreeMap<String, String>) -> Self {
        Self {
            record,
            result: ValidationOutcome::Valid,
            fid_map: Some(fid_map),
        }
    }

    pub fn invalid(record: MemberRecord) -> Self {
        Self {
            record,
            result: ValidationOutcome::Invalid,
            fid_map: None,
        }
    }
}

/// Minimal record noting that a confirmation document was requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityConfirmation {
    /// Always `"requested"`
    pub eligibility: String,
    pub subscriber_id: String,
    pub jobid: String,
    pub practice: String,
    pub mco_sync_status: SyncStatus,
}

impl EligibilityConfirmation {
    pub fn for_record(record: &MemberRecord) -> Self {
        Self {
            eligibility: "requested".to_string(),
            subscriber_id: record.get(Field::SubscriberId).to_string(),
            jobid: record.get(Field::Jobid).to_string(),
            practice: record.get(Field::Practice).to_string(),
            mco_sync_status: SyncStatus::Updated,
        }
    }
}
