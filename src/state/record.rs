//! Member record accumulated across the crawl stages
//!
//! A record is never edited in place. Each stage calls [`MemberRecord::derive`],
//! sets what it learned on the returned [`RecordDraft`], and builds a new value.
//! Sibling requests share their parent's record through `Arc` and branch from
//! it independently.

use crate::session::{Credential, TargetMember};
use crate::state::SyncStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Not;

/// String-valued record fields, named as they appear in emitted items
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // Routing
    Username,
    Jobid,
    Company,
    Practice,
    FacilityId,
    Fid,
    // Identity
    Mid,
    SubscriberId,
    Fname,
    Lname,
    City,
    Dob,
    Dentist,
    Address,
    Telephone,
    // Derived from the eligibility page
    Plan,
    BecameEligibleOn,
    ConfirmationNo,
    LastServiceDate,
    LastProphylaxisDate,
}

/// Everything known about one member (or one session, before members are found)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(flatten)]
    fields: BTreeMap<Field, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    mco_status: Option<bool>,

    #[serde(default)]
    mco_sync_status: SyncStatus,

    #[serde(default, skip_serializing_if = "Not::not")]
    new_patient: bool,
}

impl MemberRecord {
    /// Creates an empty record in `Pending` status
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a session record with the routing data of a credential
    ///
    /// The username itself is only recorded once login succeeds.
    pub fn from_credential(credential: &Credential) -> Self {
        Self::new()
            .derive()
            .set(Field::Jobid, &credential.jobid)
            .set(Field::Company, &credential.company)
            .set(Field::Practice, credential.practice())
            .set(Field::FacilityId, &credential.facility_id)
            .build()
    }

    /// Overlays a partial-mode target onto this session record
    ///
    /// The target's identity and routing fields are layered on top; the
    /// session's practice is kept.
    pub fn with_target(&self, target: &TargetMember) -> Self {
        let practice = self.get(Field::Practice).to_string();
        let mut draft = self
            .derive()
            .set(Field::Username, &target.username)
            .set(Field::Jobid, &target.jobid)
            .set(Field::Company, &target.company)
            .set(Field::Mid, &target.mid)
            .set(Field::SubscriberId, &target.subscriber_id)
            .set(Field::Fid, &target.fid)
            .set(Field::Dob, target.date_of_birth())
            .set(Field::Fname, &target.fname)
            .set(Field::Lname, &target.lname)
            .new_patient(target.new_patient);
        draft.record.fields.insert(Field::Practice, practice);
        draft.build()
    }

    /// Returns a field's value, or `""` when unset
    pub fn get(&self, field: Field) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn is_set(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }

    pub fn mco_status(&self) -> Option<bool> {
        self.mco_status
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.mco_sync_status
    }

    pub fn is_new_patient(&self) -> bool {
        self.new_patient
    }

    /// Starts a modified copy of this record
    pub fn derive(&self) -> RecordDraft {
        RecordDraft {
            record: self.clone(),
        }
    }
}

/// A record being modified; see [`MemberRecord::derive`]
#[derive(Debug, Clone)]
pub struct RecordDraft {
    record: MemberRecord,
}

impl RecordDraft {
    /// Sets a field
    ///
    /// An empty value never replaces a populated field.
    pub fn set(mut self, field: Field, value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        if value.is_empty() && self.record.is_set(field) {
            return self;
        }
        self.record.fields.insert(field, value.to_string());
        self
    }

    pub fn status(mut self, status: SyncStatus) -> Self {
        self.record.mco_sync_status = status;
        self
    }

    pub fn mco_status(mut self, mco_status: bool) -> Self {
        self.record.mco_status = Some(mco_status);
        self
    }

    pub fn new_patient(mut self, new_patient: bool) -> Self {
        self.record.new_patient = new_patient;
        self
    }

    pub fn build(self) -> MemberRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record() -> MemberRecord {
        MemberRecord::new()
            .derive()
            .set(Field::Username, "frontdesk")
            .set(Field::Fname, "Ana")
            .set(Field::Lname, "Diaz")
            .build()
    }

    #[test]
    fn test_empty_value_never_overwrites() {
        let record = create_test_record();
        let next = record.derive().set(Field::Fname, "").build();
        assert_eq!(next.get(Field::Fname), "Ana");
    }

    #[test]
    fn test_non_empty_value_overwrites() {
        let record = create_test_record();
        let next = record.derive().set(Field::Fname, "ANA").build();
        assert_eq!(next.get(Field::Fname), "ANA");
    }

    #[test]
    fn test_derive_leaves_original_untouched() {
        let record = create_test_record();
        let next = record
            .derive()
            .set(Field::Mid, "77")
            .status(SyncStatus::Updated)
            .mco_status(true)
            .build();

        assert_eq!(record.get(Field::Mid), "");
        assert_eq!(record.sync_status(), SyncStatus::Pending);
        assert_eq!(record.mco_status(), None);

        assert_eq!(next.get(Field::Mid), "77");
        assert_eq!(next.sync_status(), SyncStatus::Updated);
        assert_eq!(next.mco_status(), Some(true));
    }

    #[test]
    fn test_unset_field_reads_empty() {
        let record = MemberRecord::new();
        assert_eq!(record.get(Field::Plan), "");
        assert!(!record.is_set(Field::Plan));

        // Empty on an unset field is recorded
        let next = record.derive().set(Field::Plan, "").build();
        assert_eq!(next.get(Field::Plan), "");
    }

    #[test]
    fn test_with_target_keeps_session_practice() {
        let session = MemberRecord::new()
            .derive()
            .set(Field::Username, "frontdesk")
            .set(Field::Practice, "Main St")
            .set(Field::Jobid, "1")
            .build();

        let target: TargetMember = serde_json::from_str(
            r#"{"username": "frontdesk", "mid": "", "subscriber_id": "555", "fid": "1001",
                "dob": "05/01/2012", "jobid": "42", "new_patient": true}"#,
        )
        .unwrap();

        let record = session.with_target(&target);
        assert_eq!(record.get(Field::Practice), "Main St");
        assert_eq!(record.get(Field::Jobid), "42");
        assert_eq!(record.get(Field::SubscriberId), "555");
        assert_eq!(record.get(Field::Dob), "05/01/2012");
        assert!(record.is_new_patient());
    }

    #[test]
    fn test_serialized_shape() {
        let record = create_test_record()
            .derive()
            .status(SyncStatus::UpdatedNoPdf)
            .mco_status(true)
            .build();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["fname"], "Ana");
        assert_eq!(value["username"], "frontdesk");
        assert_eq!(value["mco_status"], true);
        assert_eq!(value["mco_sync_status"], "Updated (no PDF)");
        assert!(value.get("new_patient").is_none());

        let back: MemberRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
