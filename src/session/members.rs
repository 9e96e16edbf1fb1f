use crate::parser::de::string_or_number;
use crate::session::{convert_date, read_json_source};
use crate::CrawlerError;
use serde::{Deserialize, Serialize};

/// A member requested explicitly in partial mode
///
/// Only members whose `username` matches the logged-in session are crawled by
/// that session. When `mid` is blank the portal's verify endpoint is used to
/// look it up first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetMember {
    pub username: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub mid: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub subscriber_id: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub fid: String,

    /// Normalized to `MM/DD/YYYY` on load
    #[serde(default)]
    pub dob: Option<String>,

    /// Web form spelling of the birth date, already in `MM/DD/YYYY`
    #[serde(
        rename = "Member Date of Birth",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub member_date_of_birth: Option<String>,

    #[serde(default)]
    pub fname: String,

    #[serde(default)]
    pub lname: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub jobid: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub company: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub new_patient: bool,
}

impl TargetMember {
    /// Birth date in portal form, preferring the normalized `dob` field
    pub fn date_of_birth(&self) -> &str {
        self.dob
            .as_deref()
            .or(self.member_date_of_birth.as_deref())
            .unwrap_or("")
    }
}

/// Loads partial-mode members from inline JSON or a JSON file
///
/// Each `dob` is converted from `YYYY-MM-DD` to `MM/DD/YYYY`; malformed or
/// null dates become empty strings.
pub fn load_members(source: &str) -> Result<Vec<TargetMember>, CrawlerError> {
    let content = read_json_source(source)?;
    let mut members: Vec<TargetMember> = serde_json::from_str(&content)?;

    for member in &mut members {
        if let Some(dob) = member.dob.take() {
            member.dob = Some(convert_date(Some(&dob)));
        } else if member.member_date_of_birth.is_none() {
            member.dob = Some(String::new());
        }
    }

    tracing::debug!("Loaded {} target members", members.len());
    Ok(members)
}
