use super::de::string_or_number;
use super::ParseError;
use serde::Deserialize;
use serde_json::Value;

/// A member row from `members_roster_list.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberStub {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub fname: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub lname: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub city: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub prov_lname: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub prov_fname: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub prov_title: String,
}

impl MemberStub {
    /// Treating dentist as `"{last}, {first} {title}"`
    pub fn dentist(&self) -> String {
        format!("{}, {} {}", self.prov_lname, self.prov_fname, self.prov_title)
    }
}

#[derive(Deserialize)]
struct RosterEnvelope {
    members_roster_list: Option<RosterList>,
}

#[derive(Deserialize)]
struct RosterList {
    #[serde(default)]
    num_recs: Option<Value>,
    #[serde(default)]
    members: Option<Value>,
}

/// Parses one letter page of the member roster
///
/// The portal reports the record count as a string. `"0"` means no members,
/// `"1"` means `members` is a single object, and any other count means
/// `members` is an array. The result is always a list.
pub fn parse_member_list(body: &str) -> Result<Vec<MemberStub>, ParseError> {
    let envelope: RosterEnvelope = serde_json::from_str(body)?;
    let list = envelope
        .members_roster_list
        .ok_or(ParseError::MissingField("members_roster_list"))?;

    let num_recs = match list.num_recs {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ParseError::MissingField("num_recs")),
    };

    if num_recs == "0" {
        return Ok(Vec::new());
    }

    let members = list.members.ok_or(ParseError::MissingField("members"))?;

    if num_recs == "1" {
        let single: MemberStub = serde_json::from_value(members)?;
        Ok(vec![single])
    } else {
        Ok(serde_json::from_value(members)?)
    }
}
