use super::de::string_or_number;
use super::ParseError;
use serde::Deserialize;

/// Demographics from `get_member_info.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberInfo {
    #[serde(default, deserialize_with = "string_or_number")]
    pub address1: String,
    /// City, state and zip on one line
    #[serde(default, deserialize_with = "string_or_number")]
    pub csz: String,
    #[serde(deserialize_with = "string_or_number")]
    pub dob: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub telephone: String,
    #[serde(deserialize_with = "string_or_number")]
    pub subscriber_id: String,
}

impl MemberInfo {
    pub fn address(&self) -> String {
        format!("{} {}", self.address1, self.csz)
    }
}

#[derive(Deserialize)]
struct MemberInfoEnvelope {
    get_member_info: Option<MemberInfo>,
}

/// Parses the body of `get_member_info.json`
pub fn parse_member_info(body: &str) -> Result<MemberInfo, ParseError> {
    let envelope: MemberInfoEnvelope = serde_json::from_str(body)?;
    envelope
        .get_member_info
        .ok_or(ParseError::MissingField("get_member_info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_member_info() {
        let body = r#"{"get_member_info": {
            "address1": "12 Oak Ln", "csz": "Austin, TX 78701",
            "dob": "05/01/2012", "telephone": "5125550100", "subscriber_id": 700123
        }}"#;

        let info = parse_member_info(body).unwrap();
        assert_eq!(info.address(), "12 Oak Ln Austin, TX 78701");
        assert_eq!(info.dob, "05/01/2012");
        assert_eq!(info.subscriber_id, "700123");
    }

    #[test]
    fn test_missing_required_fields() {
        assert!(matches!(
            parse_member_info(r#"{"get_member_info": null}"#),
            Err(ParseError::MissingField("get_member_info"))
        ));
        assert!(matches!(
            parse_member_info(r#"{"get_member_info": {"address1": "x"}}"#),
            Err(ParseError::Json(_))
        ));
    }
}
