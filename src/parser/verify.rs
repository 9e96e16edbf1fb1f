use super::de::string_or_number;
use super::ParseError;
use serde::Deserialize;

/// Result of a `verify_eligibility.json` lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The member was found; carries the portal member id
    Verified { mid: String },
    /// The portal answered with a non-OK message
    Rejected { message: String },
}

#[derive(Deserialize)]
struct VerifyEnvelope {
    verify_eligibility: Option<VerifyBody>,
}

#[derive(Deserialize)]
struct VerifyBody {
    #[serde(default)]
    response_message: Option<String>,
    #[serde(default)]
    insured: Option<Insured>,
}

#[derive(Deserialize)]
struct Insured {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
}

/// Parses the verify-eligibility lookup used to resolve a member id
pub fn parse_verify_eligibility(body: &str) -> Result<VerifyOutcome, ParseError> {
    let envelope: VerifyEnvelope = serde_json::from_str(body)?;
    let verify = envelope
        .verify_eligibility
        .ok_or(ParseError::MissingField("verify_eligibility"))?;

    let message = verify
        .response_message
        .ok_or(ParseError::MissingField("response_message"))?;

    if message != "OK" {
        return Ok(VerifyOutcome::Rejected { message });
    }

    let insured = verify.insured.ok_or(ParseError::MissingField("insured"))?;
    Ok(VerifyOutcome::Verified { mid: insured.id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verified() {
        let body = r#"{"verify_eligibility": {"response_message": "OK", "insured": {"id": 4455}}}"#;
        assert_eq!(
            parse_verify_eligibility(body).unwrap(),
            VerifyOutcome::Verified {
                mid: "4455".to_string()
            }
        );
    }

    #[test]
    fn test_rejected() {
        let body = r#"{"verify_eligibility": {"response_message": "No member found"}}"#;
        assert_eq!(
            parse_verify_eligibility(body).unwrap(),
            VerifyOutcome::Rejected {
                message: "No member found".to_string()
            }
        );
    }

    #[test]
    fn test_ok_without_insured() {
        let body = r#"{"verify_eligibility": {"response_message": "OK"}}"#;
        assert!(matches!(
            parse_verify_eligibility(body),
            Err(ParseError::MissingField("insured"))
        ));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            parse_verify_eligibility("<html></html>"),
            Err(ParseError::Json(_))
        ));
    }
}
