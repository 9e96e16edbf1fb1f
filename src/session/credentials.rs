use crate::parser::de::string_or_number;
use crate::session::{read_json_source, SessionKey};
use crate::CrawlerError;
use serde::Deserialize;
use std::fmt;

/// One portal login and the routing data attached to everything it produces
#[derive(Clone, Deserialize)]
pub struct Credential {
    pub username: String,

    pub password: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub jobid: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub company: String,

    #[serde(default, deserialize_with = "string_or_number")]
    practice: String,

    /// Web form submissions post the practice as an array field
    #[serde(rename = "practice[]", default, deserialize_with = "string_or_number")]
    practice_field: String,

    /// Facility the roster crawl is restricted to
    #[serde(default, deserialize_with = "string_or_number")]
    pub facility_id: String,

    /// Login for the secondary eligibility collaborator
    #[serde(default, alias = "tmhp_username")]
    pub secondary_username: Option<String>,

    #[serde(default, alias = "tmhp_password")]
    pub secondary_password: Option<String>,
}

impl Credential {
    /// Practice name, falling back to the form-array spelling
    pub fn practice(&self) -> &str {
        if self.practice.is_empty() {
            &self.practice_field
        } else {
            &self.practice
        }
    }

    /// Cookie-jar key for this login
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.username.clone())
    }

    /// Whether a secondary eligibility login was supplied
    pub fn has_secondary_login(&self) -> bool {
        self.secondary_username
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("jobid", &self.jobid)
            .field("company", &self.company)
            .field("practice", &self.practice())
            .field("facility_id", &self.facility_id)
            .field("secondary_username", &self.secondary_username)
            .finish()
    }
}

/// Loads the credential list from inline JSON or a JSON file
///
/// # Arguments
///
/// * `source` - Either a JSON array or a path to a file containing one
///
/// # Returns
///
/// * `Ok(Vec<Credential>)` - At least one credential, each with a username
/// * `Err(CrawlerError)` - Unreadable, malformed, or empty input
pub fn load_credentials(source: &str) -> Result<Vec<Credential>, CrawlerError> {
    let content = read_json_source(source)?;
    let credentials: Vec<Credential> = serde_json::from_str(&content)?;

    if credentials.is_empty() {
        return Err(CrawlerError::Input(
            "credential list is empty".to_string(),
        ));
    }

    if let Some(position) = credentials
        .iter()
        .position(|c| c.username.trim().is_empty())
    {
        return Err(CrawlerError::Input(format!(
            "credential #{} has an empty username",
            position + 1
        )));
    }

    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_inline_credentials() {
        let json = r#"[{
            "username": "frontdesk",
            "password": "hunter2",
            "jobid": 42,
            "company": "Bright Smiles",
            "practice": "Main St",
            "facility_id": "1001",
            "tmhp_username": "sec-user",
            "tmhp_password": "sec-pass"
        }]"#;

        let creds = load_credentials(json).unwrap();
        assert_eq!(creds.len(), 1);

        let cred = &creds[0];
        assert_eq!(cred.jobid, "42");
        assert_eq!(cred.practice(), "Main St");
        assert_eq!(cred.session_key(), SessionKey::new("frontdesk"));
        assert!(cred.has_secondary_login());
    }

    #[test]
    fn test_practice_falls_back_to_form_array_field() {
        let json = r#"[{"username": "u", "password": "p", "practice": "", "practice[]": "Uptown"}]"#;
        let creds = load_credentials(json).unwrap();
        assert_eq!(creds[0].practice(), "Uptown");
        assert!(!creds[0].has_secondary_login());
    }

    #[test]
    fn test_debug_redacts_password() {
        let json = r#"[{"username": "u", "password": "topsecret"}]"#;
        let creds = load_credentials(json).unwrap();
        let printed = format!("{:?}", creds[0]);
        assert!(!printed.contains("topsecret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_load_credentials_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"[{"username": "a", "password": "b", "facility_id": 7}]"#)
            .unwrap();
        file.flush().unwrap();

        let creds = load_credentials(file.path().to_str().unwrap()).unwrap();
        assert_eq!(creds[0].facility_id, "7");
    }

    #[test]
    fn test_empty_and_invalid_credentials() {
        assert!(matches!(load_credentials("[]"), Err(CrawlerError::Input(_))));
        assert!(matches!(
            load_credentials(r#"[{"username": " ", "password": "x"}]"#),
            Err(CrawlerError::Input(_))
        ));
        assert!(matches!(
            load_credentials("[{\"password\": \"x\"}]"),
            Err(CrawlerError::Json(_))
        ));
    }
}
