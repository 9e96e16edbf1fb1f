use super::ParseError;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Login form token embedded in the homepage script
static AUTH_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"AUTH_TOKEN = "(.*)";"#).expect("Invalid regex"));

/// Extracts the authenticity token from the portal homepage
///
/// Returns `None` when the homepage does not embed a token, which usually
/// means the portal served a maintenance or error page.
pub fn extract_auth_token(html: &str) -> Option<String> {
    AUTH_TOKEN_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Outcome of the JSON login call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub response_message: String,
}

impl LoginResponse {
    pub fn is_ok(&self) -> bool {
        self.response_message == "OK"
    }
}

#[derive(Deserialize)]
struct LoginEnvelope {
    portal_user_authenticate: Option<LoginBody>,
}

#[derive(Deserialize)]
struct LoginBody {
    #[serde(default)]
    response_message: Option<String>,
}

/// Parses the body of `portal_user_authenticate.json`
pub fn parse_login(body: &str) -> Result<LoginResponse, ParseError> {
    let envelope: LoginEnvelope = serde_json::from_str(body)?;
    let response_message = envelope
        .portal_user_authenticate
        .ok_or(ParseError::MissingField("portal_user_authenticate"))?
        .response_message
        .ok_or(ParseError::MissingField("response_message"))?;

    Ok(LoginResponse { response_message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_auth_token() {
        let html = r#"<script>var AUTH_TOKEN = "abc123+/=";</script>"#;
        assert_eq!(extract_auth_token(html), Some("abc123+/=".to_string()));
    }

    #[test]
    fn test_extract_auth_token_missing() {
        assert_eq!(extract_auth_token("<html><body>Maintenance</body></html>"), None);
    }

    #[test]
    fn test_parse_login() {
        let ok = parse_login(r#"{"portal_user_authenticate": {"response_message": "OK"}}"#).unwrap();
        assert!(ok.is_ok());

        let denied = parse_login(
            r#"{"portal_user_authenticate": {"response_message": "Invalid username or password"}}"#,
        )
        .unwrap();
        assert!(!denied.is_ok());
        assert_eq!(denied.response_message, "Invalid username or password");
    }

    #[test]
    fn test_parse_login_malformed() {
        assert!(matches!(parse_login("<html>"), Err(ParseError::Json(_))));
        assert!(matches!(
            parse_login(r#"{"other": {}}"#),
            Err(ParseError::MissingField("portal_user_authenticate"))
        ));
        assert!(matches!(
            parse_login(r#"{"portal_user_authenticate": {}}"#),
            Err(ParseError::MissingField("response_message"))
        ));
    }
}
