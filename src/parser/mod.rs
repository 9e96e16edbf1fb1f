//! Page parsers for the portal's JSON endpoints and HTML pages
//!
//! Every parser is a pure function of the response body. JSON endpoints are
//! decoded into typed schemas with `serde_json`; HTML pages are read with
//! `scraper` selectors and `regex` text extraction over the same document.
//! HTML extractions are independent named accessors, so one missing value never
//! hides the others.

pub(crate) mod de;
mod eligibility;
mod login;
mod member_info;
mod members;
mod print;
mod roster;
mod verify;

pub use eligibility::{parse_eligibility, EligibilityDetail};
pub use login::{extract_auth_token, parse_login, LoginResponse};
pub use member_info::{parse_member_info, MemberInfo};
pub use members::{parse_member_list, MemberStub};
pub use print::{parse_subscriber_name, SubscriberName};
pub use roster::{parse_roster, Facility, FacilityIdSet, FacilitySource, RosterFacilities};
pub use verify::{parse_verify_eligibility, VerifyOutcome};

use scraper::Selector;
use thiserror::Error;

/// Errors raised while reading a portal response
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Missing element: {0}")]
    MissingElement(&'static str),

    #[error("Missing anchor text: {0}")]
    MissingAnchor(&'static str),

    #[error("Empty document")]
    EmptyDocument,

    #[error("Invalid selector: {0}")]
    Selector(String),
}

impl ParseError {
    /// Whether the page was readable but lacked an expected top-level anchor
    ///
    /// Structural failures mean the portal served a different page layout
    /// than expected; reissuing the same request will not help.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ParseError::MissingElement(_) | ParseError::MissingAnchor(_)
        )
    }
}

/// Compiles a CSS selector, reporting failures as a parse error
pub(crate) fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector(format!("{}: {:?}", css, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        assert!(ParseError::MissingElement("div#headerText").is_structural());
        assert!(ParseError::MissingAnchor("This member is currently").is_structural());

        assert!(!ParseError::EmptyDocument.is_structural());
        assert!(!ParseError::MissingField("num_recs").is_structural());

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!ParseError::Json(json_err).is_structural());
    }

    #[test]
    fn test_selector_compiles() {
        assert!(selector("div#headerText option").is_ok());
        assert!(selector("td[title=").is_err());
    }
}
