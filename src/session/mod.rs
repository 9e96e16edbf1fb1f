//! Session identity and run inputs
//!
//! This module covers everything that identifies one authenticated branch of
//! the crawl and the inputs that seed it:
//! - `Credential`: a portal login plus its routing data (job, company, practice, facility)
//! - `SessionKey`: the cookie-jar correlator shared by every request of a branch
//! - `ScrapeMode`: which part of the navigation graph a run walks
//! - `TargetMember`: a member requested explicitly in partial mode

mod credentials;
mod dates;
mod members;

pub use credentials::{load_credentials, Credential};
pub use dates::{convert_date, portal_dob};
pub use members::{load_members, TargetMember};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies the cookie jar of one authenticated session
///
/// The key is derived from the portal username and stays the same for the
/// whole branch tree that grows out of that login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which part of the portal a run walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeMode {
    /// Every facility roster, every member
    #[default]
    All,
    /// Only the members listed in the target file
    Partial,
    /// Log in and report the facilities, nothing else
    Validate,
}

impl ScrapeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Partial => "partial",
            Self::Validate => "validate",
        }
    }
}

impl fmt::Display for ScrapeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "partial" => Ok(Self::Partial),
            "validate" => Ok(Self::Validate),
            other => Err(format!(
                "unknown scrape mode '{}', expected one of: all, partial, validate",
                other
            )),
        }
    }
}

/// Reads a JSON document either inline or from a file
///
/// Inputs that start with `[` or `{` are treated as inline JSON, anything else
/// as a path.
fn read_json_source(source: &str) -> std::io::Result<String> {
    let trimmed = source.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        Ok(source.to_string())
    } else {
        std::fs::read_to_string(source)
    }
}
