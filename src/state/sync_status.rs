/// Sync status reported for each member record
use serde::{Deserialize, Serialize};
use std::fmt;

/// How current the portal data on a record is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SyncStatus {
    /// Session started; no member data yet
    #[default]
    Pending,

    /// Eligibility page was read
    Updated,

    /// Demographics were read but no eligibility document was requested
    #[serde(rename = "Updated (no PDF)")]
    UpdatedNoPdf,

    /// The session could not reach fresh data (login or navigation failure)
    Outdated,
}

impl SyncStatus {
    /// Converts the status to its stored and emitted string form
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Updated => "Updated",
            Self::UpdatedNoPdf => "Updated (no PDF)",
            Self::Outdated => "Outdated",
        }
    }

    /// Parses a status from its stored string form
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(Self::Pending),
            "Updated" => Some(Self::Updated),
            "Updated (no PDF)" => Some(Self::UpdatedNoPdf),
            "Outdated" => Some(Self::Outdated),
            _ => None,
        }
    }

    /// Returns true if the record carries fresh portal data
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated | Self::UpdatedNoPdf)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}
