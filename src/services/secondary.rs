use super::ServiceError;
use async_trait::async_trait;
use serde::Serialize;

/// Request for a second eligibility lookup of a Medicaid member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondaryCheck {
    pub subscriber_id: String,
    pub dob: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub practice: String,
    /// Name of the portal that found the member
    pub source: String,
}

/// Opaque second eligibility source
///
/// The crawler only hands off members; what the collaborator does with them
/// is outside this crate.
#[async_trait]
pub trait SecondaryEligibility: Send + Sync {
    async fn check(&self, check: &SecondaryCheck) -> Result<(), ServiceError>;
}

/// Logs each hand-off
#[derive(Debug, Default, Clone)]
pub struct LogSecondary;

#[async_trait]
impl SecondaryEligibility for LogSecondary {
    async fn check(&self, check: &SecondaryCheck) -> Result<(), ServiceError> {
        tracing::info!(
            "Secondary eligibility check for subscriber {} ({} {}) from {}",
            check.subscriber_id,
            check.first_name,
            check.last_name,
            check.source
        );
        Ok(())
    }
}
