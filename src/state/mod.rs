//! Crawl state carried between requests
//!
//! # Components
//!
//! - `MemberRecord`: the per-member record accumulated stage by stage
//! - `SyncStatus`: how current a record's portal data is
//! - `Stage`: which portal page a request targets
//! - `Item`: the outputs a crawl emits

mod item;
mod record;
mod stage;
mod sync_status;

// Re-export main types
pub use item::{
    EligibilityConfirmation, Item, StatusUpdate, ValidationOutcome, ValidationResult,
};
pub use record::{Field, MemberRecord, RecordDraft};
pub use stage::Stage;
pub use sync_status::SyncStatus;
