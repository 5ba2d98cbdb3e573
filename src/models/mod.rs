//! Models module
//!
//! Defines the catalog record structures shared by every pipeline stage.

pub mod fields;
pub mod issue;
pub mod record;

pub use issue::RecordIssue;
pub use record::{Dataset, GroupContext, Header, LineEnding, Record};
