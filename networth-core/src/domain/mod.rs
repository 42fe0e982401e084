//! Core domain entities
//!
//! All parse inputs and outputs are defined here. These are pure data structures
//! with no I/O or external dependencies.

mod format;
mod statement;
mod subscription;
mod transaction;
pub mod result;

pub use format::FormatLabel;
pub use result::{ParseDebugInfo, ParseResult};
pub use statement::RawStatementFile;
pub use subscription::{Frequency, SubscriptionCandidate};
pub use transaction::{ParsedTransaction, Provenance};
