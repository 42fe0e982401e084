//! Service layer - statement parsing and analysis
//!
//! The parsers are pure functions over bytes and config. Anything effectful
//! (document rendering, AI calls) arrives through the ports.

pub mod amounts;
pub mod banks;
pub mod categorize;
pub mod dates;
pub mod delimited;
pub mod detect;
pub mod document;
pub mod markup;
pub mod orchestrator;
pub mod recurring;

pub use amounts::resolve_amount;
pub use categorize::{apply_category_suggestions, suggest_category, CategorySuggestion};
pub use dates::{DateOrder, ParseContext};
pub use delimited::parse_delimited;
pub use detect::detect_format;
pub use document::parse_document;
pub use markup::parse_markup;
pub use orchestrator::parse_statement;
pub use recurring::{recent_outflows, RecurringDetector};
