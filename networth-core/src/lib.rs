//! Networth Core - Bank statement ingestion for personal finance
//!
//! This crate implements statement parsing following hexagonal architecture:
//!
//! - **domain**: Parse inputs and outputs (ParsedTransaction, ParseResult, etc.)
//! - **ports**: Trait definitions for external collaborators (VisionAssist, DocumentLoader)
//! - **services**: Format detection, the parsers, recurring-charge detection
//! - **adapters**: Concrete document loaders (raster images, pdf-extract)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use config::EngineConfig;
use ports::{DocumentLoader, VisionAssist};
use services::RecurringDetector;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{
    FormatLabel, Frequency, ParseDebugInfo, ParseResult, ParsedTransaction, Provenance, RawStatementFile,
    SubscriptionCandidate,
};

/// Main context for statement parsing
///
/// Holds the configuration and the optional collaborators. Parsing keeps no
/// state between calls, so one engine can be shared across threads.
pub struct StatementEngine {
    pub config: EngineConfig,
    loader: Option<Arc<dyn DocumentLoader>>,
    assist: Option<Arc<dyn VisionAssist>>,
}

impl StatementEngine {
    /// Create an engine with the given configuration and no AI collaborator
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            loader: default_loader(),
            assist: None,
        }
    }

    /// Create an engine from the settings directory
    pub fn from_settings_dir(settings_dir: &Path) -> Result<Self> {
        Ok(Self::new(EngineConfig::load(settings_dir)?))
    }

    /// Use a specific PDF loader
    pub fn with_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Attach a vision-capable AI collaborator
    pub fn with_assist(mut self, assist: Arc<dyn VisionAssist>) -> Self {
        self.assist = Some(assist);
        self
    }

    /// Parse one uploaded statement
    pub fn parse(&self, file: &RawStatementFile) -> ParseResult {
        services::parse_statement(file, &self.config, self.loader.as_deref(), self.assist.as_deref())
    }

    /// Find subscription-like charges in normalized transactions
    pub fn detect_recurring(&self, transactions: &[ParsedTransaction]) -> Vec<SubscriptionCandidate> {
        RecurringDetector::new(self.config.recurring.clone()).detect(transactions)
    }
}

impl Default for StatementEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(feature = "pdf")]
fn default_loader() -> Option<Arc<dyn DocumentLoader>> {
    Some(Arc::new(adapters::PdfTextLoader::new()))
}

#[cfg(not(feature = "pdf"))]
fn default_loader() -> Option<Arc<dyn DocumentLoader>> {
    None
}
