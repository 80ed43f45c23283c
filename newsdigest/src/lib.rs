// Library interface for newsdigest modules
// This allows tests and other binaries to import modules

pub mod delivery;
pub mod filters;
pub mod history;
pub mod ingestion;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod query;

pub use ingestion::NewsItem;
