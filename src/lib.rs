pub mod cache;
pub mod cli;
pub mod config;
pub mod history;
pub mod llm;
pub mod outlet;
pub mod research;
pub mod search;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use research::{ResearchOutcome, WorkflowEngine};
pub use service::{ResearchRequest, ResearchResponse, ResearchService};
