pub mod context;
pub mod fetcher;
pub mod orchestrator;
pub mod outlet;
pub mod reporter;
pub mod state;
pub mod summarizer;
pub mod types;
pub mod workflow;
