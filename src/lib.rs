pub mod analysis;
pub mod app;
pub mod args;
pub mod citation_graph;
pub mod config;
pub mod error;
pub mod latex;
pub mod layout;
pub mod loader;
pub mod logging;

// Re-export commonly used items for convenience
pub use citation_graph::CitationGraph;
pub use config::Config;
pub use error::{CiteGraphError, Result};
