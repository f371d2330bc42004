pub mod constants;
pub mod config;
pub mod digest;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod pipeline;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

pub use app::source_nodes_use_case::{SourceNodesUseCase, SourcePorts};
pub use error::{Result, SourceError};
