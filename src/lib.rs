// src/lib.rs
pub mod config;
pub mod utils;
pub mod pipelines;
pub mod services;
pub mod cli;
pub use cli::Arguments;
pub use config::defs::{PipelineError, RunConfig, ScratchRoot};
