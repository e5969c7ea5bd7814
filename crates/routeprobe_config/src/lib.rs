//! Configuration for the routing probes.
//!
//! The configuration is the LiteLLM proxy document the external proxy is
//! started with, extended with the AWS settings the direct Bedrock probes
//! need. It is read once at start and never mutated afterwards.

mod config;
mod document;
mod loader;

pub use config::*;
pub use loader::*;
