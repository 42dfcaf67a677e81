//! venvboot - container entrypoint for mcp-python-runner
//!
//! Ensures a uv cache directory in the project volume, provisions a Python
//! virtual environment there (or relies on one baked into the image), and
//! hands process control to the runner.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod handoff;
pub mod layout;
pub mod provision;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{BootError, BootResult};
