//! CLI command implementations

pub mod build;
pub mod config;
pub mod start;
pub mod status;

pub use build::execute as build;
pub use config::execute as config;
pub use start::execute as start;
pub use status::execute as status;
