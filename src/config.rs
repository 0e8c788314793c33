//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema used to drive runtime
//! behavior and helpers to locate the config, catalog and log files.

mod load;
mod schema;

pub use load::resolve_log_path;
pub use schema::*;
