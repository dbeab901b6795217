//! External filter commands for branchpatch.
//!
//! This module handles:
//! - Piping file content through a shell command
//! - Filter environment variable setup

pub mod executor;

pub use executor::{FilterContext, build_filter_env, run_filter};
