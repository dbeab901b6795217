//! Path pattern matching for branchpatch.
//!
//! This module handles:
//! - Compiling gitignore-style pattern strings into segment patterns
//! - First-match-wins evaluation of ordered pattern lists with `!` exclusions

pub mod matcher;

pub use matcher::{MatchResult, Pattern, compile, compile_all, first_hit, match_any, split_path};
