//! Declarative rules for branchpatch.
//!
//! This module handles:
//! - Compiling configured rules into pipeline handlers
//! - Content rewriting using sed-like substitutions

pub mod actions;
pub mod rewriter;

pub use actions::{CompiledRule, ContentAction, compile_rules, install_rules};
pub use rewriter::Substitution;
