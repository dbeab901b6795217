//! Branchpatch - rewrite working-tree files from a git branch snapshot.
//!
//! A patch script registers handlers (path patterns plus a callback) on an
//! [`App`]. Running it walks every file of the upstream branch's tree, passes
//! each file through the handlers whose patterns select it, and writes the
//! file into the working tree only if some handler replaced its content.
//!
//! This library provides:
//! - Path pattern matching with `**` and `!` exclusions
//! - The apply pipeline over a tree snapshot
//! - Declarative rules loaded from `.branchpatch.toml`
//! - Shell filter execution with environment variable context
//!
//! # Example
//!
//! ```no_run
//! use branchpatch::App;
//!
//! let mut app = App::from("main");
//! app.on_file(["**/*.md", "!vendor/**"], |file| {
//!     let text = file.text()?.replace("Copyright 2024", "Copyright 2025");
//!     file.set_content(text);
//!     Ok(())
//! });
//!
//! let report = app.run().unwrap();
//! println!("{} of {} files changed", report.changed.len(), report.files_seen);
//! ```

pub mod apply;
pub mod config;
pub mod error;
pub mod hooks;
pub mod pattern;
pub mod rules;
pub mod tree;

pub use apply::{App, ApplyReport, Content, DEFAULT_UPSTREAM, File, Handler, IntoPatterns};
pub use error::{HandlerError, PatchError, Result};
