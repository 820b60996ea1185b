//! CLI subcommand handlers.
//!
//! This module groups the implementations for each `html2markdown` command,
//! keeping `cli.rs` focused on argument definitions.

pub mod completions;
pub mod convert;
pub mod version;
