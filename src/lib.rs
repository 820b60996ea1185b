//! html2markdown library
//!
//! Converts HTML fragments to Markdown while keeping any markup that has no
//! Markdown equivalent exactly as it was written.

pub mod cli;
pub mod color;
pub mod commands;
pub mod markdown;
