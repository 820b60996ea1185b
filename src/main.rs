//! html2markdown - Convert HTML to Markdown, keeping unsupported markup
//!
//! This is the main entry point for the CLI application.

fn main() {
  html2markdown::cli::run();
}
