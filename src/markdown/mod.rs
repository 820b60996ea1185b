//! HTML to Markdown conversion that preserves unsupported markup.
//!
//! Elements with a Markdown equivalent are rewritten; everything else is kept
//! exactly as it appeared in the input, including its nesting.
//!
//! # Architecture
//!
//! The conversion is split into focused modules:
//! - [`source`] - tokenizes HTML into XML for the parser and maps ranges back
//! - [`entities`] - character reference decoding
//! - [`tags`] - which elements and attributes can be converted
//! - [`escape`] - text escaping and whitespace normalization
//! - [`validity`] - recursive convertibility check
//! - [`elements`] - the rewriting tree walker
//! - [`fragment`] - output model and final rendering
//! - [`utils`] - helpers for parsed nodes
//!
//! # Example
//!
//! ```
//! use html2markdown::markdown::convert;
//!
//! let markdown = convert("<p>a <strong>b</strong></p><div>kept</div>").unwrap();
//! assert_eq!(markdown, "a __b__\n\n<div>kept</div>");
//! ```

use std::fmt;
use std::time::Instant;

use roxmltree::Document;
use tracing::{debug, error, trace};

mod elements;
mod entities;
mod escape;
mod fragment;
mod source;
mod tags;
mod utils;
mod validity;

pub use escape::{escape_markdown, normalize_whitespace};
pub use tags::{Tag, allowed_attributes, is_inline, is_supported};

use elements::Rewriter;
use source::PreparedSource;

/// Nesting limit applied unless the caller chooses another.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Options that control conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
  /// Reject input nested deeper than this many elements. `None` disables
  /// the check, which leaves very deep input free to exhaust the stack.
  pub max_depth: Option<usize>,
}

impl Default for ConvertOptions {
  fn default() -> Self {
    Self {
      max_depth: Some(DEFAULT_MAX_DEPTH),
    }
  }
}

/// Errors raised while converting.
#[derive(Debug)]
pub enum ConvertError {
  /// The input could not be parsed into a tree.
  Parse(roxmltree::Error),
  /// The input nests deeper than [`ConvertOptions::max_depth`].
  NestingTooDeep { depth: usize, limit: usize },
}

impl fmt::Display for ConvertError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConvertError::Parse(err) => write!(f, "Failed to parse HTML: {err}"),
      ConvertError::NestingTooDeep { depth, limit } => {
        write!(f, "HTML nests {depth} elements deep, more than the limit of {limit}")
      }
    }
  }
}

impl std::error::Error for ConvertError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ConvertError::Parse(err) => Some(err),
      ConvertError::NestingTooDeep { .. } => None,
    }
  }
}

/// Convert an HTML fragment to Markdown with default options.
///
/// # Errors
///
/// Returns [`ConvertError::NestingTooDeep`] when the input nests deeper than
/// [`DEFAULT_MAX_DEPTH`] elements, and [`ConvertError::Parse`] when the
/// prepared input cannot be parsed.
pub fn convert(html: &str) -> Result<String, ConvertError> {
  convert_with_options(html, &ConvertOptions::default())
}

/// Convert an HTML fragment to Markdown.
///
/// # Arguments
///
/// * `html` - The HTML fragment to convert.
/// * `options` - Conversion limits.
///
/// # Returns
///
/// The Markdown document, with unsupported markup carried over verbatim.
///
/// # Examples
///
/// ```
/// # use html2markdown::markdown::{convert_with_options, ConvertOptions};
/// let options = ConvertOptions { max_depth: Some(64) };
/// let output = convert_with_options(r#"<a href="https://example.com">site</a>"#, &options).unwrap();
/// assert_eq!(output, "[site](https://example.com)");
/// ```
pub fn convert_with_options(html: &str, options: &ConvertOptions) -> Result<String, ConvertError> {
  let prepared = PreparedSource::new(html);

  if let Some(limit) = options.max_depth {
    let depth = prepared.depth();
    if depth > limit {
      debug!("Rejecting input nested {depth} elements deep (limit {limit})");
      return Err(ConvertError::NestingTooDeep { depth, limit });
    }
  }

  trace!(
    "Prepared XML (first 500 chars):\n{}",
    prepared.xml().chars().take(500).collect::<String>()
  );

  let parse_start = Instant::now();
  let document = Document::parse(prepared.xml()).map_err(|e| {
    error!("HTML parse error: {e}");
    trace!("Full prepared XML:\n{}", prepared.xml());
    ConvertError::Parse(e)
  })?;

  debug!(
    "Parsed HTML fragment in {duration:?} (length: {length} chars)",
    duration = parse_start.elapsed(),
    length = html.len()
  );

  let fragments = Rewriter::new(&prepared).rewrite_document(document.root_element());
  Ok(fragment::render_document(&fragments))
}
