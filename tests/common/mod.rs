//! Helpers shared by the integration tests.

#![allow(dead_code)]

pub mod fixtures;

use pulldown_cmark::{Parser, html};

/// Render Markdown to HTML with a CommonMark renderer.
pub fn render_html(markdown: &str) -> String {
  let mut output = String::new();
  html::push_html(&mut output, Parser::new(markdown));
  output
}

/// Text of every `<li>` element in rendered HTML, in document order.
pub fn list_items(rendered: &str) -> Vec<String> {
  rendered
    .split("<li>")
    .skip(1)
    .filter_map(|segment| segment.split_once("</li>").map(|(item, _)| item.to_string()))
    .collect()
}
