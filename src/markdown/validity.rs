//! Recursive convertibility check.
//!
//! Block quotes, links, headings, lists and emphasis are only rewritten when
//! everything beneath them can be expressed in Markdown: a single
//! unsupported descendant keeps the whole ancestor as HTML. Paragraphs do not
//! need this and simply embed whatever they cannot convert.

use roxmltree::Node;
use tracing::trace;

use super::tags::{Tag, is_inline};
use super::utils::{element_name, has_only_allowed_attributes, is_document_root};

/// Returns `true` when `node` and every element beneath it is the document
/// root, an inline element, or a supported tag with allowed attributes.
pub fn is_recursively_valid(node: Node) -> bool {
  node.children().filter(Node::is_element).all(is_recursively_valid) && is_valid_element(node)
}

fn is_valid_element(node: Node) -> bool {
  if is_document_root(node) {
    return true;
  }

  let name = element_name(node);
  if is_inline(&name) {
    return true;
  }

  let valid = Tag::from_name(&name).is_some_and(|tag| has_only_allowed_attributes(node, tag));
  if !valid {
    trace!("<{name}> blocks conversion of its ancestors");
  }
  valid
}
