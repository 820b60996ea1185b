//! Utility functions for working with parsed `roxmltree` nodes.
//!
//! Provides helpers for namespace-aware element names, attribute access,
//! text extraction and the byte ranges of start and end tags.

use std::borrow::Cow;
use std::ops::Range;

use roxmltree::Node;

use super::source::{ROOT_TAG, SYNTHETIC_NS_BASE};
use super::tags::Tag;

/// Builds the name used to classify an element.
///
/// Every prefix is declared on the synthetic root, so prefixed elements keep
/// their prefix (`o:p`) and can never match an HTML tag. `xmlns` attributes
/// are renamed during preparation, so unprefixed elements are never in a
/// namespace.
///
/// # Arguments
/// * `node` - The element whose name should be normalized.
///
/// # Returns
/// The classification name, borrowed from the document when no prefix is
/// needed.
pub fn element_name<'a>(node: Node<'a, '_>) -> Cow<'a, str> {
  let tag = node.tag_name();
  match tag.namespace().and_then(|ns| ns.strip_prefix(SYNTHETIC_NS_BASE)) {
    Some(prefix) => Cow::Owned(format!("{prefix}:{}", tag.name())),
    None => Cow::Borrowed(tag.name()),
  }
}

/// Whether the node is the synthetic root wrapping the fragment.
pub fn is_document_root(node: Node) -> bool {
  node.is_element() && node.tag_name().namespace().is_none() && node.tag_name().name() == ROOT_TAG
}

/// Retrieves an un-namespaced attribute value, ignoring ASCII case.
///
/// # Arguments
/// * `node` - The element to inspect.
/// * `attr_name` - Attribute to look up, such as `href`.
///
/// # Returns
/// `Some(&str)` containing the decoded value when present, otherwise `None`.
pub fn get_attribute<'a>(node: Node<'a, '_>, attr_name: &str) -> Option<&'a str> {
  node
    .attributes()
    .find(|attr| attr.namespace().is_none() && attr.name().eq_ignore_ascii_case(attr_name))
    .map(|attr| attr.value())
}

/// Tests whether every attribute on `node` is on `tag`'s allow-list.
///
/// Namespaced attributes are never allowed.
pub fn has_only_allowed_attributes(node: Node, tag: Tag) -> bool {
  node
    .attributes()
    .all(|attr| attr.namespace().is_none() && tag.permits(attr.name()))
}

/// Returns the text of a node that holds exactly one piece of text.
///
/// A node qualifies when it has a single child which is either text or an
/// element that itself qualifies, so `<p><b> </b></p>` yields `" "` while
/// `<p>a<b>b</b></p>` and `<p></p>` yield `None`.
pub fn sole_text<'a>(node: Node<'a, '_>) -> Option<&'a str> {
  let mut children = node.children();
  let only = children.next()?;
  if children.next().is_some() {
    return None;
  }

  if only.is_text() {
    only.text()
  } else if only.is_element() {
    sole_text(only)
  } else {
    None
  }
}

/// Byte range of an element's start tag in the prepared text.
///
/// Elements without children are returned whole.
pub fn start_tag_range(node: Node) -> Range<usize> {
  let range = node.range();
  match node.first_child() {
    Some(first) => range.start..first.range().start,
    None => range,
  }
}

/// Byte range of an element's end tag in the prepared text; empty for
/// elements without children.
pub fn end_tag_range(node: Node) -> Range<usize> {
  let range = node.range();
  match node.last_child() {
    Some(last) => last.range().end..range.end,
    None => range.end..range.end,
  }
}

#[cfg(test)]
mod tests {
  use roxmltree::Document;

  use super::*;
  use crate::markdown::source::PreparedSource;

  fn find<'a, 'input>(document: &'a Document<'input>, name: &str) -> Node<'a, 'input> {
    document
      .descendants()
      .find(|node| node.is_element() && element_name(*node) == name)
      .unwrap()
  }

  #[test]
  fn test_element_name_keeps_synthetic_prefix() {
    let prepared = PreparedSource::new("<o:p>x</o:p>");
    let document = Document::parse(prepared.xml()).unwrap();
    let node = document.root_element().first_child().unwrap();
    assert_eq!(element_name(node), "o:p");
  }

  #[test]
  fn test_element_name_ignores_default_namespace_declaration() {
    let prepared = PreparedSource::new(r#"<svg xmlns="http://www.w3.org/2000/svg"><circle r="1"/></svg>"#);
    let document = Document::parse(prepared.xml()).unwrap();
    let svg = document.root_element().first_child().unwrap();
    assert_eq!(element_name(svg), "svg");
    assert!(svg.tag_name().namespace().is_none());
  }

  #[test]
  fn test_get_attribute() {
    let document = Document::parse(r#"<a HREF="x" title="t">y</a>"#).unwrap();
    let node = document.root_element();
    assert_eq!(get_attribute(node, "href"), Some("x"));
    assert_eq!(get_attribute(node, "title"), Some("t"));
    assert_eq!(get_attribute(node, "alt"), None);
  }

  #[test]
  fn test_allowed_attributes() {
    let document = Document::parse(r#"<r><a href="x">y</a><a class="c">z</a></r>"#).unwrap();
    let mut anchors = document.descendants().filter(|n| n.has_tag_name("a"));
    assert!(has_only_allowed_attributes(anchors.next().unwrap(), Tag::Anchor));
    assert!(!has_only_allowed_attributes(anchors.next().unwrap(), Tag::Anchor));
  }

  #[test]
  fn test_sole_text() {
    let document = Document::parse("<r><p><b> </b></p><div>a<b>b</b></div><ul></ul></r>").unwrap();
    assert_eq!(sole_text(find(&document, "p")), Some(" "));
    assert_eq!(sole_text(find(&document, "div")), None);
    assert_eq!(sole_text(find(&document, "ul")), None);
  }

  #[test]
  fn test_tag_ranges() {
    let input = r#"<r><span class="x">a<b>b</b></span><i/></r>"#;
    let document = Document::parse(input).unwrap();
    let span = find(&document, "span");
    assert_eq!(&input[start_tag_range(span)], r#"<span class="x">"#);
    assert_eq!(&input[end_tag_range(span)], "</span>");

    let empty = find(&document, "i");
    assert_eq!(&input[start_tag_range(empty)], "<i/>");
    assert!(end_tag_range(empty).is_empty());
  }
}
