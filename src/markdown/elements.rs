//! The tree walker that rewrites supported elements as Markdown.
//!
//! Every element is classified as supported (rewritten), inline-unsupported
//! (kept as HTML, children still converted) or block-unsupported (kept as
//! HTML, subtree untouched). Supported elements splice Markdown markers
//! around their converted children; a few of them only convert when their
//! whole subtree is convertible.

use roxmltree::Node;
use tracing::trace;

use super::escape::TextMode;
use super::fragment::{Fragment, indent_continuation_lines, plain_text};
use super::source::PreparedSource;
use super::tags::{Tag, is_inline};
use super::utils::{element_name, end_tag_range, get_attribute, has_only_allowed_attributes, sole_text, start_tag_range};
use super::validity::is_recursively_valid;

/// Which kind of list encloses the node being rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
  Unordered,
  Ordered,
}

/// Context threaded through the recursion. Never stored on nodes.
#[derive(Debug, Clone, Copy)]
struct Context {
  list: Option<ListKind>,
  ordinal: usize,
  in_blockquote: bool,
}

impl Default for Context {
  fn default() -> Self {
    Self {
      list: None,
      ordinal: 1,
      in_blockquote: false,
    }
  }
}

impl Context {
  fn blockquote() -> Self {
    Self {
      in_blockquote: true,
      ..Self::default()
    }
  }

  fn list_item(kind: ListKind, ordinal: usize) -> Self {
    Self {
      list: Some(kind),
      ordinal,
      ..Self::default()
    }
  }
}

/// Rewrites a parsed fragment into Markdown fragments.
pub struct Rewriter<'s, 'input> {
  source: &'s PreparedSource<'input>,
}

impl<'s, 'input> Rewriter<'s, 'input> {
  pub fn new(source: &'s PreparedSource<'input>) -> Self {
    Self { source }
  }

  /// Converts the children of the synthetic document root.
  ///
  /// Text directly under the root is kept as-is; elements are rewritten with
  /// a fresh context.
  pub fn rewrite_document(&self, root: Node) -> Vec<Fragment> {
    self.content(root, TextMode::Verbatim, Some(Context::default()))
  }

  fn rewrite(&self, node: Node, context: Context) -> Vec<Fragment> {
    let name = element_name(node);
    let Some(tag) = Tag::from_name(&name).filter(|tag| has_only_allowed_attributes(node, *tag)) else {
      return self.rewrite_unsupported(node, &name);
    };

    if tag.requires_valid_subtree() && !is_recursively_valid(node) {
      trace!("<{name}> has an unconvertible subtree, keeping it as HTML");
      return vec![self.retain(node, self.content(node, TextMode::Normalized, None))];
    }

    match tag {
      Tag::Paragraph => self.rewrite_paragraph(node, context),
      Tag::LineBreak => vec![Fragment::text("  \n")],
      Tag::Image => self.rewrite_image(node),
      Tag::HorizontalRule => vec![Fragment::text("\n---\n")],
      Tag::Preformatted => self.rewrite_preformatted(node),
      Tag::Code => self.rewrite_code(node),
      Tag::Blockquote => vec![Fragment::Blockquote(self.content(
        node,
        TextMode::Normalized,
        Some(Context::blockquote()),
      ))],
      Tag::Anchor => self.rewrite_anchor(node),
      Tag::Heading(level) => {
        let marker = format!("\n\n{} ", "#".repeat(usize::from(level)));
        self.surround(node, &marker, "\n\n")
      }
      Tag::UnorderedList => self.rewrite_list(node, ListKind::Unordered),
      Tag::OrderedList => self.rewrite_list(node, ListKind::Ordered),
      Tag::ListItem => self.rewrite_list_item(node, context),
      Tag::Strong => self.surround(node, "__", "__"),
      Tag::Emphasis => self.surround(node, "_", "_"),
    }
  }

  /// Unsupported tag or attribute: inline elements stay embedded with their
  /// children converted, anything else becomes a standalone HTML block.
  fn rewrite_unsupported(&self, node: Node, name: &str) -> Vec<Fragment> {
    if is_inline(name) {
      trace!("Keeping inline <{name}> as HTML");
      let children = self.content(node, TextMode::Escaped, Some(Context::default()));
      return vec![self.retain(node, children)];
    }

    trace!("Keeping block <{name}> as opaque HTML");
    vec![Fragment::text("\n\n"), self.raw(node), Fragment::text("\n\n")]
  }

  fn rewrite_paragraph(&self, node: Node, context: Context) -> Vec<Fragment> {
    if sole_text(node).is_some_and(|text| text.trim().is_empty()) {
      return vec![Fragment::text("\u{00A0}")];
    }

    let separator = if context.in_blockquote { "\n" } else { "\n\n" };
    self.surround(node, separator, separator)
  }

  fn rewrite_image(&self, node: Node) -> Vec<Fragment> {
    let Some(src) = get_attribute(node, "src") else {
      trace!("<img> without src, keeping it as HTML");
      return vec![self.raw(node)];
    };

    let alt = get_attribute(node, "alt").unwrap_or_default();
    let title = get_attribute(node, "title")
      .filter(|title| !title.is_empty())
      .map(|title| format!(" \"{title}\""))
      .unwrap_or_default();

    vec![Fragment::text(format!("![{alt}]({src}{title})"))]
  }

  /// `<pre><code>` holding only text and `<br>` becomes an indented code
  /// block. Any other shape stays as HTML.
  fn rewrite_preformatted(&self, node: Node) -> Vec<Fragment> {
    let body = match code_block_text(node) {
      Some(text) => {
        let mut lines: Vec<&str> = text.split('\n').collect();
        if lines.last().is_some_and(|line| line.is_empty()) {
          lines.pop();
        }
        let indented: Vec<String> = lines
          .iter()
          .map(|line| format!("    {}", line.replace('\u{00A0}', " ")))
          .collect();
        Fragment::text(indented.join("\n"))
      }
      None => {
        trace!("<pre> is not a plain code block, keeping it as HTML");
        self.raw(node)
      }
    };

    vec![Fragment::text("\n\n"), body, Fragment::text("\n\n")]
  }

  fn rewrite_code(&self, node: Node) -> Vec<Fragment> {
    if node.children().any(|child| child.is_element()) {
      return vec![self.raw(node)];
    }

    let mut fragments = vec![Fragment::text("`` ")];
    fragments.extend(self.content(node, TextMode::Verbatim, None));
    fragments.push(Fragment::text(" ``"));
    fragments
  }

  /// Children are converted first so the link text is final before it is
  /// compared with the target.
  fn rewrite_anchor(&self, node: Node) -> Vec<Fragment> {
    let children = self.content(node, TextMode::Normalized, Some(Context::default()));

    let Some(href) = get_attribute(node, "href") else {
      trace!("<a> without href, keeping it as HTML");
      return vec![self.retain(node, children)];
    };

    let title = get_attribute(node, "title");
    if title.is_none()
      && let Some(text) = plain_text(&children)
      && text == href
    {
      return vec![Fragment::Autolink(text)];
    }

    let title = title.map(|title| format!(" \"{title}\"")).unwrap_or_default();
    let mut fragments = Vec::with_capacity(children.len() + 2);
    fragments.push(Fragment::text("["));
    fragments.extend(children);
    fragments.push(Fragment::text(format!("]({href}{title})")));
    fragments
  }

  fn rewrite_list(&self, node: Node, kind: ListKind) -> Vec<Fragment> {
    let mut fragments = vec![Fragment::text("\n\n")];
    let mut ordinal = 0;

    for child in node.children() {
      if child.is_element() {
        ordinal += 1;
        fragments.extend(self.rewrite(child, Context::list_item(kind, ordinal)));
      } else {
        fragments.push(self.text_or_raw(child, TextMode::Normalized));
      }
    }

    fragments.push(Fragment::text("\n\n"));
    fragments
  }

  fn rewrite_list_item(&self, node: Node, context: Context) -> Vec<Fragment> {
    let marker = match context.list {
      Some(ListKind::Unordered) => "*   ".to_string(),
      Some(ListKind::Ordered) => format!("{}.   ", context.ordinal),
      None => {
        trace!("<li> outside of a list, keeping it as HTML");
        return vec![self.retain(node, self.content(node, TextMode::Normalized, None))];
      }
    };

    let mut children = self.content(node, TextMode::Normalized, Some(Context::default()));
    indent_continuation_lines(&mut children);

    let mut fragments = Vec::with_capacity(children.len() + 2);
    fragments.push(Fragment::text(marker));
    fragments.extend(children);
    fragments.push(Fragment::text("\n"));
    fragments
  }

  /// Converted children between two Markdown markers.
  fn surround(&self, node: Node, before: &str, after: &str) -> Vec<Fragment> {
    let children = self.content(node, TextMode::Normalized, Some(Context::default()));
    let mut fragments = Vec::with_capacity(children.len() + 2);
    fragments.push(Fragment::text(before));
    fragments.extend(children);
    fragments.push(Fragment::text(after));
    fragments
  }

  /// The children of `node` as fragments.
  ///
  /// Text children are transformed by `mode`. Element children are rewritten
  /// with `context`, or copied verbatim when `context` is `None`.
  fn content(&self, node: Node, mode: TextMode, context: Option<Context>) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    for child in node.children() {
      match context {
        Some(context) if child.is_element() => fragments.extend(self.rewrite(child, context)),
        _ => fragments.push(self.text_or_raw(child, mode)),
      }
    }
    fragments
  }

  fn text_or_raw(&self, node: Node, mode: TextMode) -> Fragment {
    match node.text() {
      Some(text) if node.is_text() => Fragment::text(mode.apply(text)),
      _ => self.raw(node),
    }
  }

  /// The node exactly as it appeared in the input.
  fn raw(&self, node: Node) -> Fragment {
    Fragment::raw(self.source.original_slice(node.range()))
  }

  /// Keep `node`'s own tags from the input around already converted children.
  fn retain(&self, node: Node, children: Vec<Fragment>) -> Fragment {
    if !node.has_children() {
      return self.raw(node);
    }

    Fragment::Element {
      open: self.source.original_slice(start_tag_range(node)).to_string(),
      children,
      close: self.source.original_slice(end_tag_range(node)).to_string(),
    }
  }
}

/// Text of a `<pre>` whose only element child is a plain `<code>` holding text
/// and `<br>` elements, with each break turned into a newline.
fn code_block_text(pre: Node) -> Option<String> {
  let mut elements = pre.children().filter(Node::is_element);
  let code = elements.next()?;
  if elements.next().is_some() || Tag::from_name(&element_name(code)) != Some(Tag::Code) {
    return None;
  }
  if !has_only_allowed_attributes(code, Tag::Code) {
    return None;
  }

  let mut text = String::new();
  for child in pre.children() {
    if child == code {
      for line in code.children() {
        if line.is_element() {
          if Tag::from_name(&element_name(line)) != Some(Tag::LineBreak) {
            return None;
          }
          text.push('\n');
        } else if let Some(value) = line.text().filter(|_| line.is_text()) {
          text.push_str(value);
        }
      }
    } else if let Some(value) = child.text().filter(|_| child.is_text()) {
      text.push_str(value);
    }
  }

  Some(text)
}

#[cfg(test)]
mod tests {
  use roxmltree::Document;

  use super::*;
  use crate::markdown::fragment::render_document;

  fn convert_to_markdown(input: &str) -> String {
    let prepared = PreparedSource::new(input);
    let document = Document::parse(prepared.xml()).unwrap();
    let fragments = Rewriter::new(&prepared).rewrite_document(document.root_element());
    render_document(&fragments)
  }

  #[test]
  fn test_paragraph_converts_content() {
    let output = convert_to_markdown("<p>this is stuff. <strong>stuff</strong></p>");
    assert_eq!(output, "this is stuff. __stuff__");
  }

  #[test]
  fn test_block_tag_is_opaque() {
    let input = "<div>this is stuff. <strong>stuff</strong></div>";
    assert_eq!(convert_to_markdown(input), input);
  }

  #[test]
  fn test_inline_tag_keeps_wrapper() {
    let input = r#"<span style="text-decoration:line-through;">strike <strong>through</strong> some text</span> here"#;
    let expected = r#"<span style="text-decoration:line-through;">strike __through__ some text</span> here"#;
    assert_eq!(convert_to_markdown(input), expected);
  }

  #[test]
  fn test_escaping() {
    assert_eq!(convert_to_markdown("<div>**escape me**</div>"), "<div>**escape me**</div>");
    assert_eq!(convert_to_markdown("<p>**escape me**</p>"), r"\*\*escape me\*\*");
    assert_eq!(convert_to_markdown("<span>**escape me**</span>"), r"<span>\*\*escape me\*\*</span>");
  }

  #[test]
  fn test_root_text_is_not_escaped() {
    assert_eq!(convert_to_markdown("a_b <em>c_d</em>"), r"a_b _c\_d_");
  }

  #[test]
  fn test_headings() {
    assert_eq!(convert_to_markdown("<h1>Title</h1>"), "# Title");
    assert_eq!(convert_to_markdown("<h4>Deep</h4><p>text</p>"), "#### Deep\n\ntext");
  }

  #[test]
  fn test_heading_with_unsupported_child_stays_html() {
    let input = "<h2>a<div>b</div></h2>";
    assert_eq!(convert_to_markdown(input), input);
  }

  #[test]
  fn test_emphasis() {
    assert_eq!(convert_to_markdown("<p><b>a</b> <i>b</i> <em>c</em></p>"), "__a__ _b_ _c_");
  }

  #[test]
  fn test_anchor_forms() {
    assert_eq!(convert_to_markdown("before <a>test</a> after"), "before <a>test</a> after");
    assert_eq!(convert_to_markdown("<a></a>"), "<a></a>");
    assert_eq!(convert_to_markdown(r#"<a href="test">test</a>"#), "<test>");
    assert_eq!(convert_to_markdown(r#"<a href="test2">test</a>"#), "[test](test2)");
    assert_eq!(
      convert_to_markdown(r#"<a href="test" title="test">test</a>"#),
      r#"[test](test "test")"#
    );
  }

  #[test]
  fn test_anchor_with_formatted_text() {
    assert_eq!(
      convert_to_markdown(r#"<a href="/x">go <b>now</b></a>"#),
      "[go __now__](/x)"
    );
  }

  #[test]
  fn test_anchor_with_disallowed_attribute_stays_inline() {
    let input = r#"<a href="x" class="c">t</a>"#;
    assert_eq!(convert_to_markdown(input), input);
  }

  #[test]
  fn test_anchor_without_href_still_converts_children() {
    assert_eq!(convert_to_markdown("<a><b>x</b></a>"), "<a>__x__</a>");
  }

  #[test]
  fn test_image() {
    assert_eq!(convert_to_markdown(r#"<img src="a.png" alt="pic"/>"#), "![pic](a.png)");
    assert_eq!(
      convert_to_markdown(r#"<img src="a.png" alt="pic" title="T"/>"#),
      r#"![pic](a.png "T")"#
    );
    assert_eq!(convert_to_markdown(r#"<img src="a.png" title=""/>"#), "![](a.png)");
  }

  #[test]
  fn test_image_with_disallowed_attribute_is_opaque() {
    let input = r#"<p>x</p><img src="a.png" width="10">"#;
    assert_eq!(convert_to_markdown(input), "x\n\n<img src=\"a.png\" width=\"10\">");
  }

  #[test]
  fn test_line_break_and_rule() {
    assert_eq!(convert_to_markdown("<p>one<br/>two</p>"), "one  \ntwo");
    assert_eq!(convert_to_markdown("<p>a</p><hr/><p>b</p>"), "a\n\n---\n\nb");
  }

  #[test]
  fn test_empty_paragraph_becomes_nbsp() {
    assert_eq!(convert_to_markdown("<p>a</p><p> </p><p>b</p>"), "a\n\n&nbsp;\n\nb");
    assert_eq!(convert_to_markdown("<p><b>  </b></p>"), "&nbsp;");
    assert_eq!(convert_to_markdown("<p></p>x"), "x");
  }

  #[test]
  fn test_whitespace_is_normalized() {
    assert_eq!(convert_to_markdown("<p>a    b\nc</p>"), "a bc");
  }

  #[test]
  fn test_code_span() {
    assert_eq!(convert_to_markdown("<p>Use <code>a*b</code> here</p>"), "Use `` a*b `` here");
    let input = "<p><code>a<b>b</b></code></p>";
    assert_eq!(convert_to_markdown(input), "<code>a<b>b</b></code>");
  }

  #[test]
  fn test_code_block() {
    let output = convert_to_markdown("<pre><code>line1<br/>line2</code></pre>");
    assert_eq!(output, "    line1\n    line2");
  }

  #[test]
  fn test_code_block_keeps_literal_text() {
    let output = convert_to_markdown("<pre><code>a  *b*&nbsp;c<br>x &lt; y</code></pre>");
    assert_eq!(output, "    a  *b* c\n    x &lt; y");
  }

  #[test]
  fn test_pre_without_code_shape_is_opaque() {
    let input = "<pre><code class=\"rust\">fn main() {}</code></pre>";
    assert_eq!(convert_to_markdown(input), input);
    let input = "<pre><code>a<span>b</span></code></pre>";
    assert_eq!(convert_to_markdown(input), input);
    let input = "<pre>plain</pre>";
    assert_eq!(convert_to_markdown(input), input);
  }

  #[test]
  fn test_unordered_list() {
    let output = convert_to_markdown("<ul><li>one</li><li>two</li></ul>");
    assert_eq!(output, "*   one\n*   two");
  }

  #[test]
  fn test_ordered_list_numbers_items() {
    let output = convert_to_markdown("<ol>\n  <li>one</li>\n  <li>two</li>\n</ol>");
    assert_eq!(output, " 1.   one\n 2.   two");
  }

  #[test]
  fn test_nested_list_is_indented() {
    let output = convert_to_markdown("<ul><li>parent<ul><li>child</li></ul></li></ul>");
    assert_eq!(output, "*   parent\n    \n    *   child\n    \n    \n    ");
  }

  #[test]
  fn test_orphan_list_item_stays_html() {
    let input = "<li>a_b</li>";
    assert_eq!(convert_to_markdown(input), r"<li>a\_b</li>");
  }

  #[test]
  fn test_list_with_unsupported_item_content_stays_html() {
    let input = "<ul><li><div>x</div></li></ul>";
    assert_eq!(convert_to_markdown(input), input);
  }

  #[test]
  fn test_blockquote() {
    let output = convert_to_markdown("<blockquote><p>quoted</p></blockquote>");
    assert_eq!(output, "> \n> quoted\n> ");
  }

  #[test]
  fn test_blockquote_with_unsupported_content_stays_html() {
    let input = r#"<blockquote><p style="x">a</p></blockquote>"#;
    assert_eq!(convert_to_markdown(input), input);
  }

  #[test]
  fn test_comments_are_preserved() {
    assert_eq!(convert_to_markdown("<p>a<!-- note -->b</p>"), "a<!-- note -->b");
  }

  #[test]
  fn test_foreign_elements_are_opaque() {
    let input = "<o:p>&nbsp;</o:p>";
    assert_eq!(convert_to_markdown(input), input);
  }
}
