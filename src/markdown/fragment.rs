//! Output model produced by the rewriter and its final rendering.
//!
//! Each node of the parsed tree is replaced by a list of [`Fragment`]s. The
//! tree stays structured until [`render_document`] flattens it, so quoting and
//! autolinks are rendered directly instead of being smuggled through the text
//! as markers.

/// A piece of rewritten output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
  /// Markdown text. `&`, `<` and `>` are entity-encoded when rendered.
  Text(String),
  /// Markup copied verbatim from the input.
  Raw(String),
  /// A tag kept as HTML around converted content.
  Element {
    open: String,
    children: Vec<Fragment>,
    close: String,
  },
  /// A link whose text is its own target, rendered as `<text>`.
  Autolink(String),
  /// Quoted content, rendered with `> ` line prefixes.
  Blockquote(Vec<Fragment>),
}

impl Fragment {
  pub fn text(text: impl Into<String>) -> Self {
    Self::Text(text.into())
  }

  pub fn raw(markup: impl Into<String>) -> Self {
    Self::Raw(markup.into())
  }
}

/// Concatenated text when every fragment is plain text.
pub fn plain_text(fragments: &[Fragment]) -> Option<String> {
  fragments
    .iter()
    .map(|fragment| match fragment {
      Fragment::Text(text) => Some(text.as_str()),
      _ => None,
    })
    .collect()
}

/// Indent every line break inside a list item by four spaces so continuation
/// lines stay under the item marker.
///
/// Retained elements and raw markup are left alone.
pub fn indent_continuation_lines(fragments: &mut [Fragment]) {
  for fragment in fragments {
    match fragment {
      Fragment::Text(text) if text.contains('\n') => *text = text.replace('\n', "\n    "),
      Fragment::Blockquote(children) => indent_continuation_lines(children),
      _ => {}
    }
  }
}

/// Flatten fragments into the final Markdown document.
pub fn render_document(fragments: &[Fragment]) -> String {
  let rendered = render(fragments).replace('\u{00A0}', "&nbsp;");
  collapse_blank_lines(&rendered).trim_matches('\n').to_string()
}

fn render(fragments: &[Fragment]) -> String {
  let mut output = String::new();
  render_into(fragments, &mut output);
  output
}

fn render_into(fragments: &[Fragment], output: &mut String) {
  for fragment in fragments {
    match fragment {
      Fragment::Text(text) => push_encoded(output, text),
      Fragment::Raw(markup) => output.push_str(markup),
      Fragment::Element { open, children, close } => {
        output.push_str(open);
        render_into(children, output);
        output.push_str(close);
      }
      Fragment::Autolink(text) => {
        output.push('<');
        push_encoded(output, text);
        output.push('>');
      }
      Fragment::Blockquote(children) => {
        let body = collapse_blank_lines(&render(children));
        output.push_str("> ");
        output.push_str(&body.replace('\n', "\n> "));
      }
    }
  }
}

/// Encode text the way an HTML serializer writes a text node.
fn push_encoded(output: &mut String, text: &str) {
  for ch in text.chars() {
    match ch {
      '&' => output.push_str("&amp;"),
      '<' => output.push_str("&lt;"),
      '>' => output.push_str("&gt;"),
      _ => output.push(ch),
    }
  }
}

/// Collapse every run of three or more newlines to exactly two.
pub fn collapse_blank_lines(content: &str) -> String {
  let mut result = String::with_capacity(content.len());
  let mut newlines = 0;

  for ch in content.chars() {
    if ch == '\n' {
      newlines += 1;
      if newlines > 2 {
        continue;
      }
    } else {
      newlines = 0;
    }
    result.push(ch);
  }

  result
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_collapse_blank_lines() {
    assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
    assert_eq!(collapse_blank_lines("a\n\nb\nc"), "a\n\nb\nc");
    assert_eq!(collapse_blank_lines("\n\n\n"), "\n\n");
  }

  #[test]
  fn test_text_is_encoded() {
    let fragments = vec![Fragment::text("a < b && c > d")];
    assert_eq!(render_document(&fragments), "a &lt; b &amp;&amp; c &gt; d");
  }

  #[test]
  fn test_raw_is_verbatim() {
    let fragments = vec![Fragment::raw("<div a=\"1 & 2\">x</div>")];
    assert_eq!(render_document(&fragments), "<div a=\"1 & 2\">x</div>");
  }

  #[test]
  fn test_non_breaking_space_becomes_entity() {
    let fragments = vec![Fragment::text("\u{00A0}")];
    assert_eq!(render_document(&fragments), "&nbsp;");
  }

  #[test]
  fn test_autolink() {
    let fragments = vec![Fragment::Autolink("http://a?b&c".to_string())];
    assert_eq!(render_document(&fragments), "<http://a?b&amp;c>");
  }

  #[test]
  fn test_blockquote_prefixes_every_line() {
    let fragments = vec![Fragment::Blockquote(vec![
      Fragment::text("\none\n"),
      Fragment::text("\n\n\ntwo"),
    ])];
    assert_eq!(render_document(&fragments), "> \n> one\n> \n> two");
  }

  #[test]
  fn test_nested_blockquotes() {
    let inner = Fragment::Blockquote(vec![Fragment::text("\ninner\n")]);
    let fragments = vec![Fragment::Blockquote(vec![Fragment::text("\nouter\n"), inner])];
    assert_eq!(render_document(&fragments), "> \n> outer\n> > \n> > inner\n> > ");
  }

  #[test]
  fn test_element_wraps_children() {
    let fragments = vec![Fragment::Element {
      open: "<span>".to_string(),
      children: vec![Fragment::text("a"), Fragment::text("__b__")],
      close: "</span>".to_string(),
    }];
    assert_eq!(render_document(&fragments), "<span>a__b__</span>");
  }

  #[test]
  fn test_trims_outer_newlines_only() {
    let fragments = vec![Fragment::text("\n\n    code\n\n")];
    assert_eq!(render_document(&fragments), "    code");
  }

  #[test]
  fn test_plain_text() {
    assert_eq!(
      plain_text(&[Fragment::text("a"), Fragment::text("b")]),
      Some("ab".to_string())
    );
    assert_eq!(plain_text(&[Fragment::text("a"), Fragment::raw("<i/>")]), None);
    assert_eq!(plain_text(&[]), Some(String::new()));
  }

  #[test]
  fn test_indent_continuation_lines() {
    let mut fragments = vec![
      Fragment::text("a\nb"),
      Fragment::raw("<x>\n</x>"),
      Fragment::Blockquote(vec![Fragment::text("\nq")]),
    ];
    indent_continuation_lines(&mut fragments);
    assert_eq!(fragments[0], Fragment::text("a\n    b"));
    assert_eq!(fragments[1], Fragment::raw("<x>\n</x>"));
    assert_eq!(fragments[2], Fragment::Blockquote(vec![Fragment::text("\n    q")]));
  }
}
