//! Escaping and whitespace normalization for text nodes.

/// Characters that carry meaning in Markdown and are backslash-escaped.
const ESCAPABLE: &[char] = &['\\', '`', '*', '_', '[', ']', '#'];

/// How a text node is transformed before it becomes Markdown text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
  /// Kept as-is (document root, code, preformatted content).
  Verbatim,
  /// Markdown-significant characters escaped.
  Escaped,
  /// Escaped, space runs collapsed and newlines removed.
  Normalized,
}

impl TextMode {
  pub fn apply(self, text: &str) -> String {
    match self {
      Self::Verbatim => text.to_string(),
      Self::Escaped => escape_markdown(text),
      Self::Normalized => normalize_whitespace(&escape_markdown(text)),
    }
  }
}

/// Insert a backslash before every Markdown-significant character.
///
/// Works in a single pass, so a backslash in the input is escaped exactly
/// once and never doubles up with the escapes added for other characters.
pub fn escape_markdown(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for ch in text.chars() {
    if ESCAPABLE.contains(&ch) {
      escaped.push('\\');
    }
    escaped.push(ch);
  }
  escaped
}

/// Collapse runs of two or more spaces into one, then drop newlines.
pub fn normalize_whitespace(text: &str) -> String {
  let mut normalized = String::with_capacity(text.len());
  let mut previous_space = false;

  for ch in text.chars() {
    if ch == ' ' {
      if !previous_space {
        normalized.push(ch);
      }
      previous_space = true;
      continue;
    }

    previous_space = false;
    normalized.push(ch);
  }

  normalized.replace('\n', "")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_escape_markdown() {
    assert_eq!(escape_markdown("**bold**"), r"\*\*bold\*\*");
    assert_eq!(escape_markdown("a_b [c] #d `e`"), r"a\_b \[c\] \#d \`e\`");
    assert_eq!(escape_markdown(r"C:\path"), r"C:\\path");
    assert_eq!(escape_markdown(r"\*"), r"\\\*");
  }

  #[test]
  fn test_escape_leaves_other_characters() {
    assert_eq!(escape_markdown("1. plain + text > quote"), "1. plain + text > quote");
  }

  #[test]
  fn test_normalize_whitespace() {
    assert_eq!(normalize_whitespace("a    b"), "a b");
    assert_eq!(normalize_whitespace("line one\nline two"), "line oneline two");
    assert_eq!(normalize_whitespace("\n      "), " ");
    assert_eq!(normalize_whitespace("tab\tkept"), "tab\tkept");
  }

  #[test]
  fn test_space_run_split_by_newline() {
    // Collapsing happens before newline removal, so spaces on either side of a
    // newline survive as two spaces.
    assert_eq!(normalize_whitespace("a \n b"), "a  b");
  }

  #[test]
  fn test_text_modes() {
    assert_eq!(TextMode::Verbatim.apply("*a*  \n"), "*a*  \n");
    assert_eq!(TextMode::Escaped.apply("*a*  \n"), "\\*a\\*  \n");
    assert_eq!(TextMode::Normalized.apply("*a*  \n"), "\\*a\\* ");
  }
}
