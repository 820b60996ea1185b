//! Tag classification tables.
//!
//! Decides which elements can be rewritten as Markdown, which attributes each
//! of them may carry, and which elements are inline (safe to leave embedded in
//! Markdown text without forcing a block boundary).

/// Elements with a native Markdown rendition.
///
/// An element only converts when every attribute it carries is listed in
/// [`Tag::allowed_attributes`]; otherwise it is treated as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
  Blockquote,
  Paragraph,
  Anchor,
  Heading(u8),
  /// `strong` and `b`
  Strong,
  /// `em` and `i`
  Emphasis,
  UnorderedList,
  OrderedList,
  ListItem,
  LineBreak,
  Image,
  Preformatted,
  Code,
  HorizontalRule,
}

impl Tag {
  /// Look up the supported tag for an element name, ignoring ASCII case.
  pub fn from_name(name: &str) -> Option<Self> {
    let tag = match name.to_ascii_lowercase().as_str() {
      "blockquote" => Self::Blockquote,
      "p" => Self::Paragraph,
      "a" => Self::Anchor,
      "h1" => Self::Heading(1),
      "h2" => Self::Heading(2),
      "h3" => Self::Heading(3),
      "h4" => Self::Heading(4),
      "h5" => Self::Heading(5),
      "h6" => Self::Heading(6),
      "strong" | "b" => Self::Strong,
      "em" | "i" => Self::Emphasis,
      "ul" => Self::UnorderedList,
      "ol" => Self::OrderedList,
      "li" => Self::ListItem,
      "br" => Self::LineBreak,
      "img" => Self::Image,
      "pre" => Self::Preformatted,
      "code" => Self::Code,
      "hr" => Self::HorizontalRule,
      _ => return None,
    };
    Some(tag)
  }

  /// Attribute names this tag may carry and still convert.
  pub fn allowed_attributes(self) -> &'static [&'static str] {
    match self {
      Self::Anchor => &["href", "title"],
      Self::Image => &["alt", "src", "title"],
      _ => &[],
    }
  }

  /// Whether `attribute` is on this tag's allow-list (ASCII case-insensitive).
  pub fn permits(self, attribute: &str) -> bool {
    self
      .allowed_attributes()
      .iter()
      .any(|allowed| allowed.eq_ignore_ascii_case(attribute))
  }

  /// Whether converting this tag requires every descendant to be convertible.
  ///
  /// Paragraphs, breaks, images, rules and code are rewritten before the
  /// subtree check and never consult it.
  pub fn requires_valid_subtree(self) -> bool {
    !matches!(
      self,
      Self::Paragraph | Self::LineBreak | Self::Image | Self::HorizontalRule | Self::Preformatted | Self::Code
    )
  }
}

/// Element names that may be mixed with Markdown text. Kept sorted for
/// binary search.
const INLINE_TAGS: &[&str] = &[
  "a", "abbr", "acronym", "audio", "b", "bdi", "bdo", "big", "button", "cite", "code", "data", "datalist", "del",
  "dfn", "em", "i", "ins", "kbd", "label", "map", "mark", "meter", "object", "picture", "q", "ruby", "s", "samp",
  "select", "slot", "small", "span", "strike", "strong", "sub", "sup", "svg", "template", "textarea", "time", "tt",
  "u", "var", "wbr",
];

/// Whether `name` names a supported tag.
pub fn is_supported(name: &str) -> bool {
  Tag::from_name(name).is_some()
}

/// Attribute allow-list for an element name; empty for unsupported names.
pub fn allowed_attributes(name: &str) -> &'static [&'static str] {
  Tag::from_name(name).map(Tag::allowed_attributes).unwrap_or_default()
}

/// Whether `name` is an inline element.
pub fn is_inline(name: &str) -> bool {
  let lowered = name.to_ascii_lowercase();
  INLINE_TAGS.binary_search(&lowered.as_str()).is_ok()
}
