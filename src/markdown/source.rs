//! Preparation of HTML fragments for XML parsing.
//!
//! `roxmltree` only reads well-formed XML, while callers hand us HTML. This
//! module tokenizes the fragment leniently, the way an HTML parser would, and
//! writes the equivalent XML: names lowercased, attribute values quoted and
//! decoded, character references resolved, void and self-closing elements
//! closed, end tags that HTML implies inserted and stray end tags dropped.
//! Comments, declarations and processing instructions become empty XML
//! comments. The result is wrapped in a synthetic root element.
//!
//! Every token written is anchored to its span in the caller's input, so the
//! byte range of any parsed node maps back onto the input. Markup the
//! converter leaves alone is always sliced from the original input, never
//! from the prepared copy.

use std::collections::BTreeSet;
use std::ops::Range;

use super::entities::decode_entities;

/// Name of the synthetic element wrapping every fragment.
pub const ROOT_TAG: &str = "h2m-root";

/// Synthetic namespace base URL for prefixed names.
pub const SYNTHETIC_NS_BASE: &str = "https://html2markdown.invalid/ns/";

/// Element name written for tags that are not valid XML names.
const UNKNOWN_ELEMENT: &str = "h2m-unknown";

/// Prefix for attributes whose own name cannot be written as XML, including
/// `xmlns` declarations.
const RENAMED_ATTRIBUTE: &str = "h2m-attr-";

/// Stand-in for comments, declarations and processing instructions.
const OPAQUE_MARKUP: &str = "<!---->";

/// Elements that never have content in HTML.
const VOID_ELEMENTS: &[&str] = &[
  "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose content is raw text up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Start tags that close an open paragraph.
const CLOSES_PARAGRAPH: &[&str] = &[
  "address",
  "article",
  "aside",
  "blockquote",
  "center",
  "details",
  "dialog",
  "dir",
  "div",
  "dl",
  "dd",
  "dt",
  "fieldset",
  "figcaption",
  "figure",
  "footer",
  "form",
  "h1",
  "h2",
  "h3",
  "h4",
  "h5",
  "h6",
  "header",
  "hgroup",
  "hr",
  "li",
  "listing",
  "main",
  "menu",
  "nav",
  "ol",
  "p",
  "plaintext",
  "pre",
  "search",
  "section",
  "summary",
  "table",
  "ul",
  "xmp",
];

/// Elements that hide an outer paragraph from a closing start tag.
const BUTTON_SCOPE: &[&str] = &[
  "applet", "button", "caption", "html", "marquee", "object", "table", "td", "template", "th",
];

/// Elements that hide an outer list item from a new one.
const SPECIAL_ELEMENTS: &[&str] = &[
  "applet",
  "area",
  "article",
  "aside",
  "base",
  "blockquote",
  "body",
  "button",
  "caption",
  "center",
  "col",
  "colgroup",
  "details",
  "dir",
  "dl",
  "embed",
  "fieldset",
  "figcaption",
  "figure",
  "footer",
  "form",
  "h1",
  "h2",
  "h3",
  "h4",
  "h5",
  "h6",
  "head",
  "header",
  "hgroup",
  "html",
  "iframe",
  "listing",
  "main",
  "marquee",
  "menu",
  "nav",
  "noscript",
  "object",
  "ol",
  "pre",
  "search",
  "section",
  "select",
  "summary",
  "table",
  "tbody",
  "td",
  "template",
  "textarea",
  "tfoot",
  "th",
  "thead",
  "tr",
  "ul",
  "xmp",
];

/// A point where the prepared text and the input are known to line up.
#[derive(Debug, Clone, Copy)]
struct Anchor {
  /// Offset in the prepared body.
  prepared: usize,
  /// Offset in the input.
  original: usize,
}

/// Which input offset to pick when several anchors share a prepared offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bias {
  /// The latest, so a node starts after anything dropped before it.
  Start,
  /// The earliest, so a node ends before anything dropped after it.
  End,
}

/// An HTML fragment ready for `roxmltree`, with a map back to the input.
#[derive(Debug)]
pub struct PreparedSource<'a> {
  original: &'a str,
  xml: String,
  body_start: usize,
  anchors: Vec<Anchor>,
  depth: usize,
}

impl<'a> PreparedSource<'a> {
  /// Prepare `original` for parsing.
  pub fn new(original: &'a str) -> Self {
    let mut builder = Builder::new(original);
    builder.run();

    let mut xml = open_root_element(&builder.prefixes);
    let body_start = xml.len();
    xml.push_str(&builder.body);
    xml.push_str("</");
    xml.push_str(ROOT_TAG);
    xml.push('>');

    Self {
      original,
      xml,
      body_start,
      anchors: builder.anchors,
      depth: builder.depth,
    }
  }

  /// The well-formed XML text to hand to the parser.
  pub fn xml(&self) -> &str {
    &self.xml
  }

  /// Deepest element nesting in the fragment; top-level elements are at
  /// depth 1.
  pub fn depth(&self) -> usize {
    self.depth
  }

  /// The caller's input for a byte range of the prepared text.
  pub fn original_slice(&self, range: Range<usize>) -> &'a str {
    let start = self.original_offset(range.start, Bias::Start);
    let end = self.original_offset(range.end, Bias::End);
    &self.original[start..end.max(start)]
  }

  fn original_offset(&self, prepared: usize, bias: Bias) -> usize {
    let prepared = prepared.saturating_sub(self.body_start);
    let first_at = self.anchors.partition_point(|anchor| anchor.prepared < prepared);
    let after = self.anchors.partition_point(|anchor| anchor.prepared <= prepared);

    if first_at < after {
      let index = match bias {
        Bias::Start => after - 1,
        Bias::End => first_at,
      };
      return self.anchors[index].original;
    }

    let base = after.checked_sub(1).map_or(
      Anchor {
        prepared: 0,
        original: 0,
      },
      |index| self.anchors[index],
    );
    let limit = self
      .anchors
      .get(after)
      .map_or(self.original.len(), |anchor| anchor.original);
    let mut offset = (base.original + (prepared - base.prepared)).min(limit);
    while !self.original.is_char_boundary(offset) {
      offset -= 1;
    }
    offset
  }
}

/// One piece of markup starting with `<`.
#[derive(Debug, PartialEq, Eq)]
enum Markup {
  Start(StartTag),
  End { name: String, len: usize },
  /// Comments, declarations, CDATA sections and processing instructions.
  Opaque { len: usize },
  /// `</>`, which HTML drops.
  Ignored { len: usize },
}

#[derive(Debug, PartialEq, Eq)]
struct StartTag {
  name: String,
  attributes: Vec<(String, String)>,
  self_closing: bool,
  len: usize,
}

#[derive(Debug)]
struct OpenElement {
  name: String,
  xml_name: String,
}

/// Writes the XML body while walking the input once.
struct Builder<'a> {
  input: &'a str,
  body: String,
  anchors: Vec<Anchor>,
  open: Vec<OpenElement>,
  prefixes: BTreeSet<String>,
  depth: usize,
}

impl<'a> Builder<'a> {
  fn new(input: &'a str) -> Self {
    Self {
      input,
      body: String::with_capacity(input.len() + input.len() / 8),
      anchors: Vec::new(),
      open: Vec::new(),
      prefixes: BTreeSet::new(),
      depth: 0,
    }
  }

  fn run(&mut self) {
    let input = self.input;
    let mut text_start = 0;
    let mut index = 0;

    while let Some(offset) = input[index..].find('<') {
      let start = index + offset;
      let Some(markup) = read_markup(&input[start..]) else {
        index = start + 1;
        continue;
      };

      self.emit_text(text_start..start);
      let end = match markup {
        Markup::Start(tag) => self.start_element(tag, start),
        Markup::End { name, len } => self.end_element(&name, start, start + len),
        Markup::Opaque { len } => {
          self.emit_opaque(start..start + len);
          start + len
        }
        Markup::Ignored { len } => start + len,
      };
      index = end;
      text_start = end;
    }

    self.emit_text(text_start..input.len());
    self.close_to(0, input.len());
  }

  /// Write a start tag; returns the input offset where scanning resumes.
  fn start_element(&mut self, tag: StartTag, start: usize) -> usize {
    self.close_implied(&tag.name, start);

    let end = start + tag.len;
    let xml_name = self.xml_element_name(&tag.name);
    self.depth = self.depth.max(self.open.len() + 1);

    self.anchor(start);
    self.body.push('<');
    self.body.push_str(&xml_name);
    for (index, (name, value)) in tag.attributes.iter().enumerate() {
      let attribute = self.xml_attribute_name(name, index);
      self.body.push(' ');
      self.body.push_str(&attribute);
      self.body.push_str("=\"");
      push_escaped(&mut self.body, value, true);
      self.body.push('"');
    }

    if tag.self_closing || VOID_ELEMENTS.contains(&tag.name.as_str()) {
      self.body.push_str("/>");
      self.anchor(end);
      return end;
    }

    self.body.push('>');
    self.anchor(end);

    let raw_text = RAW_TEXT_ELEMENTS.contains(&tag.name.as_str());
    let content_end = if raw_text {
      raw_text_end(self.input, end, &tag.name)
    } else {
      end
    };
    self.open.push(OpenElement {
      name: tag.name,
      xml_name,
    });

    if raw_text && content_end > end {
      let input = self.input;
      self.anchor(end);
      push_escaped(&mut self.body, &input[end..content_end], false);
      self.anchor(content_end);
    }
    content_end
  }

  /// Close the nearest open element called `name`, with every element opened
  /// after it. End tags with nothing to close are dropped.
  fn end_element(&mut self, name: &str, start: usize, end: usize) -> usize {
    let Some(index) = self.open.iter().rposition(|element| element.name == name) else {
      return end;
    };

    self.close_to(index + 1, start);
    if let Some(element) = self.open.pop() {
      self.emit_close(&element, start, end);
    }
    end
  }

  /// Close the elements a start tag called `name` ends implicitly.
  fn close_implied(&mut self, name: &str, at: usize) {
    if CLOSES_PARAGRAPH.contains(&name)
      && let Some(index) = self.find_open(&["p"], |open| BUTTON_SCOPE.contains(&open))
    {
      self.close_to(index, at);
    }

    if is_heading(name) && self.open.last().is_some_and(|top| is_heading(&top.name)) {
      self.close_to(self.open.len() - 1, at);
      return;
    }

    let siblings: &[&str] = match name {
      "li" => &["li"],
      "dd" | "dt" => &["dd", "dt"],
      _ => return,
    };
    if let Some(index) = self.find_open(siblings, |open| SPECIAL_ELEMENTS.contains(&open)) {
      self.close_to(index, at);
    }
  }

  /// Index of the nearest open element named in `targets`, unless an element
  /// for which `stop` holds is open inside it.
  fn find_open(&self, targets: &[&str], stop: impl Fn(&str) -> bool) -> Option<usize> {
    for (index, element) in self.open.iter().enumerate().rev() {
      if targets.contains(&element.name.as_str()) {
        return Some(index);
      }
      if stop(&element.name) {
        return None;
      }
    }
    None
  }

  /// Close open elements until only `len` remain. The closing tags take no
  /// room in the input and sit at `at`.
  fn close_to(&mut self, len: usize, at: usize) {
    while self.open.len() > len {
      if let Some(element) = self.open.pop() {
        self.emit_close(&element, at, at);
      }
    }
  }

  fn emit_close(&mut self, element: &OpenElement, start: usize, end: usize) {
    self.anchor(start);
    self.body.push_str("</");
    self.body.push_str(&element.xml_name);
    self.body.push('>');
    self.anchor(end);
  }

  fn emit_text(&mut self, range: Range<usize>) {
    if range.is_empty() {
      return;
    }
    let input = self.input;
    self.anchor(range.start);
    let text = decode_entities(&input[range.clone()]);
    push_escaped(&mut self.body, &text, false);
    self.anchor(range.end);
  }

  fn emit_opaque(&mut self, range: Range<usize>) {
    self.anchor(range.start);
    self.body.push_str(OPAQUE_MARKUP);
    self.anchor(range.end);
  }

  fn anchor(&mut self, original: usize) {
    self.anchors.push(Anchor {
      prepared: self.body.len(),
      original,
    });
  }

  fn xml_element_name(&mut self, name: &str) -> String {
    if !is_qualified_name(name) {
      return UNKNOWN_ELEMENT.to_string();
    }
    self.declare_prefix(name);
    name.to_string()
  }

  fn xml_attribute_name(&mut self, name: &str, index: usize) -> String {
    if name == "xmlns" || name.starts_with("xmlns:") || !is_qualified_name(name) {
      return format!("{RENAMED_ATTRIBUTE}{index}");
    }
    self.declare_prefix(name);
    name.to_string()
  }

  fn declare_prefix(&mut self, name: &str) {
    if let Some((prefix, _)) = name.split_once(':')
      && prefix != "xml"
    {
      self.prefixes.insert(prefix.to_string());
    }
  }
}

/// Recognize the markup at the start of `rest`, which begins with `<`.
///
/// Returns `None` when the `<` is plain text.
fn read_markup(rest: &str) -> Option<Markup> {
  let through = |pattern: &str, from: usize| {
    rest[from..]
      .find(pattern)
      .map_or(rest.len(), |offset| from + offset + pattern.len())
  };

  if rest.starts_with("<!--") {
    return Some(Markup::Opaque { len: through("-->", 4) });
  }
  if rest.starts_with("<![CDATA[") {
    return Some(Markup::Opaque { len: through("]]>", 9) });
  }
  if rest.starts_with("<!") || rest.starts_with("<?") {
    return Some(Markup::Opaque { len: through(">", 2) });
  }

  if let Some(after) = rest.strip_prefix("</") {
    if after.starts_with('>') {
      return Some(Markup::Ignored { len: 3 });
    }
    if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
      return Some(Markup::Opaque { len: through(">", 2) });
    }
    let close = after.find('>')?;
    let name_end = after[..close]
      .find(|c: char| c.is_ascii_whitespace() || c == '/')
      .unwrap_or(close);
    return Some(Markup::End {
      name: after[..name_end].to_ascii_lowercase(),
      len: close + 3,
    });
  }

  if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
    return read_start_tag(rest).map(Markup::Start);
  }

  None
}

/// Read a start tag with its attributes. Values may be double-quoted,
/// single-quoted, unquoted or missing; a later duplicate replaces an earlier
/// one. Returns `None` when the tag never ends.
fn read_start_tag(rest: &str) -> Option<StartTag> {
  let name_end = find_from(rest, 1, |c| c.is_ascii_whitespace() || c == '/' || c == '>');
  let name = rest[1..name_end].to_ascii_lowercase();
  let mut attributes: Vec<(String, String)> = Vec::new();
  let mut index = name_end;

  loop {
    index = find_from(rest, index, |c| !c.is_ascii_whitespace());
    let tail = &rest[index..];
    if tail.is_empty() {
      return None;
    }
    if tail.starts_with("/>") || tail.starts_with('>') {
      let self_closing = tail.starts_with('/');
      return Some(StartTag {
        name,
        attributes,
        self_closing,
        len: index + if self_closing { 2 } else { 1 },
      });
    }
    if tail.starts_with('/') {
      index += 1;
      continue;
    }

    let first_len = tail.chars().next().map_or(1, char::len_utf8);
    let attribute_end = find_from(rest, index + first_len, |c| {
      c.is_ascii_whitespace() || matches!(c, '/' | '>' | '=')
    });
    let attribute = rest[index..attribute_end].to_ascii_lowercase();
    index = find_from(rest, attribute_end, |c| !c.is_ascii_whitespace());

    let mut value = String::new();
    if rest[index..].starts_with('=') {
      index = find_from(rest, index + 1, |c| !c.is_ascii_whitespace());
      let tail = &rest[index..];
      match tail.chars().next() {
        Some(quote @ ('"' | '\'')) => {
          let close = tail[1..].find(quote)?;
          value = decode_entities(&tail[1..=close]).into_owned();
          index += close + 2;
        }
        _ => {
          let end = find_from(rest, index, |c| c.is_ascii_whitespace() || c == '>');
          value = decode_entities(&rest[index..end]).into_owned();
          index = end;
        }
      }
    }

    match attributes.iter_mut().find(|(name, _)| *name == attribute) {
      Some(existing) => existing.1 = value,
      None => attributes.push((attribute, value)),
    }
  }
}

/// Input offset of the end tag closing a raw text element opened just
/// before `from`, or the end of input.
fn raw_text_end(input: &str, from: usize, name: &str) -> usize {
  let rest = &input[from..];
  let mut search = 0;

  while let Some(offset) = rest[search..].find("</") {
    let start = search + offset;
    let after = &rest[start + 2..];
    let matches_name = after
      .get(..name.len())
      .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name));
    let terminated = after
      .get(name.len()..)
      .and_then(|tail| tail.chars().next())
      .is_none_or(|c| c.is_ascii_whitespace() || c == '/' || c == '>');
    if matches_name && terminated {
      return from + start;
    }
    search = start + 2;
  }

  input.len()
}

/// Offset of the first char at or after `from` matching `pred`, or the end.
fn find_from(text: &str, from: usize, pred: impl Fn(char) -> bool) -> usize {
  text[from..].find(pred).map_or(text.len(), |offset| from + offset)
}

fn is_heading(name: &str) -> bool {
  matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Whether `name` can be written as an XML name with at most one prefix.
fn is_qualified_name(name: &str) -> bool {
  match name.split_once(':') {
    Some((prefix, local)) => prefix != "xmlns" && is_ncname(prefix) && is_ncname(local),
    None => is_ncname(name),
  }
}

fn is_ncname(name: &str) -> bool {
  let mut chars = name.chars();
  chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
    && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Append `text` escaped for XML character data, or for a double-quoted
/// attribute value when `attribute` is set. Characters XML cannot carry
/// become U+FFFD.
fn push_escaped(out: &mut String, text: &str, attribute: bool) {
  for ch in text.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '\r' => out.push_str("&#13;"),
      '"' if attribute => out.push_str("&quot;"),
      '\t' if attribute => out.push_str("&#9;"),
      '\n' if attribute => out.push_str("&#10;"),
      '\t' | '\n' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}' => out.push(ch),
      _ => out.push('\u{FFFD}'),
    }
  }
}

/// Build the synthetic root start tag, declaring every prefix used in the
/// fragment so `roxmltree` can resolve it.
fn open_root_element(prefixes: &BTreeSet<String>) -> String {
  let mut result = format!("<{ROOT_TAG}");
  for prefix in prefixes {
    result.push_str(" xmlns:");
    result.push_str(prefix);
    result.push_str("=\"");
    result.push_str(SYNTHETIC_NS_BASE);
    result.push_str(prefix);
    result.push('"');
  }
  result.push('>');
  result
}
