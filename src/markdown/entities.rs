//! HTML character reference decoding.
//!
//! Named and numeric references are resolved with `html-escape`, which knows
//! the full HTML5 entity set. HTML also accepts the legacy Latin-1 names
//! without a trailing semicolon (`&amp b`, `&copy 2024`); those are matched
//! by longest prefix, the way browsers do.

use std::borrow::Cow;

/// Longest legacy entity name (`frac12`, `curren`, ...).
const MAX_LEGACY_NAME_LEN: usize = 6;

/// Decode every character reference in `text`.
///
/// References that do not resolve are left as written.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
  if !text.contains('&') {
    return Cow::Borrowed(text);
  }

  let mut decoded = String::with_capacity(text.len());
  let mut rest = text;
  while let Some(amp) = rest.find('&') {
    decoded.push_str(&rest[..amp]);
    rest = &rest[amp..];

    let (consumed, value) = decode_reference(rest);
    match value {
      Some(value) => decoded.push_str(&value),
      None => decoded.push_str(&rest[..consumed]),
    }
    rest = &rest[consumed..];
  }
  decoded.push_str(rest);

  Cow::Owned(decoded)
}

/// Resolve the reference at the start of `rest`, which begins with `&`.
///
/// Returns the number of bytes consumed and the decoded text, if any.
fn decode_reference(rest: &str) -> (usize, Option<String>) {
  let body = &rest[1..];

  if let Some(numeric) = body.strip_prefix('#') {
    let hex = numeric.starts_with(['x', 'X']);
    let digits = &numeric[usize::from(hex)..];
    let digit_count = digits
      .find(|c: char| if hex { !c.is_ascii_hexdigit() } else { !c.is_ascii_digit() })
      .unwrap_or(digits.len());
    if digit_count == 0 {
      return (1, None);
    }

    let end = 2 + usize::from(hex) + digit_count;
    let terminated = rest[end..].starts_with(';');
    let marker = if hex { "#x" } else { "#" };
    let value = lookup(&format!("&{marker}{};", &digits[..digit_count]));
    return match value {
      Some(value) => (end + usize::from(terminated), Some(value)),
      None => (1, None),
    };
  }

  let name_len = body.find(|c: char| !c.is_ascii_alphanumeric()).unwrap_or(body.len());
  if name_len == 0 {
    return (1, None);
  }

  if body[name_len..].starts_with(';')
    && let Some(value) = lookup(&rest[..name_len + 2])
  {
    return (name_len + 2, Some(value));
  }

  let name = &body[..name_len];
  for len in (1..=name_len.min(MAX_LEGACY_NAME_LEN)).rev() {
    if let Some(value) = lookup(&format!("&{};", &name[..len])).filter(|value| is_legacy_value(value)) {
      return (1 + len, Some(value));
    }
  }

  (1, None)
}

/// Decode a single complete reference such as `&eacute;`.
fn lookup(reference: &str) -> Option<String> {
  let decoded = html_escape::decode_html_entities(reference);
  (decoded != reference).then(|| decoded.into_owned())
}

/// Legacy references decode to one Latin-1 character or to one of the four
/// markup characters.
fn is_legacy_value(value: &str) -> bool {
  let mut chars = value.chars();
  match (chars.next(), chars.next()) {
    (Some(ch), None) => matches!(ch, '&' | '<' | '>' | '"') || ('\u{00A0}'..='\u{00FF}').contains(&ch),
    _ => false,
  }
}
