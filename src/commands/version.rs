//! Version/metadata reporting.
//!
//! Implements `html2markdown version`, printing either a coloured summary or
//! a JSON document describing the build embedded by `build.rs`.

use chrono::{DateTime, Utc};

use crate::color::ColorScheme;

/// Build metadata captured at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BuildInfo {
  version: &'static str,
  git_hash: &'static str,
  built: String,
  target: &'static str,
  rustc: &'static str,
}

impl BuildInfo {
  fn current() -> Self {
    Self {
      version: env!("CARGO_PKG_VERSION"),
      git_hash: env!("GIT_HASH"),
      built: format_timestamp(env!("BUILD_TIMESTAMP")),
      target: env!("TARGET"),
      rustc: env!("RUSTC_VERSION"),
    }
  }

  fn to_json(&self) -> String {
    let fields = [
      ("version", self.version),
      ("git_commit", self.git_hash),
      ("build_timestamp", self.built.as_str()),
      ("target", self.target),
      ("rust_version", self.rustc),
    ];

    let body: Vec<String> = fields
      .iter()
      .map(|(key, value)| format!("  \"{key}\": \"{}\"", value.escape_default()))
      .collect();
    format!("{{\n{}\n}}", body.join(",\n"))
  }
}

/// Render version and build metadata in JSON or human-readable form.
///
/// # Arguments
/// * `json` - When `true`, emit a JSON document instead of colored text.
/// * `short` - When `true`, print only the semantic version string.
/// * `colors` - Shared color palette for styled terminal output.
pub(crate) fn handle_version_command(json: bool, short: bool, colors: &ColorScheme) {
  let info = BuildInfo::current();

  if short {
    println!("{}", info.version);
  } else if json {
    println!("{}", info.to_json());
  } else {
    println!("{} {}", colors.emphasis("html2markdown"), colors.number(info.version));
    println!("{}: {}", colors.emphasis("Git commit"), colors.code(info.git_hash));
    println!("{}: {}", colors.emphasis("Built"), colors.dimmed(&info.built));
    println!("{}: {}", colors.emphasis("Target"), info.target);
    println!("{}: {}", colors.emphasis("Rust version"), info.rustc);
  }
}

/// Convert the embedded build timestamp into a human-readable UTC string.
///
/// Falls back to the raw input when it is not a Unix timestamp.
fn format_timestamp(timestamp: &str) -> String {
  timestamp
    .parse::<i64>()
    .ok()
    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_timestamp() {
    assert_eq!(format_timestamp("0"), "1970-01-01 00:00:00 UTC");
    assert_eq!(format_timestamp("1700000000"), "2023-11-14 22:13:20 UTC");
    assert_eq!(format_timestamp("soon"), "soon");
  }

  #[test]
  fn test_json_document() {
    let info = BuildInfo {
      version: "1.2.3",
      git_hash: "abc1234",
      built: "1970-01-01 00:00:00 UTC".to_string(),
      target: "x86_64-unknown-linux-gnu",
      rustc: "rustc 1.85.0 (4d91de4e4 2025-02-17)",
    };

    insta::assert_snapshot!(info.to_json(), @r#"
    {
      "version": "1.2.3",
      "git_commit": "abc1234",
      "build_timestamp": "1970-01-01 00:00:00 UTC",
      "target": "x86_64-unknown-linux-gnu",
      "rust_version": "rustc 1.85.0 (4d91de4e4 2025-02-17)"
    }
    "#);
  }

  #[test]
  fn test_current_uses_package_version() {
    assert_eq!(BuildInfo::current().version, env!("CARGO_PKG_VERSION"));
  }
}
