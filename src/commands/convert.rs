//! The default command: convert one HTML document to Markdown.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process;

use anyhow::{Context, bail};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::color::ColorScheme;
use crate::markdown::{self, ConvertOptions};

/// Handle conversion of the CLI input.
pub(crate) fn handle_convert_command(cli: &Cli, colors: &ColorScheme) {
  let input = cli.input_path();
  let output = cli.output.output.as_deref();

  let result = convert_source(input, &cli.conversion.to_convert_options())
    .and_then(|markdown| write_markdown(&markdown, output, cli.output.overwrite));

  if let Err(e) = result {
    eprintln!("{} {}", colors.error("✗"), colors.error("Conversion failed"));
    eprintln!("  {}: {:#}", colors.emphasis("Error"), e);
    process::exit(1);
  }

  if let Some(path) = output
    && !cli.behavior.quiet
  {
    eprintln!(
      "{} {} {}",
      colors.success("✓"),
      colors.success("Wrote"),
      colors.path(path.display())
    );
  }
}

/// Read HTML from `input` (standard input when `None`) and convert it.
///
/// The returned Markdown always ends with exactly one newline.
pub fn convert_source(input: Option<&Path>, options: &ConvertOptions) -> anyhow::Result<String> {
  let html = match input {
    Some(path) => {
      info!("Converting {}", path.display());
      fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
    }
    None => {
      info!("Converting standard input");
      let mut buffer = String::new();
      io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read standard input")?;
      buffer
    }
  };

  let mut markdown = markdown::convert_with_options(&html, options)?;
  markdown.push('\n');
  debug!("Converted {} bytes of HTML into {} bytes of Markdown", html.len(), markdown.len());
  Ok(markdown)
}

/// Write Markdown to `output`, or standard output when `None`.
///
/// An existing file is only replaced when `overwrite` is set.
pub fn write_markdown(markdown: &str, output: Option<&Path>, overwrite: bool) -> anyhow::Result<()> {
  let Some(path) = output else {
    print!("{markdown}");
    return Ok(());
  };

  if path.exists() && !overwrite {
    bail!("{} already exists (use --overwrite to replace it)", path.display());
  }

  if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
  }

  fs::write(path, markdown).with_context(|| format!("Failed to write {}", path.display()))?;
  info!("Wrote {}", path.display());
  Ok(())
}
