//! Command-line interface definitions for html2markdown.
//!
//! This module defines the CLI structure using clap derives and dispatches to
//! the command handlers.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::color::ColorScheme;
use crate::commands::completions::handle_completions_command;
use crate::commands::convert::handle_convert_command;
use crate::commands::version::handle_version_command;
use crate::markdown::{ConvertOptions, DEFAULT_MAX_DEPTH};

/// html2markdown - Convert HTML to Markdown, keeping what it can't convert
#[derive(Debug, Parser)]
#[command(
  name = "html2markdown",
  version,
  about = "Convert HTML to Markdown, keeping unsupported markup verbatim",
  long_about = "Converts an HTML fragment to Markdown.\n\
                Tags and attributes with a Markdown equivalent are rewritten; everything else is\n\
                carried over unchanged so no content is lost.",
  styles = get_clap_styles()
)]
pub struct Cli {
  /// HTML file to convert (`-` or omitted reads standard input)
  #[arg(value_name = "INPUT")]
  pub input: Option<String>,

  /// Subcommand to execute
  #[command(subcommand)]
  pub command: Option<Command>,

  /// Output options
  #[command(flatten)]
  pub output: OutputOptions,

  /// Conversion options
  #[command(flatten)]
  pub conversion: ConversionOptions,

  /// Behavior options
  #[command(flatten)]
  pub behavior: BehaviorOptions,
}

/// Subcommands for introspection
#[derive(Debug, Subcommand)]
pub enum Command {
  /// Display version and build information
  Version {
    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Show only version number
    #[arg(long)]
    short: bool,
  },

  /// Generate shell completion scripts
  Completions {
    /// Target shell for completions
    #[arg(value_enum)]
    shell: Shell,
  },
}

/// Shells supported by the completions subcommand
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
  Bash,
  Zsh,
  Fish,
  Powershell,
  Elvish,
}

/// Output options
#[derive(Debug, Parser)]
pub struct OutputOptions {
  /// Write Markdown to this file instead of standard output
  #[arg(short, long, value_name = "FILE")]
  pub output: Option<PathBuf>,

  /// Overwrite the output file if it already exists
  #[arg(long, requires = "output")]
  pub overwrite: bool,
}

/// Conversion options
#[derive(Debug, Parser)]
pub struct ConversionOptions {
  /// Refuse input nested deeper than N elements (0 disables the check)
  #[arg(long, env = "HTML2MD_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH, value_name = "N")]
  pub max_depth: usize,
}

impl ConversionOptions {
  /// Library options for these flags.
  pub fn to_convert_options(&self) -> ConvertOptions {
    ConvertOptions {
      max_depth: (self.max_depth > 0).then_some(self.max_depth),
    }
  }
}

/// Behavior options
#[derive(Debug, Parser)]
pub struct BehaviorOptions {
  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Colorize output
  #[arg(long, value_enum, default_value = "auto", value_name = "WHEN")]
  pub color: ColorOption,
}

/// Color output options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorOption {
  Auto,
  Always,
  Never,
}

impl Cli {
  /// Input file path, or `None` for standard input.
  pub fn input_path(&self) -> Option<&Path> {
    self.input.as_deref().filter(|input| *input != "-").map(Path::new)
  }

  /// Validate CLI arguments
  ///
  /// Returns an error if the CLI configuration is invalid.
  pub fn validate(&self) -> Result<(), String> {
    if let (Some(input), Some(output)) = (self.input_path(), self.output.output.as_deref())
      && input == output
    {
      return Err("--output must not be the input file".to_string());
    }

    Ok(())
  }
}

/// Parse CLI arguments, initialize logging, and dispatch to the chosen
/// command.
pub fn run() {
  let cli = Cli::parse();

  init_tracing(&cli.behavior);

  let colors = ColorScheme::new(cli.behavior.color);

  if let Err(e) = cli.validate() {
    eprintln!("{} {}", colors.error("Error:"), e);
    process::exit(4); // Invalid arguments exit code
  }

  if let Some(ref command) = cli.command {
    match command {
      Command::Version { json, short } => {
        handle_version_command(*json, *short, &colors);
      }
      Command::Completions { shell } => {
        handle_completions_command(*shell);
      }
    }
    return;
  }

  handle_convert_command(&cli, &colors);
}

fn init_tracing(behavior: &BehaviorOptions) {
  let level = if behavior.quiet {
    LevelFilter::ERROR
  } else {
    match behavior.verbose {
      0 => LevelFilter::WARN,
      1 => LevelFilter::INFO,
      2 => LevelFilter::DEBUG,
      _ => LevelFilter::TRACE,
    }
  };

  let env_filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  let _ = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}

/// Get custom styles for clap help output
fn get_clap_styles() -> clap::builder::Styles {
  use clap::builder::styling::{AnsiColor, Effects};

  clap::builder::Styles::styled()
    .header(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
    .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
    .literal(AnsiColor::BrightGreen.on_default())
    .placeholder(AnsiColor::BrightCyan.on_default())
    .error(AnsiColor::BrightRed.on_default() | Effects::BOLD)
    .valid(AnsiColor::BrightGreen.on_default())
    .invalid(AnsiColor::BrightRed.on_default())
}
