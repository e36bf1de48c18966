use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::report::MergeRequest;
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sheetmerge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Merge columns A and B of every spreadsheet in a folder into one workbook")]
#[command(
    long_about = "sheetmerge reads the first sheet of every spreadsheet in a folder, drops the \
                  header row and blank rows, and writes columns A and B of all files, one after \
                  the other, into the first sheet of a target .xlsx workbook."
)]
#[command(after_help = "EXAMPLES:\n  \
    sheetmerge ./reports --target summary.xlsx\n  \
    sheetmerge ./reports --yes\n  \
    sheetmerge ./reports --extensions xlsx,xls,ods --dry-run\n  \
    sheetmerge ./reports --config sheetmerge.toml --output-format json")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Folder containing the spreadsheets to merge
    #[arg(required_unless_present = "generate_config")]
    pub source_dir: Option<PathBuf>,

    /// Target workbook (.xlsx); prompted for when omitted
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Spreadsheet extensions to read (comma-separated)
    #[arg(long, help = "File extensions to merge (e.g., xlsx,xls,ods)")]
    pub extensions: Option<String>,

    /// File name prefix of editor lock files to ignore
    #[arg(long)]
    pub lock_prefix: Option<String>,

    /// File name used for a new target inside the source folder
    #[arg(long)]
    pub default_name: Option<String>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Dry run (show what would be merged without writing)
    #[arg(long, help = "Show what would be merged without writing the target")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl From<OutputFormat> for OutputMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_extensions(self.extensions.clone())
            .with_lock_file_prefix(self.lock_prefix.clone())
            .with_default_target_name(self.default_name.clone())
    }

    pub fn merge_request(&self) -> MergeRequest {
        MergeRequest::new(self.source_dir.clone().unwrap_or_default())
            .with_target(self.target.clone())
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_format.into()
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
