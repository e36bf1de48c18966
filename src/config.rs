use crate::error::{Result, SheetMergeError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Excel refuses worksheet names longer than this.
const MAX_SHEET_NAME_LEN: usize = 31;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub scan: ScanConfig,
    pub write: WriteConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    pub extensions: Vec<String>,
    pub lock_file_prefix: String,
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WriteConfig {
    pub default_target_name: String,
    pub new_sheet_name: String,
    pub date_format: String,
    pub datetime_format: String,
    pub duration_format: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["xlsx".to_string(), "xls".to_string()],
            lock_file_prefix: "~$".to_string(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            default_target_name: "merged.xlsx".to_string(),
            new_sheet_name: "Sheet1".to_string(),
            date_format: "yyyy-mm-dd".to_string(),
            datetime_format: "yyyy-mm-dd hh:mm:ss".to_string(),
            duration_format: "[h]:mm:ss".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SheetMergeError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SheetMergeError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| SheetMergeError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["sheetmerge.toml", ".sheetmerge.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref extensions) = cli_args.extensions {
            self.scan.extensions = normalize_extensions(extensions);
        }

        if let Some(ref prefix) = cli_args.lock_file_prefix {
            self.scan.lock_file_prefix = prefix.clone();
        }

        if let Some(ref name) = cli_args.default_target_name {
            self.write.default_target_name = name.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan.extensions.is_empty() {
            return Err(SheetMergeError::Config {
                message: "At least one spreadsheet extension must be specified".to_string(),
            });
        }

        if self.scan.lock_file_prefix.is_empty() {
            return Err(SheetMergeError::Config {
                message: "Lock file prefix must not be empty".to_string(),
            });
        }

        for pattern in &self.scan.exclude_patterns {
            Regex::new(pattern).map_err(|e| SheetMergeError::Config {
                message: format!("Invalid exclude pattern '{}': {}", pattern, e),
            })?;
        }

        if !has_xlsx_extension(Path::new(&self.write.default_target_name)) {
            return Err(SheetMergeError::Config {
                message: format!(
                    "Default target name must end with .xlsx: {}",
                    self.write.default_target_name
                ),
            });
        }

        let sheet_name_len = self.write.new_sheet_name.chars().count();
        if sheet_name_len == 0 || sheet_name_len > MAX_SHEET_NAME_LEN {
            return Err(SheetMergeError::Config {
                message: format!(
                    "Sheet name must be between 1 and {} characters",
                    MAX_SHEET_NAME_LEN
                ),
            });
        }

        Ok(())
    }

    /// Where a new target goes when the user did not name one.
    pub fn default_target_in(&self, folder: &Path) -> PathBuf {
        folder.join(&self.write.default_target_name)
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

pub fn normalize_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn has_xlsx_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"))
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub extensions: Option<String>,
    pub lock_file_prefix: Option<String>,
    pub default_target_name: Option<String>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions(mut self, extensions: Option<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_lock_file_prefix(mut self, prefix: Option<String>) -> Self {
        self.lock_file_prefix = prefix;
        self
    }

    pub fn with_default_target_name(mut self, name: Option<String>) -> Self {
        self.default_target_name = name;
        self
    }
}
