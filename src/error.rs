use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetMergeError {
    #[error("Source folder is missing or not a directory: {path}")]
    InvalidSourceFolder { path: String },

    #[error("No spreadsheet files found in {path}")]
    NoEligibleFiles {
        path: String,
        searched_extensions: Vec<String>,
    },

    #[error("Failed to read {path}: {message}")]
    FileRead { path: String, message: String },

    #[error("No data to merge")]
    NoDataExtracted { files_scanned: usize, files_skipped: usize },

    #[error("Failed to write target {path}: {message}")]
    TargetWrite { path: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetMergeError {
    pub fn target_write<P: AsRef<std::path::Path>, M: ToString>(path: P, message: M) -> Self {
        SheetMergeError::TargetWrite {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Process exit code used by the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            SheetMergeError::InvalidSourceFolder { .. } => 2,
            SheetMergeError::NoEligibleFiles { .. } => 3,
            SheetMergeError::NoDataExtracted { .. } => 4,
            SheetMergeError::TargetWrite { .. } => 5,
            _ => 1,
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for SheetMergeError {
    fn user_message(&self) -> String {
        match self {
            SheetMergeError::InvalidSourceFolder { path } => {
                format!("Please choose a source folder ({} is not a directory)", path)
            }
            SheetMergeError::NoEligibleFiles {
                path,
                searched_extensions,
            } => {
                format!(
                    "No spreadsheet files ({}) to process in {}",
                    searched_extensions.join(", "),
                    path
                )
            }
            SheetMergeError::FileRead { path, message } => {
                format!("Could not read {}: {}", path, message)
            }
            SheetMergeError::NoDataExtracted {
                files_scanned,
                files_skipped,
            } => {
                format!(
                    "No data to merge ({} files scanned, {} skipped)",
                    files_scanned, files_skipped
                )
            }
            SheetMergeError::TargetWrite { path, message } => {
                format!("Could not write {}: {}", path, message)
            }
            SheetMergeError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            SheetMergeError::InvalidSourceFolder { .. } => Some(
                "Pass an existing directory as the first argument (e.g., sheetmerge ./reports)".to_string()
            ),
            SheetMergeError::NoEligibleFiles { .. } => Some(
                "Check the folder contents or widen the accepted formats with --extensions (e.g., --extensions xlsx,xls,ods)".to_string()
            ),
            SheetMergeError::NoDataExtracted { files_skipped, .. } if *files_skipped > 0 => Some(
                "Some files could not be read. Run again with -v to see why they were skipped.".to_string()
            ),
            SheetMergeError::NoDataExtracted { .. } => Some(
                "Every file only had a header row or blank rows in columns A and B.".to_string()
            ),
            SheetMergeError::TargetWrite { .. } => Some(
                "Make sure the target is an .xlsx file that is not open in another program and that you can write to its folder.".to_string()
            ),
            SheetMergeError::Config { .. } => Some(
                "Check your configuration file syntax or regenerate one with --generate-config.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for SheetMergeError {
    fn from(error: toml::de::Error) -> Self {
        SheetMergeError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetMergeError>;
