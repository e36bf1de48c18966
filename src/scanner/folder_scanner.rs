use crate::config::ScanConfig;
use crate::error::{Result, SheetMergeError};
use crate::scanner::file_filter::FileFilter;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A spreadsheet discovered in the source folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub filename: String,
    pub extension: String,
    pub size: u64,
}

impl SourceFile {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        Self {
            path,
            filename,
            extension,
            size,
        }
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct FolderScanner {
    filter: FileFilter,
}

impl FolderScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            filter: FileFilter::new(config),
        }
    }

    /// Checks that `folder` can be scanned and returns its absolute form.
    pub fn validate_folder<P: AsRef<Path>>(folder: P) -> Result<PathBuf> {
        let folder = folder.as_ref();

        if folder.as_os_str().is_empty() || !folder.is_dir() {
            return Err(SheetMergeError::InvalidSourceFolder {
                path: folder.display().to_string(),
            });
        }

        folder
            .canonicalize()
            .map_err(|_| SheetMergeError::InvalidSourceFolder {
                path: folder.display().to_string(),
            })
    }

    /// Lists eligible spreadsheets directly inside `folder`, sorted by path.
    pub fn scan_folder<P: AsRef<Path>>(&self, folder: P) -> Result<Vec<SourceFile>> {
        let root = Self::validate_folder(folder)?;

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true);

        let mut files: Vec<SourceFile> = walker
            .into_iter()
            // Unreadable entries are not spreadsheets we could merge anyway.
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.filter.is_spreadsheet_file(entry.path()))
            .map(|entry| {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                SourceFile::new(entry.into_path(), size)
            })
            .collect();

        if files.is_empty() {
            return Err(SheetMergeError::NoEligibleFiles {
                path: root.display().to_string(),
                searched_extensions: self.filter.get_extensions().clone(),
            });
        }

        files.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
        files.dedup_by(|a, b| a.path == b.path);

        Ok(files)
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }
}
