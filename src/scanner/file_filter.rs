use crate::config::ScanConfig;
use regex::Regex;
use std::path::Path;

pub struct FileFilter {
    sheet_extensions: Vec<String>,
    lock_file_prefix: String,
    exclude_patterns: Vec<Regex>,
}

impl FileFilter {
    pub fn new(config: &ScanConfig) -> Self {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self {
            sheet_extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            lock_file_prefix: config.lock_file_prefix.clone(),
            exclude_patterns,
        }
    }

    /// Name-only check; the caller decides whether the entry is a regular file.
    pub fn is_spreadsheet_file(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };

        if self.is_lock_file(filename) || self.matches_any_pattern(filename) {
            return false;
        }

        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.sheet_extensions.contains(&ext.to_lowercase()))
    }

    pub fn is_lock_file(&self, filename: &str) -> bool {
        filename.starts_with(&self.lock_file_prefix)
    }

    pub fn matches_any_pattern(&self, text: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(text))
    }

    pub fn get_extensions(&self) -> &Vec<String> {
        &self.sheet_extensions
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(&ScanConfig::default())
    }
}
