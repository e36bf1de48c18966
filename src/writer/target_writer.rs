use crate::config::WriteConfig;
use crate::error::Result;
use crate::extractor::MergedDataset;
use crate::writer::target_document::TargetDocument;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub rows_written: usize,
    pub rows_cleared: u32,
    pub created: bool,
}

pub struct TargetWriter {
    config: WriteConfig,
}

impl TargetWriter {
    pub fn new(config: &WriteConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Rewrites columns A and B of the target's first sheet with `dataset`.
    pub fn write<P: AsRef<Path>>(&self, target: P, dataset: &MergedDataset) -> Result<WriteSummary> {
        let mut document = TargetDocument::open_or_create(target.as_ref(), &self.config)?;

        let rows_cleared = document.overwrite_columns(dataset.rows());
        document.save(&self.config)?;

        Ok(WriteSummary {
            path: document.path().to_path_buf(),
            rows_written: dataset.len(),
            rows_cleared,
            created: !document.existed(),
        })
    }
}
