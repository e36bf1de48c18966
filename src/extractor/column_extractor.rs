use crate::error::{Result, SheetMergeError, UserFriendlyError};
use crate::extractor::cell::{CellValue, RowPair};
use crate::scanner::SourceFile;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

/// Sheet row (0-based) that is always treated as the header.
const HEADER_ROW: u32 = 0;
const COLUMN_A: u32 = 0;
const COLUMN_B: u32 = 1;

/// Result of extracting a single file.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionStatus {
    Extracted(Vec<RowPair>),
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub source: SourceFile,
    pub status: ExtractionStatus,
}

impl FileOutcome {
    pub fn row_count(&self) -> usize {
        match &self.status {
            ExtractionStatus::Extracted(rows) => rows.len(),
            ExtractionStatus::Skipped { .. } => 0,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, ExtractionStatus::Skipped { .. })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ColumnExtractor;

impl ColumnExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts one file, turning read failures into a skip.
    pub fn extract(&self, source: &SourceFile) -> FileOutcome {
        let status = match self.extract_rows(&source.path) {
            Ok(rows) => ExtractionStatus::Extracted(rows),
            Err(e) => ExtractionStatus::Skipped {
                reason: e.user_message(),
            },
        };

        FileOutcome {
            source: source.clone(),
            status,
        }
    }

    /// Reads columns A and B of the first worksheet, minus header and blank rows.
    pub fn extract_rows<P: AsRef<Path>>(&self, path: P) -> Result<Vec<RowPair>> {
        let path = path.as_ref();
        let read_error = |message: String| SheetMergeError::FileRead {
            path: path.display().to_string(),
            message,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| read_error(e.to_string()))?;

        let range = match workbook.worksheet_range_at(0) {
            Some(Ok(range)) => range,
            Some(Err(e)) => return Err(read_error(e.to_string())),
            None => return Err(read_error("workbook has no worksheet".to_string())),
        };

        Ok(rows_from_range(&range))
    }
}

/// Data rows of `range`, addressed by absolute sheet position.
pub fn rows_from_range(range: &Range<Data>) -> Vec<RowPair> {
    let Some((end_row, _)) = range.end() else {
        return Vec::new();
    };

    if end_row <= HEADER_ROW {
        return Vec::new();
    }

    (HEADER_ROW + 1..=end_row)
        .map(|row| RowPair::new(cell_at(range, row, COLUMN_A), cell_at(range, row, COLUMN_B)))
        .filter(|pair| !pair.is_blank())
        .collect()
}

fn cell_at(range: &Range<Data>, row: u32, col: u32) -> CellValue {
    range
        .get_value((row, col))
        .map(CellValue::from)
        .unwrap_or_default()
}
