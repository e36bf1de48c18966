use crate::error::{Result, SheetMergeError};
use crate::extractor::cell::RowPair;
use crate::extractor::column_extractor::{ExtractionStatus, FileOutcome};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a single source file added to the merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContribution {
    pub path: PathBuf,
    pub filename: String,
    pub rows: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedDataset {
    rows: Vec<RowPair>,
    contributions: Vec<FileContribution>,
}

impl MergedDataset {
    /// Concatenates outcomes in the order given; fails when nothing was extracted.
    pub fn merge<I>(outcomes: I) -> Result<Self>
    where
        I: IntoIterator<Item = FileOutcome>,
    {
        let dataset = Self::concat(outcomes);

        if dataset.rows.is_empty() {
            return Err(SheetMergeError::NoDataExtracted {
                files_scanned: dataset.contributions.len(),
                files_skipped: dataset.skipped_count(),
            });
        }

        Ok(dataset)
    }

    pub fn concat<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = FileOutcome>,
    {
        let mut dataset = Self::default();

        for outcome in outcomes {
            let FileOutcome { source, status } = outcome;
            let (rows, skipped) = match status {
                ExtractionStatus::Extracted(rows) => (rows, None),
                ExtractionStatus::Skipped { reason } => (Vec::new(), Some(reason)),
            };

            dataset.contributions.push(FileContribution {
                path: source.path,
                filename: source.filename,
                rows: rows.len(),
                skipped,
            });
            dataset.rows.extend(rows);
        }

        dataset
    }

    pub fn from_rows(rows: Vec<RowPair>) -> Self {
        Self {
            rows,
            contributions: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[RowPair] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contributions(&self) -> &[FileContribution] {
        &self.contributions
    }

    pub fn skipped_count(&self) -> usize {
        self.contributions
            .iter()
            .filter(|c| c.skipped.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::cell::CellValue;
    use crate::extractor::column_extractor::ColumnExtractor;
    use crate::scanner::SourceFile;
    use crate::test_support::{write_workbook, Fixture};
    use tempfile::TempDir;

    fn pair(a: &str, b: f64) -> RowPair {
        RowPair::new(CellValue::text(a), CellValue::Float(b))
    }

    fn extracted(name: &str, rows: Vec<RowPair>) -> FileOutcome {
        FileOutcome {
            source: SourceFile::new(PathBuf::from(format!("/src/{}", name)), 0),
            status: ExtractionStatus::Extracted(rows),
        }
    }

    fn skipped(name: &str, reason: &str) -> FileOutcome {
        FileOutcome {
            source: SourceFile::new(PathBuf::from(format!("/src/{}", name)), 0),
            status: ExtractionStatus::Skipped {
                reason: reason.to_string(),
            },
        }
    }

    #[test]
    fn test_merge_preserves_file_then_row_order() {
        let dataset = MergedDataset::merge(vec![
            extracted("a.xlsx", vec![pair("a1", 1.0), pair("a2", 2.0)]),
            extracted("b.xlsx", vec![pair("b1", 3.0)]),
        ])
        .unwrap();

        assert_eq!(
            dataset.rows(),
            &[pair("a1", 1.0), pair("a2", 2.0), pair("b1", 3.0)]
        );
        assert_eq!(dataset.len(), 3);
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let dataset = MergedDataset::merge(vec![
            extracted("a.xlsx", vec![pair("x", 1.0)]),
            extracted("b.xlsx", vec![pair("x", 1.0)]),
        ])
        .unwrap();

        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_skipped_files_are_recorded() {
        let dataset = MergedDataset::merge(vec![
            skipped("bad.xlsx", "not a workbook"),
            extracted("good.xlsx", vec![pair("g", 1.0)]),
            extracted("empty.xlsx", Vec::new()),
        ])
        .unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped_count(), 1);

        let contributions = dataset.contributions();
        assert_eq!(contributions.len(), 3);
        assert_eq!(contributions[0].skipped.as_deref(), Some("not a workbook"));
        assert_eq!(contributions[1].rows, 1);
        assert_eq!(contributions[2].rows, 0);
        assert!(contributions[2].skipped.is_none());
    }

    #[test]
    fn test_nothing_to_merge() {
        let result = MergedDataset::merge(vec![
            skipped("bad.xlsx", "broken"),
            extracted("empty.xlsx", Vec::new()),
        ]);

        match result {
            Err(SheetMergeError::NoDataExtracted {
                files_scanned,
                files_skipped,
            }) => {
                assert_eq!(files_scanned, 2);
                assert_eq!(files_skipped, 1);
            }
            other => panic!("expected NoDataExtracted, got {:?}", other),
        }

        assert!(MergedDataset::merge(Vec::<FileOutcome>::new()).is_err());
    }

    #[test]
    fn test_merge_equals_concatenated_extraction() {
        let temp_dir = TempDir::new().unwrap();
        let jan = temp_dir.path().join("jan.xlsx");
        let feb = temp_dir.path().join("feb.xlsx");

        write_workbook(
            &jan,
            &[
                &[Fixture::Text("name"), Fixture::Text("value")],
                &[Fixture::Text("alpha"), Fixture::Number(1.0)],
                &[Fixture::Blank, Fixture::Blank, Fixture::Text("stray")],
                &[Fixture::Text("gamma"), Fixture::Number(3.0)],
            ],
        );
        write_workbook(
            &feb,
            &[
                &[Fixture::Text("name"), Fixture::Text("value")],
                &[Fixture::Text("delta"), Fixture::Number(4.0)],
            ],
        );

        let extractor = ColumnExtractor::new();
        let mut expected = extractor.extract_rows(&jan).unwrap();
        expected.extend(extractor.extract_rows(&feb).unwrap());

        let dataset = MergedDataset::merge(vec![
            extractor.extract(&SourceFile::new(jan, 0)),
            extractor.extract(&SourceFile::new(feb, 0)),
        ])
        .unwrap();

        assert_eq!(dataset.rows(), expected.as_slice());
        assert_eq!(dataset.len(), 3);
    }
}
