pub mod cell;
pub mod column_extractor;
pub mod merger;

pub use cell::{CellValue, RowPair};
pub use column_extractor::{ColumnExtractor, ExtractionStatus, FileOutcome};
pub use merger::{FileContribution, MergedDataset};
