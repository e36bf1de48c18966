pub mod target_document;
pub mod target_writer;

pub use target_document::{SheetContents, StoredCell, TargetDocument};
pub use target_writer::{TargetWriter, WriteSummary};

use crate::error::{Result, SheetMergeError};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes `bytes` next to `target` and renames over it, so readers never see a
/// half-written workbook.
///
/// An existing target keeps its permissions, and a symlinked target keeps the
/// link: the file it points at is the one replaced.
pub(crate) fn persist_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let resolved = fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf());
    let existing = fs::metadata(&resolved).ok();

    let dir = match resolved.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| SheetMergeError::target_write(target, e))?;

    temp_file
        .write_all(bytes)
        .and_then(|_| temp_file.as_file().sync_all())
        .map_err(|e| SheetMergeError::target_write(target, e))?;

    if let Some(metadata) = existing {
        fs::set_permissions(temp_file.path(), metadata.permissions())
            .map_err(|e| SheetMergeError::target_write(target, e))?;
    }

    temp_file
        .persist(&resolved)
        .map_err(|e| SheetMergeError::target_write(target, e.error))?;

    Ok(())
}
