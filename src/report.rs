use crate::extractor::FileContribution;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where a merge run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    FolderSelected,
    FilesEnumerated,
    DataExtracted,
    TargetResolved,
    Written,
    Aborted,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Written | RunState::Aborted | RunState::Failed)
    }

    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;

        match (self, next) {
            (current, Failed) => !current.is_terminal(),
            (Idle, FolderSelected)
            | (FolderSelected, FilesEnumerated)
            | (FilesEnumerated, DataExtracted)
            | (DataExtracted, TargetResolved)
            | (DataExtracted, Aborted)
            | (TargetResolved, Written)
            | (TargetResolved, Aborted) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::FolderSelected => "folder selected",
            RunState::FilesEnumerated => "files enumerated",
            RunState::DataExtracted => "data extracted",
            RunState::TargetResolved => "target resolved",
            RunState::Written => "written",
            RunState::Aborted => "aborted",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Ordered record of the states a run went through, starting at `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTrail {
    states: Vec<RunState>,
}

impl StateTrail {
    pub fn new() -> Self {
        Self {
            states: vec![RunState::Idle],
        }
    }

    pub fn current(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Idle)
    }

    /// Moves to `next` and returns the state that was left.
    pub fn advance(&mut self, next: RunState) -> RunState {
        let previous = self.current();
        debug_assert!(
            previous.can_advance_to(next),
            "illegal transition {} -> {}",
            previous,
            next
        );
        self.states.push(next);
        previous
    }

    pub fn states(&self) -> &[RunState] {
        &self.states
    }
}

impl Default for StateTrail {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub source_dir: PathBuf,
    pub target: Option<PathBuf>,
}

impl MergeRequest {
    pub fn new<P: Into<PathBuf>>(source_dir: P) -> Self {
        Self {
            source_dir: source_dir.into(),
            target: None,
        }
    }

    pub fn with_target<P: Into<PathBuf>>(mut self, target: Option<P>) -> Self {
        self.target = target.map(Into::into);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Written(MergeReport),
    /// The user declined a confirmation or gave no target. Nothing was written.
    Aborted { states: Vec<RunState> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    pub source_dir: PathBuf,
    pub target: PathBuf,
    pub created: bool,
    pub rows_written: usize,
    pub rows_cleared: u32,
    pub files: Vec<FileContribution>,
    pub states: Vec<RunState>,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl MergeReport {
    pub fn files_skipped(&self) -> usize {
        self.files.iter().filter(|f| f.skipped.is_some()).count()
    }
}

/// What a run would do, computed without touching the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergePlan {
    pub source_dir: PathBuf,
    pub target: PathBuf,
    pub target_exists: bool,
    pub rows: usize,
    pub total_bytes: u64,
    pub files: Vec<FileContribution>,
}
