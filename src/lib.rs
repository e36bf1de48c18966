pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod report;
pub mod scanner;
pub mod ui;
pub mod writer;

#[cfg(test)]
mod test_support;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, ScanConfig, WriteConfig};
pub use error::{Result, SheetMergeError, UserFriendlyError};
pub use report::{MergeOutcome, MergePlan, MergeReport, MergeRequest, RunState, StateTrail};

// Core functionality re-exports
pub use extractor::{
    CellValue, ColumnExtractor, ExtractionStatus, FileContribution, FileOutcome, MergedDataset, RowPair,
};
pub use scanner::{FileFilter, FolderScanner, SourceFile};
pub use ui::{AssumeYes, Interaction, OutputFormatter, OutputMode, ProgressManager, TerminalInteraction};
pub use writer::{TargetDocument, TargetWriter, WriteSummary};

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Main library interface: runs a merge from folder to target workbook.
pub struct SheetMerge {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl SheetMerge {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(output_formatter.wants_progress());

        Self {
            config,
            output_formatter,
            progress_manager,
        }
    }

    /// Create a SheetMerge instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Ok(Self::new(
            config,
            cli_args.output_mode(),
            cli_args.verbosity_level(),
            cli_args.quiet,
        ))
    }

    /// Runs the whole merge. Declined confirmations end in
    /// [`MergeOutcome::Aborted`]; every error is reported through `interaction`
    /// before it is returned.
    pub fn run(&self, request: &MergeRequest, interaction: &dyn Interaction) -> Result<MergeOutcome> {
        let mut trail = StateTrail::new();

        match self.execute(request, interaction, &mut trail) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.transition(&mut trail, RunState::Failed);
                interaction.report_error(&e);
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        request: &MergeRequest,
        interaction: &dyn Interaction,
        trail: &mut StateTrail,
    ) -> Result<MergeOutcome> {
        let start_time = Instant::now();

        let folder = FolderScanner::validate_folder(&request.source_dir)?;
        self.transition(trail, RunState::FolderSelected);

        let files = self.scan_sources(&folder, request)?;
        self.transition(trail, RunState::FilesEnumerated);

        let dataset = MergedDataset::merge(self.extract_all(&files))?;
        self.output_formatter.info(&format!(
            "Collected {} rows from {} files",
            dataset.len(),
            files.len() - dataset.skipped_count()
        ));
        self.transition(trail, RunState::DataExtracted);

        let Some(target) = self.resolve_target(request, &folder, interaction) else {
            return Ok(self.abort(trail));
        };
        if !config::has_xlsx_extension(&target) {
            return Err(SheetMergeError::target_write(
                &target,
                "target must be an .xlsx workbook",
            ));
        }
        self.transition(trail, RunState::TargetResolved);

        if target.exists() && !interaction.confirm_overwrite(&target) {
            return Ok(self.abort(trail));
        }

        let summary = self.write_target(&target, &dataset)?;
        self.transition(trail, RunState::Written);
        interaction.report_success(summary.rows_written, &summary.path);

        Ok(MergeOutcome::Written(MergeReport {
            source_dir: folder,
            target: summary.path,
            created: summary.created,
            rows_written: summary.rows_written,
            rows_cleared: summary.rows_cleared,
            files: dataset.contributions().to_vec(),
            states: trail.states().to_vec(),
            duration_ms: start_time.elapsed().as_millis() as u64,
            completed_at: chrono::Utc::now(),
        }))
    }

    /// Scans and extracts like [`SheetMerge::run`] but never asks or writes.
    pub fn plan(&self, request: &MergeRequest) -> Result<MergePlan> {
        let folder = FolderScanner::validate_folder(&request.source_dir)?;
        let files = self.scan_sources(&folder, request)?;
        let dataset = MergedDataset::merge(self.extract_all(&files))?;
        let target = self.default_target(request, &folder);

        Ok(MergePlan {
            source_dir: folder,
            target_exists: target.exists(),
            target,
            rows: dataset.len(),
            total_bytes: files.iter().map(|f| f.size).sum(),
            files: dataset.contributions().to_vec(),
        })
    }

    /// Enumerates the source folder, leaving out the workbook this run would
    /// write so that a previous result is never merged into itself.
    fn scan_sources(&self, folder: &Path, request: &MergeRequest) -> Result<Vec<SourceFile>> {
        self.output_formatter
            .start_operation(&format!("Scanning {}", folder.display()));

        let scanner = FolderScanner::new(&self.config.scan);
        let mut files = scanner.scan_folder(folder)?;

        if let Ok(target) = self.default_target(request, folder).canonicalize() {
            let before = files.len();
            files.retain(|f| f.path != target);
            if files.len() < before {
                self.output_formatter
                    .debug(&format!("Not reading the target {} as a source", target.display()));
            }
        }

        if files.is_empty() {
            return Err(SheetMergeError::NoEligibleFiles {
                path: folder.display().to_string(),
                searched_extensions: scanner.filter().get_extensions().clone(),
            });
        }

        self.output_formatter
            .info(&format!("Found {} spreadsheet files", files.len()));
        for file in &files {
            self.output_formatter.debug(&file.display_path());
        }

        Ok(files)
    }

    /// Extract every file with progress tracking; unreadable files become skips.
    fn extract_all(&self, files: &[SourceFile]) -> Vec<FileOutcome> {
        let start_time = Instant::now();
        let column_extractor = ColumnExtractor::new();
        let file_progress = self.progress_manager.create_file_progress(files.len() as u64);

        let outcomes: Vec<FileOutcome> = files
            .iter()
            .map(|source| {
                ui::progress::update_file_progress(&file_progress, source);
                let outcome = column_extractor.extract(source);

                if let ExtractionStatus::Skipped { reason } = &outcome.status {
                    self.progress_manager.suspend(|| {
                        self.output_formatter
                            .warning(&format!("Skipping {}: {}", source.filename, reason));
                    });
                } else {
                    self.output_formatter.debug(&format!(
                        "{}: {} rows",
                        source.filename,
                        outcome.row_count()
                    ));
                }

                file_progress.inc(1);
                outcome
            })
            .collect();

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Read {} files", files.len()),
            start_time.elapsed(),
        );
        self.progress_manager.clear();

        outcomes
    }

    fn resolve_target(
        &self,
        request: &MergeRequest,
        folder: &Path,
        interaction: &dyn Interaction,
    ) -> Option<PathBuf> {
        if let Some(target) = &request.target {
            return Some(target.clone());
        }

        if !interaction.confirm_create_new() {
            return None;
        }

        interaction.request_target_path(&self.config.default_target_in(folder))
    }

    fn default_target(&self, request: &MergeRequest, folder: &Path) -> PathBuf {
        request
            .target
            .clone()
            .unwrap_or_else(|| self.config.default_target_in(folder))
    }

    fn write_target(&self, target: &Path, dataset: &MergedDataset) -> Result<WriteSummary> {
        self.output_formatter
            .start_operation(&format!("Writing {}", target.display()));

        let spinner = self
            .progress_manager
            .create_spinner(&format!("Saving {} rows", dataset.len()));
        let result = TargetWriter::new(&self.config.write).write(target, dataset);
        spinner.finish_and_clear();

        result
    }

    fn abort(&self, trail: &mut StateTrail) -> MergeOutcome {
        self.transition(trail, RunState::Aborted);
        MergeOutcome::Aborted {
            states: trail.states().to_vec(),
        }
    }

    fn transition(&self, trail: &mut StateTrail, next: RunState) {
        let previous = trail.advance(next);
        self.output_formatter.state_change(previous, next);
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cell, read_sheet, write_workbook, Fixture};
    use calamine::Data;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Answers confirmations from a script and records what it was asked.
    #[derive(Default)]
    struct Scripted {
        answers: RefCell<VecDeque<bool>>,
        target: Option<PathBuf>,
        prompts: RefCell<Vec<String>>,
        errors: RefCell<Vec<String>>,
        successes: RefCell<Vec<(usize, PathBuf)>>,
    }

    impl Scripted {
        fn answering(answers: &[bool]) -> Self {
            Self {
                answers: RefCell::new(answers.iter().copied().collect()),
                ..Self::default()
            }
        }

        fn with_target(mut self, target: PathBuf) -> Self {
            self.target = Some(target);
            self
        }
    }

    impl Interaction for Scripted {
        fn confirm(&self, prompt: &str) -> bool {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.answers.borrow_mut().pop_front().unwrap_or(false)
        }

        fn request_target_path(&self, _suggested: &Path) -> Option<PathBuf> {
            self.target.clone()
        }

        fn report_error(&self, error: &SheetMergeError) {
            self.errors.borrow_mut().push(error.user_message());
        }

        fn report_success(&self, rows: usize, target: &Path) {
            self.successes
                .borrow_mut()
                .push((rows, target.to_path_buf()));
        }
    }

    fn quiet_app() -> SheetMerge {
        SheetMerge::new(Config::default(), OutputMode::Plain, 0, true)
    }

    /// jan.xlsx: header, two data rows with a blank row between; feb.xlsx: header, one row.
    fn monthly_sources() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("monthly");
        std::fs::create_dir(&source).unwrap();

        write_workbook(
            &source.join("jan.xlsx"),
            &[
                &[Fixture::Text("item"), Fixture::Text("qty")],
                &[Fixture::Text("apples"), Fixture::Number(3.0)],
                &[Fixture::Blank, Fixture::Blank],
                &[Fixture::Text("pears"), Fixture::Number(5.0)],
            ],
        );
        write_workbook(
            &source.join("feb.xlsx"),
            &[
                &[Fixture::Text("item"), Fixture::Text("qty")],
                &[Fixture::Text("plums"), Fixture::Number(7.0)],
            ],
        );
        std::fs::write(source.join("~$jan.xlsx"), b"lock").unwrap();
        std::fs::write(source.join("notes.txt"), b"ignore me").unwrap();

        (temp_dir, source)
    }

    fn written(outcome: MergeOutcome) -> MergeReport {
        match outcome {
            MergeOutcome::Written(report) => report,
            MergeOutcome::Aborted { states } => panic!("run aborted: {:?}", states),
        }
    }

    #[test]
    fn test_merge_into_explicit_new_target() {
        let (temp_dir, source) = monthly_sources();
        let target = temp_dir.path().join("out.xlsx");
        let interaction = Scripted::default();

        let report = written(
            quiet_app()
                .run(
                    &MergeRequest::new(&source).with_target(Some(&target)),
                    &interaction,
                )
                .unwrap(),
        );

        assert!(interaction.prompts.borrow().is_empty());
        assert!(report.created);
        assert_eq!(report.rows_written, 3);
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].filename, "feb.xlsx");
        assert_eq!(report.files[1].filename, "jan.xlsx");
        assert_eq!(
            report.states,
            vec![
                RunState::Idle,
                RunState::FolderSelected,
                RunState::FilesEnumerated,
                RunState::DataExtracted,
                RunState::TargetResolved,
                RunState::Written,
            ]
        );
        assert_eq!(interaction.successes.borrow().as_slice(), &[(3, target.clone())]);

        let range = read_sheet(&target, 0);
        assert_eq!(range.get_size(), (3, 2));
        assert_eq!(cell(&range, 0, 0), Data::String("plums".to_string()));
        assert_eq!(cell(&range, 1, 0), Data::String("apples".to_string()));
        assert_eq!(cell(&range, 2, 0), Data::String("pears".to_string()));
        assert_eq!(cell(&range, 2, 1), Data::Float(5.0));
    }

    #[test]
    fn test_declining_overwrite_leaves_target_untouched() {
        let (temp_dir, source) = monthly_sources();
        let target = temp_dir.path().join("existing.xlsx");
        write_workbook(&target, &[&[Fixture::Text("keep"), Fixture::Number(1.0)]]);
        let before = std::fs::read(&target).unwrap();

        let interaction = Scripted::answering(&[false]);
        let outcome = quiet_app()
            .run(
                &MergeRequest::new(&source).with_target(Some(&target)),
                &interaction,
            )
            .unwrap();

        match outcome {
            MergeOutcome::Aborted { states } => {
                assert_eq!(states.last(), Some(&RunState::Aborted));
                assert!(states.contains(&RunState::TargetResolved));
            }
            other => panic!("expected abort, got {:?}", other),
        }
        assert_eq!(interaction.prompts.borrow().len(), 1);
        assert_eq!(std::fs::read(&target).unwrap(), before);
    }

    #[test]
    fn test_confirmed_overwrite_is_idempotent() {
        let (temp_dir, source) = monthly_sources();
        let target = temp_dir.path().join("existing.xlsx");
        let request = MergeRequest::new(&source).with_target(Some(&target));

        written(quiet_app().run(&request, &Scripted::default()).unwrap());
        let first = read_sheet(&target, 0);

        let report = written(
            quiet_app()
                .run(&request, &Scripted::answering(&[true]))
                .unwrap(),
        );
        let second = read_sheet(&target, 0);

        assert!(!report.created);
        assert_eq!(report.rows_cleared, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_target_asks_to_create_then_for_a_path() {
        let (temp_dir, source) = monthly_sources();
        let chosen = temp_dir.path().join("chosen.xlsx");
        let interaction = Scripted::answering(&[true]).with_target(chosen.clone());

        let report = written(
            quiet_app()
                .run(&MergeRequest::new(&source), &interaction)
                .unwrap(),
        );

        assert_eq!(interaction.prompts.borrow().len(), 1);
        assert_eq!(report.target, chosen);
        assert!(chosen.exists());
    }

    #[test]
    fn test_declining_create_or_giving_no_path_aborts() {
        let (_temp_dir, source) = monthly_sources();

        let outcome = quiet_app()
            .run(&MergeRequest::new(&source), &Scripted::answering(&[false]))
            .unwrap();
        assert!(matches!(outcome, MergeOutcome::Aborted { .. }));

        let outcome = quiet_app()
            .run(&MergeRequest::new(&source), &Scripted::answering(&[true]))
            .unwrap();
        match outcome {
            MergeOutcome::Aborted { states } => {
                assert_eq!(states.last(), Some(&RunState::Aborted));
                assert!(!states.contains(&RunState::TargetResolved));
            }
            other => panic!("expected abort, got {:?}", other),
        }

        assert!(!source.join("merged.xlsx").exists());
    }

    #[test]
    fn test_previous_result_in_source_folder_is_not_merged() {
        let (_temp_dir, source) = monthly_sources();
        let app = SheetMerge::new(Config::default(), OutputMode::Plain, 0, true);
        let formatter = OutputFormatter::new(OutputMode::Plain, 0, true);

        let first = written(app.run(&MergeRequest::new(&source), &AssumeYes::new(&formatter)).unwrap());
        assert!(first.created);
        assert_eq!(first.target, source.canonicalize().unwrap().join("merged.xlsx"));

        let second = written(app.run(&MergeRequest::new(&source), &AssumeYes::new(&formatter)).unwrap());
        assert!(!second.created);
        assert_eq!(second.rows_written, 3);
        assert_eq!(second.files.len(), 2);
    }

    #[test]
    fn test_unreadable_file_is_skipped_and_recorded() {
        let (temp_dir, source) = monthly_sources();
        std::fs::write(source.join("broken.xlsx"), b"not a workbook").unwrap();
        let target = temp_dir.path().join("out.xlsx");

        let report = written(
            quiet_app()
                .run(
                    &MergeRequest::new(&source).with_target(Some(&target)),
                    &Scripted::default(),
                )
                .unwrap(),
        );

        assert_eq!(report.rows_written, 3);
        assert_eq!(report.files_skipped(), 1);
        let broken = report
            .files
            .iter()
            .find(|f| f.filename == "broken.xlsx")
            .unwrap();
        assert!(broken.skipped.is_some());
        assert_eq!(broken.rows, 0);
    }

    #[test]
    fn test_failures_are_reported_and_returned() {
        let temp_dir = TempDir::new().unwrap();
        let interaction = Scripted::default();

        let result = quiet_app().run(
            &MergeRequest::new(temp_dir.path().join("missing")),
            &interaction,
        );
        assert!(matches!(result, Err(SheetMergeError::InvalidSourceFolder { .. })));
        assert_eq!(interaction.errors.borrow().len(), 1);

        let result = quiet_app().run(&MergeRequest::new(temp_dir.path()), &Scripted::default());
        assert!(matches!(result, Err(SheetMergeError::NoEligibleFiles { .. })));

        write_workbook(
            &temp_dir.path().join("header_only.xlsx"),
            &[&[Fixture::Text("item"), Fixture::Text("qty")]],
        );
        let result = quiet_app().run(&MergeRequest::new(temp_dir.path()), &Scripted::default());
        assert!(matches!(result, Err(SheetMergeError::NoDataExtracted { .. })));
    }

    #[test]
    fn test_non_xlsx_target_fails_before_any_prompt() {
        let (temp_dir, source) = monthly_sources();
        let target = temp_dir.path().join("out.xls");
        std::fs::write(&target, b"old").unwrap();
        let interaction = Scripted::answering(&[true]);

        let result = quiet_app().run(
            &MergeRequest::new(&source).with_target(Some(&target)),
            &interaction,
        );

        assert!(matches!(result, Err(SheetMergeError::TargetWrite { .. })));
        assert!(interaction.prompts.borrow().is_empty());
        assert_eq!(std::fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_plan_does_not_write() {
        let (temp_dir, source) = monthly_sources();
        let target = temp_dir.path().join("planned.xlsx");

        let plan = quiet_app()
            .plan(&MergeRequest::new(&source).with_target(Some(&target)))
            .unwrap();

        assert_eq!(plan.rows, 3);
        assert_eq!(plan.files.len(), 2);
        assert_eq!(plan.target, target);
        assert!(!plan.target_exists);
        assert!(plan.total_bytes > 0);
        assert!(!target.exists());
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        SheetMerge::generate_sample_config(&config_path).unwrap();

        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[scan]"));
        assert!(content.contains("[write]"));
        assert!(Config::load_from_file(&config_path).is_ok());
    }

    #[test]
    fn test_version_info() {
        assert!(!version_info().is_empty());
    }
}
