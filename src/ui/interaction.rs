use crate::error::SheetMergeError;
use crate::ui::output::OutputFormatter;
use console::{style, Term};
use std::path::{Path, PathBuf};

/// Everything the merge pipeline needs from whoever drives it.
///
/// Only [`Interaction::confirm`] has to be answered by an implementation; the
/// two specific confirmations are phrased on top of it.
pub trait Interaction {
    fn confirm(&self, prompt: &str) -> bool;

    fn confirm_overwrite(&self, target: &Path) -> bool {
        self.confirm(&format!(
            "Columns A and B of {} will be overwritten. Continue?",
            target.display()
        ))
    }

    fn confirm_create_new(&self) -> bool {
        self.confirm("No target workbook was given. Create a new one?")
    }

    /// Asks where the new workbook should go. `None` cancels the run.
    fn request_target_path(&self, suggested: &Path) -> Option<PathBuf>;

    fn report_error(&self, error: &SheetMergeError);

    fn report_success(&self, rows: usize, target: &Path);
}

/// Asks on the terminal. Anything other than `y`/`yes` declines, and so does a
/// closed stdin.
pub struct TerminalInteraction<'a> {
    formatter: &'a OutputFormatter,
    term: Term,
}

impl<'a> TerminalInteraction<'a> {
    pub fn new(formatter: &'a OutputFormatter) -> Self {
        Self {
            formatter,
            term: Term::stderr(),
        }
    }

    fn ask(&self, prompt: &str) -> Option<String> {
        let prompt = if self.term.features().colors_supported() {
            style(prompt).bold().to_string()
        } else {
            prompt.to_string()
        };
        self.term.write_str(&prompt).ok()?;

        // Term::read_line refuses to read from a pipe, stdin does not.
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => {
                self.term.write_line("").ok();
                None
            }
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Interaction for TerminalInteraction<'_> {
    fn confirm(&self, prompt: &str) -> bool {
        self.ask(&format!("{} [y/N] ", prompt))
            .map(|answer| is_yes(&answer))
            .unwrap_or(false)
    }

    fn request_target_path(&self, suggested: &Path) -> Option<PathBuf> {
        let answer = self.ask(&format!("Target workbook [{}]: ", suggested.display()))?;
        if answer.is_empty() {
            Some(suggested.to_path_buf())
        } else {
            Some(PathBuf::from(answer))
        }
    }

    fn report_error(&self, error: &SheetMergeError) {
        self.formatter.print_user_friendly_error(error);
    }

    fn report_success(&self, rows: usize, target: &Path) {
        self.formatter
            .success(&format!("Merged {} rows into {}", rows, target.display()));
    }
}

/// Unattended mode: every confirmation is accepted and the suggested target
/// path is used as is.
pub struct AssumeYes<'a> {
    formatter: &'a OutputFormatter,
}

impl<'a> AssumeYes<'a> {
    pub fn new(formatter: &'a OutputFormatter) -> Self {
        Self { formatter }
    }
}

impl Interaction for AssumeYes<'_> {
    fn confirm(&self, prompt: &str) -> bool {
        self.formatter.debug(&format!("{} yes (--yes)", prompt));
        true
    }

    fn request_target_path(&self, suggested: &Path) -> Option<PathBuf> {
        Some(suggested.to_path_buf())
    }

    fn report_error(&self, error: &SheetMergeError) {
        self.formatter.print_user_friendly_error(error);
    }

    fn report_success(&self, rows: usize, target: &Path) {
        self.formatter
            .success(&format!("Merged {} rows into {}", rows, target.display()));
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "y" | "yes")
}
