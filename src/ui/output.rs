use crate::error::{SheetMergeError, UserFriendlyError};
use crate::extractor::FileContribution;
use crate::report::{MergePlan, MergeReport, RunState};
use crate::ui::progress::format_duration;
use console::{style, Emoji, Term};
use serde_json;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

impl OutputMode {
    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputMode::Json,
            "plain" => OutputMode::Plain,
            _ => OutputMode::Human,
        }
    }
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

pub struct OutputFormatter {
    term: Term,
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            term,
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Progress bars only make sense for an interactive human reader.
    pub fn wants_progress(&self) -> bool {
        self.mode == OutputMode::Human && !self.quiet && self.term.is_term()
    }

    // Core messaging methods
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn state_change(&self, from: RunState, to: RunState) {
        if !self.should_show_message(2) {
            return;
        }

        match self.mode {
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "state",
                "from": from,
                "to": to,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            _ => self.debug(&format!("state: {} -> {}", from, to)),
        }
    }

    // User-friendly error handling
    pub fn print_user_friendly_error(&self, error: &SheetMergeError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    // Summary and reporting
    pub fn print_merge_report(&self, report: &MergeReport) {
        match self.mode {
            OutputMode::Human => {
                if !self.quiet {
                    self.print_human_report(report);
                }
            }
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => self.print_plain_report(report),
        }
    }

    pub fn print_plan(&self, plan: &MergePlan) {
        match self.mode {
            OutputMode::Human => self.print_human_plan(plan),
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(plan).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => self.print_plain_plan(plan),
        }
    }

    pub fn print_aborted(&self, states: &[RunState]) {
        match self.mode {
            OutputMode::Human => {
                if !self.quiet {
                    println!("{}Merge cancelled, no files were changed.", WARNING);
                }
            }
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "aborted",
                "states": states,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            OutputMode::Plain => println!("ABORTED: no files were changed"),
        }
    }

    // Specialized output methods
    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {} // No separator in JSON mode
        }
    }

    // Private helper methods
    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn highlight(&self, value: String) -> String {
        if self.use_colors {
            style(value).cyan().bold().to_string()
        } else {
            value
        }
    }

    fn print_human_report(&self, report: &MergeReport) {
        self.print_header("Merge Report");

        println!("  Source folder:  {}", report.source_dir.display());
        println!(
            "  Target:         {} ({})",
            report.target.display(),
            if report.created { "created" } else { "overwritten" }
        );
        println!(
            "  Rows written:   {}",
            self.highlight(report.rows_written.to_string())
        );
        if report.rows_cleared > 0 {
            println!("  Rows cleared:   {}", report.rows_cleared);
        }
        println!(
            "  Time taken:     {}",
            self.highlight(format_duration(Duration::from_millis(report.duration_ms)))
        );
        println!();

        self.print_contributions(&report.files);
        self.print_separator();
    }

    fn print_plain_report(&self, report: &MergeReport) {
        println!("REPORT: Merge completed");
        println!("Source: {}", report.source_dir.display());
        println!("Target: {}", report.target.display());
        println!("Created: {}", report.created);
        println!("Rows written: {}", report.rows_written);
        println!("Rows cleared: {}", report.rows_cleared);
        println!("Files: {}", report.files.len());
        for file in &report.files {
            match &file.skipped {
                Some(reason) => println!("SKIPPED: {}: {}", file.filename, reason),
                None => println!("FILE: {}: {} rows", file.filename, file.rows),
            }
        }
    }

    fn print_human_plan(&self, plan: &MergePlan) {
        self.print_header("Merge Plan");

        println!("  Source folder:  {}", plan.source_dir.display());
        println!(
            "  Files:          {} ({})",
            plan.files.len(),
            format_bytes(plan.total_bytes)
        );
        println!("  Rows to write:  {}", self.highlight(plan.rows.to_string()));
        println!(
            "  Target:         {} ({})",
            plan.target.display(),
            if plan.target_exists {
                "would be overwritten"
            } else {
                "would be created"
            }
        );
        println!();

        self.print_contributions(&plan.files);
        self.print_separator();
    }

    fn print_plain_plan(&self, plan: &MergePlan) {
        println!("PLAN: Dry run");
        println!("Source: {}", plan.source_dir.display());
        println!("Target: {}", plan.target.display());
        println!("Target exists: {}", plan.target_exists);
        println!("Rows: {}", plan.rows);
        for file in &plan.files {
            match &file.skipped {
                Some(reason) => println!("SKIPPED: {}: {}", file.filename, reason),
                None => println!("FILE: {}: {} rows", file.filename, file.rows),
            }
        }
    }

    fn print_contributions(&self, files: &[FileContribution]) {
        if files.is_empty() {
            return;
        }

        println!("Files in merge order:");
        for file in files {
            match &file.skipped {
                Some(reason) => {
                    let line = format!("  {}: skipped ({})", file.filename, reason);
                    if self.use_colors {
                        println!("{}", style(line).yellow());
                    } else {
                        println!("{}", line);
                    }
                }
                None => println!("  {}: {} rows", file.filename, file.rows),
            }
        }
        println!();
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!(OutputMode::from_string("human"), OutputMode::Human);
        assert_eq!(OutputMode::from_string("JSON"), OutputMode::Json);
        assert_eq!(OutputMode::from_string("plain"), OutputMode::Plain);
        assert_eq!(OutputMode::from_string("invalid"), OutputMode::Human);
    }

    #[test]
    fn test_quiet_mode() {
        let formatter = OutputFormatter::new(OutputMode::Human, 2, true);
        assert_eq!(formatter.verbose_level, 0);
        assert!(formatter.is_quiet());
        assert!(!formatter.wants_progress());
    }

    #[test]
    fn test_json_mode_never_draws_progress() {
        let formatter = OutputFormatter::new(OutputMode::Json, 0, false);
        assert!(!formatter.wants_progress());
        assert!(!formatter.use_colors);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
    }

    #[test]
    fn test_should_show_message() {
        let formatter = OutputFormatter::new(OutputMode::Plain, 1, false);
        assert!(formatter.should_show_message(0));
        assert!(formatter.should_show_message(1));
        assert!(!formatter.should_show_message(2));

        let quiet_formatter = OutputFormatter::new(OutputMode::Plain, 2, true);
        assert!(!quiet_formatter.should_show_message(0));
    }
}
