use clap::Parser;
use sheetmerge::{
    AssumeYes, Cli, Interaction, MergeOutcome, MergeRequest, OutputFormatter, SheetMerge,
    SheetMergeError, TerminalInteraction, UserFriendlyError,
};
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let app = match SheetMerge::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            print_startup_error(&cli, &e);
            return e.exit_code();
        }
    };

    let request = cli.merge_request();

    if cli.dry_run {
        return handle_dry_run(&app, &request);
    }

    let formatter = app.output_formatter();
    let interaction: Box<dyn Interaction + '_> = if cli.yes {
        Box::new(AssumeYes::new(formatter))
    } else {
        Box::new(TerminalInteraction::new(formatter))
    };

    match app.run(&request, interaction.as_ref()) {
        Ok(MergeOutcome::Written(report)) => {
            formatter.print_merge_report(&report);
            0
        }
        Ok(MergeOutcome::Aborted { states }) => {
            formatter.print_aborted(&states);
            0
        }
        // Already reported through the interaction.
        Err(e) => e.exit_code(),
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "sheetmerge.toml".to_string());

    match SheetMerge::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  sheetmerge <SOURCE_DIR> --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(app: &SheetMerge, request: &MergeRequest) -> i32 {
    let formatter = app.output_formatter();

    formatter.info("DRY RUN MODE - the target will not be written");

    let config = app.config();
    formatter.debug(&format!("Extensions: {}", config.scan.extensions.join(", ")));
    formatter.debug(&format!("Lock file prefix: {}", config.scan.lock_file_prefix));
    if !config.scan.exclude_patterns.is_empty() {
        formatter.debug(&format!(
            "Exclude patterns: {}",
            config.scan.exclude_patterns.join(", ")
        ));
    }

    match app.plan(request) {
        Ok(plan) => {
            formatter.print_plan(&plan);
            formatter.info("Run without --dry-run to write the target");
            0
        }
        Err(e) => {
            formatter.print_user_friendly_error(&e);
            e.exit_code()
        }
    }
}

fn print_startup_error(cli: &Cli, error: &SheetMergeError) {
    let formatter = OutputFormatter::new(cli.output_mode(), 0, false);
    formatter.print_user_friendly_error(error);
}
