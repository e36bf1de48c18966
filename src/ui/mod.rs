pub mod interaction;
pub mod output;
pub mod progress;

pub use interaction::{AssumeYes, Interaction, TerminalInteraction};
pub use output::{OutputFormatter, OutputMode};
pub use progress::ProgressManager;
