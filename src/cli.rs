//! CLI - Command-line argument parsing

use std::path::PathBuf;

use clap::Parser;

/// Retention and progress prediction for one student's topic history
#[derive(Debug, Parser)]
#[command(name = "tutor-predict")]
#[command(about = "Predict review urgency, weakness trends and the next session plan", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON request file; read from stdin when omitted
    pub request: Option<PathBuf>,

    /// JSON config file (overrides $PREDICT_CONFIG_PATH)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the report on a single line
    #[arg(long)]
    pub compact: bool,
}
