mod cli;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use tutor_predict::config::AppConfig;
use tutor_predict::logging;
use tutor_predict::{PredictError, PredictionRequest};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read request: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid request JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Predict(#[from] PredictError),
}

fn read_request(path: Option<PathBuf>) -> Result<PredictionRequest, CliError> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&text)?)
}

fn run(cli: Cli, config: &AppConfig) -> Result<(), CliError> {
    let prediction_config = config.load_prediction_config()?;
    let request = read_request(cli.request)?;

    let report = request.run(&prediction_config)?;
    let output = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{output}");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let mut config = AppConfig::from_env();
    if let Some(path) = &cli.config {
        config.config_path = Some(path.clone());
    }
    let _log_guard = logging::init_tracing(&config);

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "prediction failed");
            ExitCode::FAILURE
        }
    }
}
