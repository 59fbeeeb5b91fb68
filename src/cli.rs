use std::io::Write;
use std::path::PathBuf;

use gcal_digest::storage::config::Config;
use gcal_digest::{DigestError, RunOutcome};

pub const USAGE: &str = "Usage: gcal-digest [--config PATH] [--input PATH] [--output PATH]";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliMode {
    Help,
    Run(CliArgs),
}

pub fn parse_cli_mode<I>(args: I) -> Result<CliMode, String>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let slot = match arg.as_str() {
            "--help" | "-h" => return Ok(CliMode::Help),
            "--config" => &mut parsed.config,
            "--input" => &mut parsed.input,
            "--output" => &mut parsed.output,
            _ => return Err(format!("Unknown argument: {}", arg)),
        };

        let value = args
            .next()
            .filter(|v| !v.starts_with("--"))
            .ok_or_else(|| format!("Missing value for {}", arg))?;
        *slot = Some(PathBuf::from(value));
    }

    Ok(CliMode::Run(parsed))
}

impl CliArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::config_path)
    }

    /// Command-line paths override the ones from the config file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.files.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.files.output = output.clone();
        }
    }
}

/// Prints the outcome of a run and returns the process exit status.
pub fn report<O: Write, E: Write>(
    result: &Result<RunOutcome, DigestError>,
    out: &mut O,
    err: &mut E,
) -> u8 {
    match result {
        Ok(outcome) => {
            // A closed stdout does not turn a completed run into a failure.
            let _ = writeln!(out, "{}", outcome);
            0
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            let _ = writeln!(err, "Error: {}", e);
            1
        }
    }
}
