use std::process::ExitCode;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{CliArgs, CliMode, USAGE, parse_cli_mode, report};

use gcal_digest::storage::config::Config;
use gcal_digest::{DigestEngine, DigestError, RunOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _guard = setup_logging();

    let args = match parse_cli_mode(std::env::args().skip(1)) {
        Ok(CliMode::Run(args)) => args,
        Ok(CliMode::Help) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            tracing::error!("{}", err);
            eprintln!("Error: {}", err);
            println!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    let result = run(&args).await;
    ExitCode::from(report(
        &result,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    ))
}

async fn run(args: &CliArgs) -> Result<RunOutcome, DigestError> {
    let mut config = Config::load_or_create_at(&args.config_path())?;
    args.apply(&mut config);

    DigestEngine::new(config)?.run().await
}

fn setup_logging() -> WorkerGuard {
    let log_dir = Config::config_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "gcal-digest.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    tracing::info!("gcal-digest started");
    guard
}
