mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;
use commands::Context;
use gg_core::{config, GerritError, Report};
use gg_gerrit::GerritClient;
use gg_vcs::LocalRepository;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn setup_logging(level: cli::LogLevel) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level.as_tracing()).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<Report, GerritError> {
    let repo = gg_vcs::detection::discover_repo()?;
    debug!(root = %repo.root().display(), "using repository");
    let config = config::resolve_from_process(&repo)?;
    let client = GerritClient::new(&config)?;
    let ctx = Context {
        server: &client,
        repo: &repo,
        config: &config,
        selector: cli.selector(),
        support_chain: cli.support_chain,
    };
    commands::handle(cli.command, &ctx).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.log_level);

    match run(cli).await {
        Ok(report) => {
            if let Err(err) = output::render(&report, &mut std::io::stdout().lock()) {
                eprintln!("error: failed to write output: {err}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = output::render_error(&err, &mut std::io::stderr().lock());
            ExitCode::FAILURE
        }
    }
}
