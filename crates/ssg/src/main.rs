use std::process::ExitCode;

use anyhow::Result;
use clap::{error::ErrorKind, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vite_ssg::cli::{BuildArgs, Cli, Commands};
use vite_ssg::output::report_failure;
use vite_ssg::{Pipeline, ToolConfig};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vite_ssg=info,vite_ssg_render=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            report_failure(err.render().to_string().trim());
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Build(args) => build(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn build(args: BuildArgs) -> Result<()> {
    let config = ToolConfig::from_env()?.with_config_file(args.config.clone());
    let report = Pipeline::vite(&config)
        .run(args.to_options(), &config)
        .await?;

    tracing::debug!(pages = report.pages.len(), out_dir = %report.out_dir.display(), "build complete");
    Ok(())
}
