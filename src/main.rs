use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod compat;
mod config;
mod date;
mod error;
mod gateway;
mod listing;
mod model;
mod page;
mod post;
mod render;
mod server;
mod site;
mod store;

use error::AppError;

#[derive(Parser, Debug)]
#[command(name = "spacetraveling", version, about = "Blog front end for a Prismic repository")]
struct Cli {
    /// Path to the TOML configuration file.
    config: PathBuf,

    /// Prismic access token; overrides the one in the configuration file.
    #[arg(long, env = "PRISMIC_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the site over HTTP (default).
    Serve,
    /// Prerender the site into a directory of HTML files.
    Build {
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("spacetraveling=info,tower_http=info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %compat::error_chain(&err), "exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = config::Config::load(&cli.config)?;
    if cli.access_token.is_some() {
        config.prismic.access_token = cli.access_token;
    }
    tracing::debug!(
        endpoint = %config.prismic.endpoint,
        net = ?config.net,
        site = ?config.site,
        "loaded configuration"
    );

    let gateway = gateway::PrismicClient::new(
        config.prismic.endpoint.clone(),
        config.prismic.access_token.clone(),
        config.prismic.timeout(),
    )?;
    let site = Arc::new(site::Site::new(&config, Arc::new(gateway))?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Build { out } => {
            let written = site.export(&out).await?;
            tracing::info!(pages = written.len(), out = %out.display(), "build finished");
        }

        Command::Serve => {
            match site.prerender().await {
                Ok(pages) => tracing::info!(pages = pages.len(), "prerendered"),
                Err(err) => tracing::warn!(
                    error = %compat::error_chain(&err),
                    "prerender failed, pages will be generated on demand"
                ),
            }

            let app = server::router(site, config.net.static_dir.as_deref());
            let listener = tokio::net::TcpListener::bind(config.net.bind).await?;
            tracing::info!(bind = %config.net.bind, "listening");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
