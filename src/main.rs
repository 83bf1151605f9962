use std::{net::SocketAddr, path::PathBuf, str::FromStr, sync::Arc};

use clap::{Parser, Subcommand};
use stella_site::{
    build::{build_site, Output},
    build_base_url, serve_base_url, server, Composer, Context,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stella-site")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Site directory holding config.toml, content/, templates/ and static/
    #[arg(short, long, default_value = "site")]
    path: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve composed pages and static assets over HTTP
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:1111")]
        bind: SocketAddr,
        /// Point base_url at the bind address
        #[arg(short, long)]
        local: bool,
    },
    /// Write every composed page and the static assets to a directory
    Build {
        #[arg(default_value = "public")]
        output_dir: String,
        #[arg(short, long)]
        local: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stella_site=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    tracing::debug!(?args, "running");

    let home = PathBuf::from_str(&args.path)?;

    match args.command {
        Command::Serve { bind, local } => {
            let base_url = serve_base_url(bind, local)?;

            let context = Context::new(home, base_url)?;
            let composer = Arc::new(Composer::load(&context)?);

            let listener = tokio::net::TcpListener::bind(bind).await?;

            tracing::info!(
                bind = %bind,
                base_url = %context.config.base_url,
                static_dir = %context.static_dir().display(),
                "listening"
            );

            let app = server::app(composer, context.static_dir());
            axum::serve(listener, app).await?;
        }
        Command::Build { output_dir, local } => {
            let base_url = build_base_url(local)?;

            let output = Output::new(home.join(&output_dir));
            let context = Context::new(home, base_url)?;
            let composer = Composer::load(&context)?;

            build_site(&context, &composer, &output)?;
        }
    }

    Ok(())
}
