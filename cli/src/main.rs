mod app;
mod args;
mod commands;
mod error;
mod prelude;
mod render;

use std::path::Path;

use clap::Parser;
use tokio::io::BufReader;
use uavlink_core::session::WsConnector;

use crate::{app::App, args::Args, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match setup_logging(&args.log_dir) {
        Ok(_guard) => {
            if let Err(e) = run(args).await {
                error!("{e}");
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
}

fn setup_logging(dir: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_appender::{non_blocking, rolling};
    use tracing_subscriber::{EnvFilter, fmt};

    // stdout belongs to the operator display
    let file_appender = rolling::daily(dir, "uavlink.log");
    let (non_blocking, guard) = non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt().with_writer(non_blocking).with_env_filter(env_filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}

#[instrument(skip_all)]
async fn run(args: Args) -> Result<()> {
    debug!("Running with {:?}", args);
    let app = App::start(&args, WsConnector, std::io::stdout()).await?;
    app.run(BufReader::new(tokio::io::stdin())).await
}
