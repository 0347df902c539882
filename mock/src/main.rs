mod server;
mod vehicle;

use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use tracing::info;

use crate::server::{MockConfig, MockServer};

/// Pretend vehicle backend speaking the uavlink frame schema.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = 14555)]
    port: u16,

    #[arg(long = "image-interval-secs", default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    image_interval_secs: u64,

    #[arg(long = "message-interval-secs", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    message_interval_secs: u64,

    /// stop after this many seconds, 0 runs until interrupted
    #[arg(long = "timeout-secs", default_value_t = 0)]
    timeout_secs: u64,
}

impl Args {
    fn config(&self) -> MockConfig {
        MockConfig {
            image_interval: Duration::from_secs(self.image_interval_secs),
            message_interval: Duration::from_secs(self.message_interval_secs),
        }
    }
}

fn setup_tracing() -> Result<()> {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    setup_tracing()?;
    let args = Args::parse();

    let server = MockServer::bind((args.host.as_str(), args.port), args.config()).await?;
    info!(addr = %server.local_addr()?, "Mock vehicle backend listening");

    let serve = async {
        match args.timeout_secs {
            0 => server.serve().await,
            secs => match tokio::time::timeout(Duration::from_secs(secs), server.serve()).await {
                Ok(result) => result,
                Err(_) => {
                    info!("Timeout reached after {secs}s");
                    Ok(())
                }
            },
        }
    };

    tokio::select! {
        result = serve => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    }
}
