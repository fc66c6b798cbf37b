use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use flexi_logger::{colored_detailed_format, Logger};
use futures::StreamExt;
use log::info;
use relay_server::{Config, MockRelay};
use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook_tokio::Signals;

#[derive(Debug, clap::Parser)]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1", env = "RELAY_MOCK_ADDR")]
    addr: String,
    #[arg(short, long, default_value_t = 7447, env = "RELAY_MOCK_PORT")]
    port: u16,
    /// delay of the simulated live event after EOSE
    #[arg(short, long, default_value_t = 100, env = "RELAY_MOCK_INTERVAL_MS")]
    interval_ms: u64,
    #[arg(short, long, default_value = "info", env = "RELAY_MOCK_LOG_LEVEL")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    // parse command line args
    let args = Args::parse();
    println!("args: {args:?}");
    // logger init
    let _logger = Logger::try_with_str(&args.log_level)?
        .format(colored_detailed_format)
        .start()?;

    let config = Config {
        event_interval: Duration::from_millis(args.interval_ms),
        ..Config::new(SocketAddr::new(args.addr.parse()?, args.port))
    };
    run(config)
}

#[tokio::main]
async fn run(config: Config) -> anyhow::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGQUIT])?;
    let handle = signals.handle();

    let relay = MockRelay::start(config).await?;
    info!("serving fake events on {}", relay.url());

    signals.next().await;
    handle.close();
    info!("shutting down mock relay");
    relay.close().await;
    Ok(())
}
