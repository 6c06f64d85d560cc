use clap::Parser;
use log::error;
use tokio_util::sync::CancellationToken;

use netwatch::alert::{AlertSink, Notifier};
use netwatch::cli::{Cli, log_filter};
use netwatch::config::MonitorConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    env_logger::init_from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose)),
    );

    let config = match MonitorConfig::resolve(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let notifier = match Notifier::new(config.notify_user.as_deref(), config.webhook_url.clone())
        .await
    {
        Ok(notifier) => notifier,
        Err(e) => {
            error!("Cannot set up notifications: {e}");
            std::process::exit(1);
        }
    };
    let sink = AlertSink::new(notifier);

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    if let Err(e) = netwatch::monitor::run(&config, &sink, token).await {
        error!("Monitor terminated: {e}");
        std::process::exit(1);
    }
}
