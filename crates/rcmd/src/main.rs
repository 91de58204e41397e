//! rcmd
//!
//! Runs one shell command on every given host over SSH and prints their
//! output as one interleaved, host-labelled stream until interrupted.

use std::sync::Arc;

use clap::{CommandFactory, Parser};
use color_eyre::Result;
use eyre::WrapErr;
use rcmd_core::{Coordinator, dispatch, interrupt_signal, output_channel};
use rcmd_exec::{RemoteConnector, SshConnector, parse_private_key, read_key_file};
use tracing::info;

mod cli;
mod logging;
mod settings;

use cli::Cli;
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(cli.verbose);

    let settings = Settings::load_default(cli.config.as_deref())?;

    let config = match cli.into_raw(settings).validate(read_key_file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", Cli::command().render_help());
            std::process::exit(1);
        }
    };

    // No host could authenticate with a bad key, so this is fatal
    let key = parse_private_key(&config.key).wrap_err("can't parse private key")?;

    let connector: Arc<dyn RemoteConnector> = Arc::new(
        SshConnector::builder(&config.user, key)
            .with_port(config.port)
            .with_timeout(config.timeout)
            .build(),
    );

    info!(hosts = config.hosts.len(), command = %config.command, "starting");

    let (tx, rx) = output_channel();
    drop(dispatch(&config, &connector, &tx));
    drop(tx);

    Coordinator::new(rx, tokio::io::stdout())
        .run(interrupt_signal())
        .await;

    std::process::exit(1);
}
