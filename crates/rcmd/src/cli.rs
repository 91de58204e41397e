//! Command-line arguments

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use rcmd_core::{HOST_DELIMITER, RawParams};

use crate::settings::Settings;

/// Run one command on many hosts over SSH
#[derive(Parser, Debug)]
#[command(name = "rcmd", version, about, long_about = None)]
pub struct Cli {
    /// List of hosts (comma separated)
    #[arg(short = 'H', long)]
    pub hosts: Option<String>,

    /// Path to PEM/OpenSSH private key
    #[arg(short, long)]
    pub key: Option<PathBuf>,

    /// Remote username
    #[arg(short, long)]
    pub user: Option<String>,

    /// Command to run
    #[arg(short, long)]
    pub command: Option<String>,

    /// Connect timeout in seconds [default: 30]
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// SSH port [default: 22]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Show host address on every line [default: true]
    #[arg(
        long = "show-ip",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub show_ip: Option<bool>,

    /// Settings file with defaults for the options above
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Merge flags over settings file values
    ///
    /// The command only ever comes from the command line.
    pub fn into_raw(self, settings: Settings) -> RawParams {
        let file_hosts = settings
            .hosts
            .map(|hosts| hosts.join(&HOST_DELIMITER.to_string()));

        RawParams {
            hosts: self.hosts.or(file_hosts),
            key_path: self.key.or(settings.key),
            user: self.user.or(settings.user),
            command: self.command,
            timeout: self.timeout.or(settings.timeout),
            port: self.port.or(settings.port),
            show_host_label: self.show_ip.or(settings.show_ip),
        }
    }
}
