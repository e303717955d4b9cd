// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf};

use calsync_core::APP_NAME;
use clap::{ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser};
use colored::Colorize;
use futures::{FutureExt, future::BoxFuture};
use tracing_subscriber::EnvFilter;

use crate::cmd_pull::CmdPull;
use crate::cmd_queue::{CmdEnqueue, CmdPush, CmdRelease};
use crate::cmd_status::CmdStatus;
use crate::config::load_settings;
use crate::engine::Engine;

/// Run the calsync command-line interface.
pub async fn run() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse() {
        Ok(cli) => {
            if let Err(e) = cli.run().await {
                println!("{} {}", "Error:".red(), e);
            }
        }
        Err(e) => println!("{} {}", "Error:".red(), e),
    };
    Ok(())
}

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// The command to execute
    pub command: Commands,
}

impl Cli {
    /// Create the command-line interface
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Offline-first upload queue and incremental sync for calendar data.")
            .version(crate_version!())
            .styles(STYLES)
            .subcommand_required(false) // allow default to status
            .arg_required_else_help(false)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $XDG_CONFIG_HOME/calsync/config.toml on Linux and MacOS, \
%LOCALAPPDATA%/calsync/config.toml on Windows.",
                    )
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .subcommand(CmdStatus::command())
            .subcommand(CmdEnqueue::command())
            .subcommand(CmdPush::command())
            .subcommand(CmdPull::command())
            .subcommand(CmdRelease::command())
    }

    /// Parse the command-line arguments
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let commands = Self::command();
        let matches = commands.get_matches();
        Self::from(&matches)
    }

    /// Parse the specified arguments
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, Box<dyn Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let commands = Self::command();
        let matches = commands.try_get_matches_from(args)?;
        Self::from(&matches)
    }

    /// Create a CLI instance from the `ArgMatches`
    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        use Commands::*;
        let command = match matches.subcommand() {
            Some((CmdStatus::NAME, matches)) => Status(CmdStatus::from(matches)),
            Some((CmdEnqueue::NAME, matches)) => Enqueue(CmdEnqueue::from(matches)?),
            Some((CmdPush::NAME, matches)) => Push(CmdPush::from(matches)),
            Some((CmdPull::NAME, matches)) => Pull(CmdPull::from(matches)),
            Some((CmdRelease::NAME, matches)) => Release(CmdRelease::from(matches)),
            None => Status(CmdStatus),
            _ => unreachable!(),
        };

        let config = matches.get_one("config").cloned();
        Ok(Cli { config, command })
    }

    /// Run the command
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        self.command.run(self.config).await
    }
}

/// The commands available in the CLI
#[derive(Debug, Clone)]
pub enum Commands {
    /// Show queued, dead-lettered and cursor state
    Status(CmdStatus),

    /// Append a task to the upload queue
    Enqueue(CmdEnqueue),

    /// Drain the upload queue against the remote
    Push(CmdPush),

    /// Reconcile remote changes into the local store
    Pull(CmdPull),

    /// Move dead-lettered tasks back into the queue
    Release(CmdRelease),
}

impl Commands {
    /// Run the command with the given configuration
    #[rustfmt::skip]
    pub async fn run(self, config: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
        use Commands::*;
        match self {
            Status(a)  => Self::run_with(config, |x| a.run(x).boxed()).await,
            Enqueue(a) => Self::run_with(config, |x| a.run(x).boxed()).await,
            Push(a)    => Self::run_with(config, |x| a.run(x).boxed()).await,
            Pull(a)    => Self::run_with(config, |x| a.run(x).boxed()).await,
            Release(a) => Self::run_with(config, |x| a.run(x).boxed()).await,
        }
    }

    async fn run_with<F>(config: Option<PathBuf>, f: F) -> Result<(), Box<dyn Error>>
    where
        F: for<'a> FnOnce(&'a Engine) -> BoxFuture<'a, Result<(), Box<dyn Error>>>,
    {
        tracing::debug!("parsing configuration...");
        let settings = load_settings(config).await?;
        let engine = Engine::open(settings.core, settings.remote).await?;

        let result = f(&engine).await;

        engine.close().await?;
        result
    }
}
