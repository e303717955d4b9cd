// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use calsync_core::{CheckResult, ReconcileMode, ReconciledDelta, SyncKind};
use clap::{ArgMatches, Command, arg};
use colored::Colorize;

use crate::engine::Engine;

#[derive(Debug, Clone, Copy)]
pub struct CmdPull {
    pub kind: Option<SyncKind>,
    pub full: bool,
}

impl CmdPull {
    pub const NAME: &str = "pull";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Reconcile remote changes into the local store")
            .arg(
                arg!([KIND] "Only reconcile this kind: tag, todo or schedule")
                    .value_parser(|s: &str| s.parse::<SyncKind>()),
            )
            .arg(arg!(--full "Ignore the stored cursor and ask for the complete set"))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            kind: matches.get_one::<SyncKind>("KIND").copied(),
            full: matches.get_flag("full"),
        }
    }

    pub async fn run(self, engine: &Engine) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "pulling remote changes...");
        let reconciler = engine.reconciler()?;
        let mode = if self.full {
            ReconcileMode::Full
        } else {
            ReconcileMode::Incremental
        };

        let deltas = match self.kind {
            Some(kind) => vec![reconciler.reconcile(kind, mode).await?],
            None => reconciler.reconcile_all(mode).await?,
        };
        for delta in &deltas {
            print_delta(delta);
        }
        Ok(())
    }
}

fn print_delta(delta: &ReconciledDelta) {
    let verdict = match delta.check_result() {
        CheckResult::NoChangeNeeded => "up to date".italic(),
        CheckResult::DeltaAvailable => "delta".green(),
        CheckResult::FullResyncRequired => "full resync".yellow(),
    };
    let (upserted, deleted) = delta.applied();
    println!(
        " {} {}: {verdict}, {upserted} upserted, {deleted} deleted",
        "►".green(),
        delta.kind()
    );
}
