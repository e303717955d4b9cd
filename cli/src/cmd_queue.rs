// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::time::Duration;

use calsync_core::{DataKind, PendingQueueStore, PendingTask};
use clap::{ArgMatches, Command, arg};
use colored::Colorize;

use crate::engine::Engine;

const PASS_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct CmdEnqueue {
    pub kind: DataKind,
    pub id: String,
    pub remove: bool,
}

impl CmdEnqueue {
    pub const NAME: &str = "enqueue";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Append an upload task to the durable queue")
            .arg(
                arg!(<KIND> "Data kind of the entity")
                    .long_help(
                        "Data kind of the entity: tag, todo, schedule, event_detail, done_todo \
or done_todo_detail",
                    )
                    .value_parser(|s: &str| s.parse::<DataKind>()),
            )
            .arg(arg!(<ID> "Identifier of the entity"))
            .arg(arg!(-r --remove "Delete the entity remotely instead of pushing it"))
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let kind = matches
            .get_one::<DataKind>("KIND")
            .copied()
            .ok_or("Missing data kind")?;
        let id = matches
            .get_one::<String>("ID")
            .cloned()
            .ok_or("Missing entity id")?;
        Ok(Self {
            kind,
            id,
            remove: matches.get_flag("remove"),
        })
    }

    pub async fn run(self, engine: &Engine) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "enqueueing task...");
        let task = if self.remove {
            PendingTask::removal(self.kind, self.id)
        } else {
            PendingTask::push(self.kind, self.id)
        };
        let label = if task.is_removal { "remove" } else { "push" };
        let line = format!("{label} {} {}", task.data_kind, task.target_id);

        engine.db().pending_tasks.push_task(task).await?;
        println!("{} {line}", "Queued".green());
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CmdPush;

impl CmdPush {
    pub const NAME: &str = "push";

    pub fn command() -> Command {
        Command::new(Self::NAME).about("Attempt every queued task once against the remote")
    }

    pub fn from(_matches: &ArgMatches) -> Self {
        Self
    }

    pub async fn run(self, engine: &Engine) -> Result<(), Box<dyn Error>> {
        tracing::debug!("draining upload queue...");
        let drain = engine.drain_loop()?;
        let before = drain.pending_len().await?;
        if before == 0 {
            println!("{}", "Nothing to push".italic());
            return Ok(());
        }

        // one pass: stop once every task queued at start was attempted
        drain.resume().await;
        loop {
            if drain.stats().attempts() >= before as u64 {
                break;
            }
            tokio::select! {
                _ = drain.wait_until_idle() => break,
                _ = tokio::time::sleep(PASS_POLL_INTERVAL) => {}
            }
        }
        drain.pause().await;
        drain.wait_until_stopped().await;

        let stats = drain.stats();
        println!(
            "{} {} delivered, {} rescheduled, {} dropped, {} dead-lettered",
            "Pushed".green(),
            stats.delivered,
            stats.rescheduled,
            stats.dropped,
            stats.quarantined
        );
        let left = drain.pending_len().await?;
        if left > 0 {
            println!("{left} task(s) left in the queue for the next push");
        }
        if stats.quarantined > 0 {
            println!(
                "{} run `calsync status` to inspect and `calsync release` to retry",
                "Hint:".yellow()
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CmdRelease;

impl CmdRelease {
    pub const NAME: &str = "release";

    pub fn command() -> Command {
        Command::new(Self::NAME).about("Move dead-lettered tasks back into the queue")
    }

    pub fn from(_matches: &ArgMatches) -> Self {
        Self
    }

    pub async fn run(self, engine: &Engine) -> Result<(), Box<dyn Error>> {
        let released = engine.db().pending_tasks.release_quarantined().await?;
        println!("{} {released} task(s)", "Released".green());
        Ok(())
    }
}
