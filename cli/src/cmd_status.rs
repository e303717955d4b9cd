// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use calsync_core::{PendingQueueStore, PendingTask, SyncCursorStore, SyncKind};
use clap::{ArgMatches, Command};
use colored::Colorize;

use crate::engine::Engine;

#[derive(Debug, Default, Clone, Copy)]
pub struct CmdStatus;

impl CmdStatus {
    pub const NAME: &str = "status";

    pub fn command() -> Command {
        Command::new(Self::NAME).about("Show queued and dead-lettered tasks and the sync cursors")
    }

    pub fn from(_matches: &ArgMatches) -> Self {
        Self
    }

    pub async fn run(self, engine: &Engine) -> Result<(), Box<dyn Error>> {
        tracing::debug!("collecting status...");
        let db = engine.db();

        println!("📤 {}", "Queued".bold());
        print_tasks(&db.pending_tasks.list().await?, "Queue is empty");
        println!();

        println!("☠️ {}", "Dead-lettered".bold());
        print_tasks(&db.pending_tasks.quarantined().await?, "No dead-lettered tasks");
        println!();

        println!("🔄 {}", "Cursors".bold());
        for kind in SyncKind::ALL {
            match db.sync_cursors.load(kind).await? {
                Some(cursor) => println!(" {} {kind}: {}", "►".green(), cursor.timestamp_value),
                None => println!(" {} {kind}: {}", "►".green(), "never synced".italic()),
            }
        }
        Ok(())
    }
}

fn print_tasks(tasks: &[PendingTask], empty: &str) {
    if tasks.is_empty() {
        println!("{}", empty.italic());
        return;
    }

    for task in tasks {
        let op = if task.is_removal {
            "remove".red()
        } else {
            "push".green()
        };
        let failures = match task.failure_count {
            0 => String::new(),
            n => format!(" ({n} failed)").yellow().to_string(),
        };
        println!(
            " {op} {} {} @ {}{failures}",
            task.data_kind, task.target_id, task.scheduled_at
        );
    }
}
