// SPDX-FileCopyrightText: 2026 Calsync Developers
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line front end of the calsync engine.

mod cli;
mod cmd_pull;
mod cmd_queue;
mod cmd_status;
mod config;
mod engine;

pub use crate::cli::{Cli, Commands, run};
pub use crate::engine::Engine;
