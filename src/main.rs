// SPDX-License-Identifier: GPL-3.0-or-later
// src/main.rs
//
// Application entry point.

mod cli;

use clap::Parser;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    log::debug!("Starting photofuse {}", env!("CARGO_PKG_VERSION"));
    cli::run(args).await
}
