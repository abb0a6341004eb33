// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio: merge and split PDFs and images.
//
// Entry point. Initialises logging, parses the command line and runs the
// requested save on the background saver.

mod args;
mod compose;
mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use folio_core::error::{FolioError, Result};
use folio_core::human_errors::{Severity, humanize_error};

use args::{Cli, Command};
use services::password::PromptPassword;
use services::runner::BackgroundSaver;

/// Conventional exit status for a run interrupted by the user.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("Folio starting");

    match run(cli).await {
        Ok(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => report(&err),
    }
}

async fn run(cli: Cli) -> Result<Vec<PathBuf>> {
    let saver = BackgroundSaver::new();
    match cli.command {
        Command::Merge(args) => {
            saver
                .run(move || {
                    let query = PromptPassword::new(std::io::stdin().lock());
                    compose::merge(&args, &query).map(|path| vec![path])
                })
                .await
        }
        Command::Split(args) => {
            saver
                .run(move || {
                    let query = PromptPassword::new(std::io::stdin().lock());
                    compose::split(&args, &query)
                })
                .await
        }
    }
}

fn report(err: &FolioError) -> ExitCode {
    let human = humanize_error(err);
    if human.severity == Severity::Silent {
        return ExitCode::from(EXIT_CANCELLED);
    }
    tracing::debug!(error = %err, "Save failed");
    eprintln!("error: {}", human.message);
    eprintln!("  {}", human.suggestion);
    ExitCode::FAILURE
}
