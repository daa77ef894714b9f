mod args;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use fanout_core::{CancelContext, LineSource, StatKind, Stats, StatsSink};
use fanout_executor::{CancelableLines, WorkerPool};
use fanout_observability::LogFormat;
use fanout_storage::{CommandParser, WorkerResources};

use crate::args::{Cli, Input};

enum Feed {
    Command(String),
    Lines(Box<dyn LineSource>),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    fanout_observability::init(if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let stats = Arc::new(Stats::new());
    let sink: Arc<dyn StatsSink> = stats.clone();
    let cancel = CancelContext::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            interrupt.cancel();
        }
    });

    // open the input before spawning workers so a bad path fails fast
    let feed = match cli.input() {
        Input::Command(line) => Feed::Command(line),
        Input::Stdin => Feed::Lines(Box::new(CancelableLines::stdin(cancel.clone()))),
        Input::File(path) => Feed::Lines(Box::new(
            CancelableLines::open(&path, cancel.clone())
                .await
                .with_context(|| format!("failed to open {}", path.display()))?,
        )),
    };

    let pool = WorkerPool::new(
        cli.pool_config(),
        sink.clone(),
        cancel.clone(),
        WorkerResources::factory(cli.store_root.clone(), sink),
    )
    .context("failed to start worker pool")?;

    let started = Instant::now();
    match feed {
        Feed::Command(line) => pool.run_cmd(&line, &CommandParser).await,
        Feed::Lines(mut source) => pool.run(&mut *source, &CommandParser).await,
    }
    stats.log_summary(started.elapsed());

    Ok(if stats.get(StatKind::Fail) > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
