use clap::{Arg, ArgAction, Command};
use tracing::{error, info};
use trip_sync::config::AppConfig;
use trip_sync::pipeline::{self, RunOutcome};
use trip_sync::schedule::RunSchedule;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("trip_sync")
        .arg(
            Arg::new("once")
                .long("once")
                .help("Run a single sync and exit instead of scheduling")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    // Configuration problems are fatal before any run is attempted.
    let cfg = AppConfig::from_env()?;

    if matches.get_flag("once") {
        let outcome = pipeline::run(&cfg).await?;
        log_outcome(&outcome);
        return Ok(());
    }

    let schedule = RunSchedule::new(&cfg.schedule, cfg.schedule_tz)?;
    info!(schedule = %cfg.schedule, tz = %cfg.schedule_tz, "scheduler started");

    if cfg.run_on_start {
        run_and_log(&cfg).await;
    }

    // Runs never overlap: the next tick is computed only after the current
    // run finishes, so ticks that fire mid-run are dropped.
    loop {
        let Some(tick) = schedule.wait_next().await else {
            anyhow::bail!("schedule `{}` has no future occurrences", cfg.schedule);
        };
        info!(tick = %tick, "scheduled run starting");
        run_and_log(&cfg).await;
    }
}

/// A failed run must not take the scheduler down with it.
async fn run_and_log(cfg: &AppConfig) {
    match pipeline::run(cfg).await {
        Ok(outcome) => log_outcome(&outcome),
        Err(err) => error!(error = %err, "run failed"),
    }
}

fn log_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::NotFound { file } => info!(file = %file, "no export to process"),
        RunOutcome::Delivered { file, rows, report } => info!(
            file = %file,
            rows = *rows,
            written = report.written,
            skipped = report.skipped,
            batches = report.batches,
            "sync complete"
        ),
    }
}
