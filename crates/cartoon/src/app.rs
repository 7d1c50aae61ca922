//! Application entry point and dispatch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{info, warn};

use cartoon_cli::presenter::{CLIReportPresenter, JsonReportPresenter};
use cartoon_cli::progress::ProgressBarObserver;
use cartoon_core::cancel::CancellationToken;
use cartoon_core::cartoon::CartoonFactory;
use cartoon_core::constants::exit_codes;
use cartoon_core::engine::TimerEngine;
use cartoon_core::random::{FixedRandom, RandomSource, ThreadRandom};
use cartoon_orchestration::controller::PoolController;
use cartoon_orchestration::interfaces::ReportPresenter;
use cartoon_timer::{TimerConfig, TimerService};

use crate::config::AppConfig;
use crate::errors::handle_error;

/// Upper bound on how often the pool is polled for retirement.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the application and return its exit code.
pub fn run(config: &AppConfig) -> Result<i32> {
    // Handle shell completion
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        cartoon_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(exit_codes::SUCCESS);
    }

    run_pool(config)
}

fn run_pool(config: &AppConfig) -> Result<i32> {
    let opts = config.options().validate()?;
    info!(
        version = %crate::version::full_version(),
        capacity = opts.capacity,
        max_fires = opts.max_fires,
        deterministic = config.deterministic,
        "starting"
    );

    let random: Arc<dyn RandomSource> = if config.deterministic {
        Arc::new(FixedRandom::minimum())
    } else {
        Arc::new(ThreadRandom)
    };

    let timer = Arc::new(TimerService::with_config(TimerConfig {
        max_timers: opts.capacity,
        ..TimerConfig::default()
    })?);
    let cache = Arc::new(
        CartoonFactory::new(Arc::clone(&random), opts.max_fires).into_cache(opts.capacity),
    );
    let engine = TimerEngine::new(timer.clone(), random, &opts);

    let started = Instant::now();
    let pool = PoolController::start(cache.clone(), engine, opts.capacity)?;

    // Set up Ctrl+C handler
    let cancel = CancellationToken::new();
    ctrlc_handler(cancel.clone());

    let observer = ProgressBarObserver::new(pool.len(), config.quiet || config.json);
    let poll = opts.time_unit.min(MAX_POLL_INTERVAL);
    let outcome = pool.wait_until_retired(&cancel, Some(config.timeout), poll, &observer);

    let report = pool.stop();
    timer.shutdown();

    let stats = cache.stats();
    let timer_stats = timer.stats();
    info!(
        constructed = stats.constructed,
        reused = stats.reused(),
        released = stats.released,
        fired = timer_stats.fired,
        cancelled = timer_stats.cancelled,
        "pool torn down"
    );

    let presenter: Box<dyn ReportPresenter> = if config.json {
        Box::new(JsonReportPresenter)
    } else {
        Box::new(CLIReportPresenter::new(config.verbose, config.quiet))
    };
    presenter.present_report(&report, started.elapsed());

    match outcome {
        Ok(()) => Ok(exit_codes::SUCCESS),
        Err(err) => {
            presenter.present_error(&err.to_string());
            Ok(handle_error(&err))
        }
    }
}

fn ctrlc_handler(cancel: CancellationToken) {
    if let Err(err) = ctrlc::set_handler(move || {
        cancel.cancel();
    }) {
        warn!(error = %err, "could not install Ctrl+C handler");
    }
}
