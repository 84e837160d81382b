// cli-proc-monitor - per-process CPU/memory monitor for a named CLI tool
mod cache;
mod cli;
mod commands;
mod handlers;
mod poll;
mod state;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    net::TcpListener,
    signal,
    time::{interval, Duration, MissedTickBehavior},
};
use tracing::{debug, error, info, level_filters::LevelFilter};

use cli_proc_monitor::config::{load_config, render_config, validate_effective_config, Config};
use cli_proc_monitor::settings::SettingsStore;
use cli_proc_monitor::temperature::SysfsThermal;
use cli_proc_monitor::{HistoryBuffer, ProcReader, ProcessMonitor, Sampler};

use crate::cli::{Args, Commands};
use crate::state::AppState;

/// Merges CLI flags over the config file (or defaults with `--no-config`).
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref()).map_err(|e| anyhow!("{}", e))?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(target) = &args.target {
        config.target_name = Some(target.clone());
    }
    if let Some(interval) = args.interval {
        config.sample_interval_secs = Some(interval);
    }
    if let Some(capacity) = args.history_capacity {
        config.history_capacity = Some(capacity);
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(path) = &args.settings_file {
        config.settings_file = Some(path.clone());
    }
    if let Some(level) = &args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    // Feature flags
    if args.disable_metrics {
        config.enable_metrics = Some(false);
    }
    if args.disable_health {
        config.enable_health = Some(false);
    }

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    validate_effective_config(config).map_err(|e| anyhow!("Configuration invalid: {}", e))
}

/// Initializes tracing logging subsystem with configured log level
fn setup_logging(config: &Config) -> Result<()> {
    let level = config.log_level.as_deref().unwrap_or("info");
    let filter = match level {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Logging initialized with level: {}", level);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// -------------------------------------------------------------------
/// MAIN APPLICATION ENTRY POINT
/// -------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            validate(&config)?;
            println!("✅ Configuration is valid");
            return Ok(());
        }

        let output =
            render_config(&config, args.config_format.as_str()).map_err(|e| anyhow!("{}", e))?;
        println!("{output}");
        return Ok(());
    }

    if let Some(command) = &args.command {
        let config = resolve_config(&args)?;
        validate(&config)?;

        return match command {
            Commands::Check { proc, thermal, all } => {
                commands::command_check(*proc, *thermal, *all, &config)
            }
            Commands::Config {
                output,
                format,
                commented,
            } => commands::command_config(output.clone(), format.clone(), *commented),
            Commands::Test {
                iterations,
                verbose,
                format,
            } => commands::command_test(*iterations, *verbose, format.clone(), &config),
        };
    }

    let config = resolve_config(&args)?;
    validate(&config)?;

    setup_logging(&config)?;

    info!("Starting cli-proc-monitor");

    if let Some(threads) = config.parallelism {
        if threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .unwrap_or_else(|e| error!("Failed to set rayon thread pool: {}", e));
            debug!("Rayon thread pool configured with {} threads", threads);
        }
    }

    let reader = ProcReader::new(config.proc_root());
    info!(
        "Monitoring '{}' under {} ({} ticks/s)",
        config.target_name(),
        reader.root().display(),
        reader.clock_ticks()
    );
    let monitor = ProcessMonitor::new(reader, config.target_name());
    let history = HistoryBuffer::new(config.history_capacity());
    let sampler = Arc::new(Sampler::new(monitor, history));
    let temperature = Arc::new(SysfsThermal::new(config.thermal_root()));
    let settings = SettingsStore::load(config.settings_file());
    debug!("Alert settings file: {}", settings.path().display());

    let state = Arc::new(AppState::new(
        config.clone(),
        sampler,
        temperature,
        settings,
    )?);

    poll::initial_poll(&state).await;

    // Background poller; a slow poll delays the next tick instead of bunching.
    let bg_state = state.clone();
    let period = Duration::from_secs(config.sample_interval_secs());
    let poller = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately and the initial poll already ran.
        ticker.tick().await;
        debug!("Poller started with {}s interval", period.as_secs());

        loop {
            ticker.tick().await;
            poll::scheduled_poll(&bg_state).await;
        }
    });

    let addr: SocketAddr = format!("{}:{}", config.bind(), config.port())
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.bind(), config.port()))?;

    let app = handlers::router(state.clone());

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("cli-proc-monitor listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    poller.abort();
    let _ = poller.await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("cli-proc-monitor stopped gracefully");
    Ok(())
}
