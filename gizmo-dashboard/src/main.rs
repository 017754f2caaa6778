//! Gizmo dashboard
//!
//! Hosts the demo node graph (incrementer, adder, doubler) and serves a
//! browser dashboard with one card per node.

mod config;
mod constants;
mod error;
mod host;
mod presentation;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gizmo_engine::NodeRegistry;
use gizmo_nodes::{build_demo_graph, Incrementer};

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::host::{EngineHost, LoggingEventSink};
use crate::presentation::SpinnerStyle;
use crate::server::AppState;

/// Reactive node dashboard
#[derive(Parser, Debug)]
#[command(name = "gizmo-dashboard")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, default_value = "dashboard.json")]
    config: PathBuf,

    /// Address to listen on (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,

    /// Loading spinner style (overrides the config file)
    #[arg(long, value_enum)]
    spinner: Option<SpinnerStyle>,

    /// Simulated computation time in milliseconds (overrides the config file)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Fire `a.run` once at startup
    #[arg(long)]
    trigger_on_start: bool,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut DashboardConfig) {
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        if let Some(spinner) = self.spinner {
            config.loading_spinner = spinner;
        }
        if let Some(delay) = self.delay_ms {
            config.compute_delay_ms = delay;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), DashboardError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Gizmo dashboard starting...");

    let cli = Cli::parse();
    let mut config = DashboardConfig::load(&cli.config).await?;
    cli.apply(&mut config);

    if cli.save_config {
        return Ok(config.save(&cli.config).await?);
    }

    let demo = build_demo_graph(Arc::new(LoggingEventSink), config.compute_delay())?;
    let demo_a = demo.graph.node_name(demo.a)?.to_string();
    let (engine, engine_thread) = EngineHost::spawn(demo.graph)?;

    if cli.trigger_on_start {
        engine.trigger(&demo_a, Incrementer::ATTR_RUN).await?;
    }

    let state = AppState {
        engine: engine.clone(),
        presentation: Arc::new(config.presentation()),
        registry: Arc::new(NodeRegistry::with_builtins()),
    };
    let (_addr, server) = server::start_server(&config.bind_address, state).await?;

    tokio::select! {
        _ = server => log::warn!("HTTP server exited"),
        result = tokio::signal::ctrl_c() => {
            result?;
            log::info!("Shutting down");
        }
    }

    if engine.is_busy() {
        log::info!("Waiting for the running computation to finish");
    }
    engine.shutdown();
    // A computation in progress finishes before the engine thread exits
    if tokio::task::spawn_blocking(move || engine_thread.join())
        .await
        .map_or(true, |joined| joined.is_err())
    {
        log::error!("Engine thread panicked");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "gizmo-dashboard",
            "--bind",
            "0.0.0.0:9000",
            "--spinner",
            "dots",
            "--delay-ms",
            "10",
        ]);
        let mut config = DashboardConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.loading_spinner, SpinnerStyle::Dots);
        assert_eq!(config.compute_delay_ms, 10);
        assert!(!cli.trigger_on_start);
    }

    #[test]
    fn test_cli_defaults_leave_config_alone() {
        let cli = Cli::parse_from(["gizmo-dashboard"]);
        let mut config = DashboardConfig::default();
        cli.apply(&mut config);

        assert_eq!(config, DashboardConfig::default());
        assert_eq!(cli.config, PathBuf::from("dashboard.json"));
    }
}
