//! Roost Node
//!
//! Runs a node monitor driven by JSON lines on stdin, standing in for the
//! transport layer:
//!
//! ```text
//! {"type":"submit","spec":{"request_id":"r1","task_id":"0","user":{"user":"alice","priority":1}}}
//! {"type":"complete","request_id":"r1","last_task_request_id":"r1","last_task_id":"0"}
//! ```
//!
//! Submission outcomes and launched tasks are written to stdout as JSON lines.
//! Logs go to stderr.

use anyhow::{Context, Result};
use roost_core::dto::reservation::NodeCommand;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roost_node::config::Config;
use roost_node::launcher::{ChannelLauncher, RunnableTasks};
use roost_node::scheduler::build_scheduler;
use roost_node::service::NodeMonitor;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roost_node=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Roost node");

    let config = load_config()?;
    info!(
        "Loaded configuration: node_id={}, max_active_tasks={}, policy={}",
        config.node_id, config.max_active_tasks, config.policy
    );

    let (launcher, runnable) = ChannelLauncher::new();
    let scheduler = build_scheduler(config.policy, config.max_active_tasks, Arc::new(launcher));
    let monitor = NodeMonitor::new(config.node_id.clone(), scheduler);

    let executor = tokio::spawn(report_launches(runnable));

    let result = read_commands(&monitor).await;

    match monitor.snapshot() {
        Ok(snapshot) => info!(
            "Final state: {} of {} task slots filled ({} free), {} reservations queued",
            snapshot.active_tasks,
            snapshot.max_active_tasks,
            snapshot.free_slots(),
            snapshot.queued_reservations
        ),
        Err(e) => warn!("Could not read final scheduler state: {:#}", e),
    }

    // Dropping the monitor drops the last launcher, which ends the executor loop.
    drop(monitor);
    if let Err(e) = executor.await {
        warn!("Executor loop panicked: {}", e);
    }

    if let Err(e) = &result {
        error!("Node stopped on a fatal fault: {:#}", e);
    } else {
        info!("Input closed, shutting down");
    }
    result
}

/// Loads configuration from the environment
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}

/// Applies commands from stdin until it closes or the scheduler faults
async fn read_commands(monitor: &NodeMonitor) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command: NodeCommand = match serde_json::from_str(line) {
            Ok(command) => command,
            Err(e) => {
                warn!("Ignoring malformed command: {}", e);
                continue;
            }
        };

        if let Some(outcome) = monitor.handle(command)? {
            println!("{}", json!({ "event": "submitted", "outcome": outcome }));
        }
    }

    Ok(())
}

/// Stands in for the executor: reports every task the scheduler launches
async fn report_launches(mut runnable: RunnableTasks) {
    while let Some(task) = runnable.next_task().await {
        println!("{}", json!({ "event": "launched", "task": task }));
    }
}
