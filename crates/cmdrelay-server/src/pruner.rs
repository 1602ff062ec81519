//! Background age pruning of the command log.
//!
//! The pruner wakes on a fixed interval, drops records older than the
//! retention period and exits as soon as the shutdown channel flips to `true`.

use chrono::Utc;
use cmdrelay_core::CommandRelay;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Spawn the prune loop on the current runtime
pub fn spawn_pruner(
    relay: Arc<CommandRelay>,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run_pruner(relay, interval, shutdown_rx))
}

async fn run_pruner(
    relay: Arc<CommandRelay>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    info!(interval_secs = interval.as_secs(), "Pruner started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                let removed = relay.prune(Utc::now());
                if removed > 0 {
                    info!(removed, remaining = relay.stats().commands, "Pruned expired commands");
                } else {
                    debug!("Prune cycle found nothing to remove");
                }
            }
            changed = shutdown_rx.changed() => {
                // Sender dropped counts as shutdown
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!("Pruner stopped");
}
