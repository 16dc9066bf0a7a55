use super::ui;
use crate::manager::{MarketManager, RefreshSchedule, Scheduler};
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Keeps the data current until Ctrl-C, printing a status line per change.
pub async fn run(manager: Arc<MarketManager>, schedule: RefreshSchedule) -> Result<()> {
    let mut updates = manager.subscribe();

    manager.bootstrap();
    let mut last_line = ui::status_line(&updates.borrow_and_update(), Utc::now());
    println!("{last_line}");

    if let Some(refresh) = manager.check_freshness_on_resume() {
        refresh.await.context("Initial refresh panicked")?;
    }
    let scheduler = Scheduler::start(Arc::clone(&manager), schedule);
    info!("Watching market data, press Ctrl-C to stop");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if state.is_loading {
                    continue;
                }
                let line = ui::status_line(&state, Utc::now());
                if line != last_line {
                    println!("{line}");
                    last_line = line;
                }
            }
        }
    }

    scheduler.stop().await;
    info!("Stopped watching");
    Ok(())
}
