//! Background refresh aligned to the publisher's cadence.

use super::MarketManager;
use crate::core::config::ScheduleConfig;
use chrono::{DateTime, Days, NaiveTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    pub interval_hours: u32,
    pub offset_minutes: u32,
}

impl From<&ScheduleConfig> for RefreshSchedule {
    fn from(config: &ScheduleConfig) -> Self {
        Self {
            interval_hours: config.interval_hours,
            offset_minutes: config.offset_minutes,
        }
    }
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self::from(&ScheduleConfig::default())
    }
}

/// First slot strictly after `now`. Slots are `offset` minutes past every
/// `interval`-th hour counted from midnight UTC.
pub fn next_refresh_slot(now: DateTime<Utc>, schedule: &RefreshSchedule) -> DateTime<Utc> {
    let interval = i64::from(schedule.interval_hours.clamp(1, 24));
    let offset = TimeDelta::minutes(i64::from(schedule.offset_minutes.min(59)));
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();

    let mut hour = 0;
    while hour < 24 {
        let slot = midnight + TimeDelta::hours(hour) + offset;
        if slot > now {
            return slot;
        }
        hour += interval;
    }

    // No slot left today
    let tomorrow = midnight
        .checked_add_days(Days::new(1))
        .unwrap_or(midnight + TimeDelta::days(1));
    tomorrow + offset
}

pub fn delay_until_next_slot(now: DateTime<Utc>, schedule: &RefreshSchedule) -> Duration {
    (next_refresh_slot(now, schedule) - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Handle to the background refresh loop. Dropping it leaves the loop running;
/// call [`Scheduler::stop`] to end it.
pub struct Scheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn start(manager: Arc<MarketManager>, schedule: RefreshSchedule) -> Self {
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let delay = delay_until_next_slot(now, &schedule);
                info!(
                    next = %next_refresh_slot(now, &schedule),
                    "Next scheduled refresh"
                );

                tokio::select! {
                    biased;
                    _ = loop_cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }

                manager.refresh().await;
            }
            debug!("Refresh loop stopped");
        });

        Self { cancel, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancels the loop and waits for it to exit. A refresh already in
    /// flight is allowed to finish first.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            debug!(error = %e, "Refresh loop ended abnormally");
        }
    }
}
