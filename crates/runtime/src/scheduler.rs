//! Periodic topic trigger.
//!
//! The scheduler never touches the session record itself; each tick posts a
//! `ScheduledTopic` command to the session actor and waits for it to finish,
//! so a tick can never overlap an in-flight chat turn.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use tutor_config::ScheduleConfig;

use crate::controller::TopicOutcome;
use crate::SessionHandle;

pub fn spawn_topic_scheduler(
    handle: SessionHandle,
    config: &ScheduleConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let period = Duration::from_secs(config.interval_hours.max(1) * 60 * 60);
    let first_run = Instant::now() + Duration::from_secs(config.first_run_delay_secs);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(first_run, period);
        // A late tick (suspend, long backend call) shifts the cadence instead of
        // firing a burst of catch-up ticks.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_hours = period.as_secs() / 3600, "topic scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match handle.scheduled_topic().await {
                        Ok(TopicOutcome::Generated(_)) => info!("scheduled topic delivered"),
                        Ok(TopicOutcome::AlreadyToday(_)) => debug!("scheduled tick: topic already fresh"),
                        Ok(TopicOutcome::Unbound) => debug!("scheduled tick: no recipient yet"),
                        Ok(TopicOutcome::Failed(err)) => {
                            warn!(reason = err.reason(), "scheduled topic failed; waiting for next tick");
                        }
                        Err(err) => {
                            warn!(?err, "session actor unavailable; stopping topic scheduler");
                            break;
                        }
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        info!("topic scheduler stopped");
    })
}
