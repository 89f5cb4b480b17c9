use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Timelike, Utc};

use crate::relay::Relay;

/// First full hour strictly after `now`.
pub fn next_top_of_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    let into_hour = TimeDelta::minutes(now.minute().into())
        + TimeDelta::seconds(now.second().into())
        + TimeDelta::nanoseconds(now.nanosecond().into());
    now - into_hour + TimeDelta::hours(1)
}

/// Triggers a fan-out at minute 0 of every hour.
pub struct Scheduler {
    relay: Arc<Relay>,
}

impl Scheduler {
    pub fn spawn(relay: Arc<Relay>) {
        tokio::spawn(Scheduler { relay }.run());
    }

    async fn run(self) {
        log::info!("Starting scheduler");
        let mut next = next_top_of_hour(Utc::now());
        loop {
            log::debug!("Next fan-out at {next}");
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            // a slow cycle must not push back the next firing, fan_out skips overlaps
            let relay = self.relay.clone();
            tokio::spawn(async move { relay.fan_out().await });

            next = next_top_of_hour(Utc::now().max(next));
        }
    }
}
