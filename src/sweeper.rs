use crate::{access::AccessController, elapsed::Elapsed};
use std::time::Duration;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Periodically purge expired records until `shutdown` is cancelled.
///
/// The first sweep runs immediately.
pub fn spawn_expiry_sweeper(
    access: AccessController,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Expiry sweeper stopped");
                    return;
                }
                _ = interval.tick() => {
                    debug!("Running check to find expired records");
                    let _elapsed = Elapsed::start("Expiry sweep");
                    let removed = access.sweep_expired();
                    if removed > 0 {
                        info!("{removed} expired record(s) purged from storage");
                    }
                }
            }
        }
    })
}
