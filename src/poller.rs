//! Periodic telemetry polling.
//!
//! The loop ticks every `min(realtime_secs, other_secs)`. Real-time data and
//! status are read on cycles that are a multiple of the real-time interval,
//! rated data, settings and statistics on multiples of the other interval.
//! Cycle 0 reads everything. Reads run on the blocking pool and go through
//! the shared [`SerialLine`].

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::telemetry::{read_snapshot, BlockSelection, TelemetrySnapshot};
use crate::transport::{DeviceTransport, SerialLine};

pub struct TelemetryPoller<T> {
    line: SerialLine<T>,
    config: BridgeConfig,
}

/// Cycles between reads of a block polled every `secs`, for a loop ticking
/// every `tick` seconds.
fn cycles_between(secs: u64, tick: u64) -> u64 {
    secs.div_ceil(tick.max(1)).max(1)
}

impl<T: DeviceTransport + 'static> TelemetryPoller<T> {
    pub fn new(line: SerialLine<T>, config: BridgeConfig) -> Self {
        Self { line, config }
    }

    /// Blocks to read on cycle `n`.
    #[must_use]
    pub fn selection_for_cycle(&self, n: u64) -> BlockSelection {
        let tick = self.config.tick_secs();
        BlockSelection {
            realtime: n % cycles_between(self.config.poll.realtime_secs, tick) == 0,
            other: n % cycles_between(self.config.poll.other_secs, tick) == 0,
        }
    }

    /// Read one snapshot now.
    pub async fn poll_once(&self, which: BlockSelection) -> Result<TelemetrySnapshot, BridgeError> {
        let line = self.line.clone();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || line.with(|t| read_snapshot(t, &config, which)))
            .await
            .map_err(|e| BridgeError::Worker(format!("telemetry read: {e}")))
    }

    /// Poll until `shutdown` turns true (or its sender is dropped) or `tx`'s
    /// receiver goes away. Returns the number of snapshots sent.
    pub async fn run(
        self,
        tx: mpsc::Sender<TelemetrySnapshot>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<u64, BridgeError> {
        let tick = Duration::from_secs(self.config.tick_secs());
        log::info!(
            "polling {} every {tick:?} (real-time {}s, other {}s)",
            self.config.publish_topic(),
            self.config.poll.realtime_secs,
            self.config.poll.other_secs
        );
        let mut ticker = interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycle: u64 = 0;
        let mut sent: u64 = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let which = self.selection_for_cycle(cycle);
            cycle += 1;
            if !which.realtime && !which.other {
                continue;
            }
            let snapshot = self.poll_once(which).await?;
            if snapshot.is_empty() {
                log::warn!("poll cycle {} read nothing", cycle - 1);
            }
            if tx.send(snapshot).await.is_err() {
                log::debug!("snapshot receiver dropped");
                break;
            }
            sent += 1;
        }
        log::info!("poller stopped after {sent} snapshots");
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDevice;

    #[test]
    fn cycle_selection_follows_intervals() {
        let mut config = BridgeConfig::default();
        config.poll.realtime_secs = 5;
        config.poll.other_secs = 12;
        let p = TelemetryPoller::new(SerialLine::new(MockDevice::new()), config);
        // tick 5s, other every ceil(12/5) = 3 cycles
        assert_eq!(p.selection_for_cycle(0), BlockSelection::ALL);
        assert_eq!(p.selection_for_cycle(1), BlockSelection::REALTIME_ONLY);
        assert_eq!(p.selection_for_cycle(3), BlockSelection::ALL);
    }

    #[test]
    fn cycles_between_never_zero() {
        assert_eq!(cycles_between(0, 5), 1);
        assert_eq!(cycles_between(10, 5), 2);
        assert_eq!(cycles_between(11, 5), 3);
    }
}
