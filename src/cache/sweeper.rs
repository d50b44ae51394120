use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::cache::token_store::StoreInner;

/// Background expiry loop owned by one token store.
///
/// Holds only a weak reference, so dropping every store handle ends the
/// loop on its next tick even without an explicit stop.
pub(crate) struct Sweeper {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub(crate) fn spawn<V>(store: Weak<StoreInner<V>>, period: Duration) -> Self
    where
        V: Send + Sync + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    // Err means the sender is gone, which is a stop as well.
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        let Some(store) = store.upgrade() else { break };
                        store.sweep_expired().await;
                    }
                }
            }
            debug!("sweep loop finished");
        });

        Self { stop_tx, handle }
    }

    /// Signal the loop and wait until it has exited.
    pub(crate) async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(err) = self.handle.await {
            warn!("sweep loop ended abnormally: {}", err);
        }
    }
}
