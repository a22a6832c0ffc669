/*
[INPUT]:  Live connection handle, keepalive policy, last-pong timestamps from the read loop
[OUTPUT]: Periodic ping probes; forced close when the peer goes silent
[POS]:    WebSocket layer - liveness monitor for half-open connection detection
[UPDATE]: When changing probe cadence or timeout semantics
*/

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::KeepAlive;
use super::connection::{CloseReason, ConnectionHandle};

/// Probes the peer every `timeout / 2` until the connection closes.
///
/// Closing the handle is enough to end the read loop, which then runs its
/// normal exit path and reports the close reason.
pub(crate) async fn monitor(
    ctx: CancellationToken,
    conn: Arc<ConnectionHandle>,
    keepalive: KeepAlive,
    last_pong: watch::Receiver<Instant>,
) {
    let probe_interval = keepalive.probe_interval();
    let mut ticker = interval_at(Instant::now() + probe_interval, probe_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ctx.cancelled() => {
                info!("keepalive: context done");
                conn.close(CloseReason::Cancelled);
                return;
            }
            _ = conn.signal().closed() => {
                debug!("keepalive: connection closed");
                return;
            }
            _ = ticker.tick() => {
                let elapsed = last_pong.borrow().elapsed();
                if elapsed > keepalive.timeout {
                    warn!(elapsed = ?elapsed, timeout = ?keepalive.timeout, "keepalive: pong timeout");
                    conn.close(CloseReason::KeepAliveTimeout { elapsed });
                    return;
                }

                if let Err(err) = conn.send(Message::Ping(Default::default())).await {
                    warn!(error = %err, "keepalive: ping failed");
                    conn.close(CloseReason::PingFailed(err.to_string()));
                    return;
                }
            }
        }
    }
}
