/*
[INPUT]:  Symbols to watch (BTCUSDT, ETHUSDT)
[OUTPUT]: Top-of-book snapshots printed until Ctrl+C
[POS]:    Examples - spot market streams
[UPDATE]: When the spot stream catalogue changes
*/

use binance_adapter::spot::{DepthLevels, PartialDepthEvent, UpdateSpeed};
use binance_adapter::*;
use tracing_subscriber::EnvFilter;

/// Example: combined partial-depth stream with the channel adapter
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let ctx = CancellationToken::new();
    let streams = SpotStreams::new();
    let (handler, mut rx) = channel::<PartialDepthEvent>();

    let subscription = match streams
        .combined_partial_depth(
            &ctx,
            &[("BTCUSDT", DepthLevels::Five), ("ETHUSDT", DepthLevels::Five)],
            UpdateSpeed::Ms100,
            handler,
        )
        .await
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to subscribe: {}", e);
            return;
        }
    };
    println!("Subscribed to {}", subscription.endpoint());

    let shutdown = ctx.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown.cancel();
    });

    while let Some(item) = rx.recv().await {
        match item {
            StreamItem::Event(depth) => {
                let bid = depth.bids.first().map(|level| level.price());
                let ask = depth.asks.first().map(|level| level.price());
                println!("{} bid={:?} ask={:?}", depth.symbol, bid, ask);
            }
            StreamItem::DecodeError(e) => eprintln!("Skipped frame: {}", e),
            StreamItem::Closed(e) => eprintln!("Connection lost: {}", e),
        }
    }

    subscription.wait().await;
}
