/*
[INPUT]:  Symbol to watch (BTCUSDT)
[OUTPUT]: Mark price and funding rate, resubscribing after connection loss
[POS]:    Examples - futures market streams
[UPDATE]: When the futures stream catalogue changes
*/

use std::time::Duration;

use binance_adapter::futures::{MarkPriceEvent, MarkPriceRate};
use binance_adapter::*;
use tracing_subscriber::EnvFilter;

/// Example: callback handler with a reconnect loop driven by `Done`
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let ctx = CancellationToken::new();
    let shutdown = ctx.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown.cancel();
    });

    let streams = FuturesStreams::new();
    while !ctx.is_cancelled() {
        let handler = handler_fn(
            |event: MarkPriceEvent| {
                println!(
                    "{} mark={} funding={}",
                    event.symbol, event.mark_price, event.funding_rate
                );
            },
            |e: WsError| eprintln!("Stream error: {}", e),
        );

        match streams
            .mark_price(&ctx, "BTCUSDT", MarkPriceRate::Secs1, handler)
            .await
        {
            Ok(subscription) => subscription.wait().await,
            Err(e) => eprintln!("Failed to subscribe: {}", e),
        }

        tokio::select! {
            _ = ctx.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
        }
    }
}
