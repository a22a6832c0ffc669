/*
[INPUT]:  None (public endpoints only)
[OUTPUT]: Asset count and the latest listing announcements
[POS]:    Examples - public REST queries
[UPDATE]: When adding new public endpoints
*/

use binance_adapter::*;
use tracing_subscriber::EnvFilter;

/// Example: query public web endpoints (no API key required)
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let client = match BinanceClient::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    match client.get_all_assets().await {
        Ok(assets) => println!("{} assets listed", assets.data.len()),
        Err(e) => eprintln!("get_all_assets failed: {} (retryable: {})", e, e.is_retryable()),
    }

    match client.get_announcements().await {
        Ok(response) => {
            for article in response.articles() {
                println!("[{}] {}", article.release_date, article.title);
            }
        }
        Err(e) => eprintln!("get_announcements failed: {}", e),
    }
}
