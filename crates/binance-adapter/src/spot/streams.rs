/*
[INPUT]:  Symbols, stream parameters, cancellation context and event handlers
[OUTPUT]: Running spot subscriptions built on ws::serve
[POS]:    Spot layer - market and user data stream catalogue
[UPDATE]: When adding spot streams or changing endpoint formats
*/

use std::fmt;

use tokio_util::sync::CancellationToken;

use super::events::{
    AggTradeEvent, BookTickerEvent, DiffDepthEvent, KlineEvent, MarketStatEvent,
    MiniMarketStatEvent, PartialDepthEvent, TradeEvent, UserDataEvent,
};
use crate::ws::{
    Combined, EventHandler, Flat, MessageHandler, Raw, ServeOptions, Subscription, WsConfig,
    WsError, serve,
};

pub const WS_ENDPOINT: &str = "wss://stream.binance.com:9443/ws";
pub const COMBINED_ENDPOINT: &str = "wss://stream.binance.com:9443/stream?streams=";

/// Book depth of a partial depth stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthLevels {
    Five,
    Ten,
    Twenty,
}

impl DepthLevels {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepthLevels::Five => "5",
            DepthLevels::Ten => "10",
            DepthLevels::Twenty => "20",
        }
    }
}

impl TryFrom<u32> for DepthLevels {
    type Error = WsError;

    fn try_from(levels: u32) -> Result<Self, Self::Error> {
        match levels {
            5 => Ok(DepthLevels::Five),
            10 => Ok(DepthLevels::Ten),
            20 => Ok(DepthLevels::Twenty),
            other => Err(WsError::InvalidEndpoint(format!(
                "invalid depth levels {other}, expected 5, 10 or 20"
            ))),
        }
    }
}

impl fmt::Display for DepthLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Push cadence of spot depth streams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateSpeed {
    #[default]
    Ms1000,
    Ms100,
}

impl UpdateSpeed {
    fn suffix(&self) -> &'static str {
        match self {
            UpdateSpeed::Ms1000 => "",
            UpdateSpeed::Ms100 => "@100ms",
        }
    }
}

pub fn partial_depth_stream(symbol: &str, levels: DepthLevels, speed: UpdateSpeed) -> String {
    format!("{}@depth{}{}", symbol.to_lowercase(), levels, speed.suffix())
}

pub fn diff_depth_stream(symbol: &str, speed: UpdateSpeed) -> String {
    format!("{}@depth{}", symbol.to_lowercase(), speed.suffix())
}

pub fn kline_stream(symbol: &str, interval: &str) -> String {
    format!("{}@kline_{}", symbol.to_lowercase(), interval)
}

fn named_stream(symbol: &str, name: &str) -> String {
    format!("{}@{}", symbol.to_lowercase(), name)
}

/// Spot stream catalogue over one endpoint pair and one connection policy
#[derive(Debug, Clone)]
pub struct SpotStreams {
    ws_endpoint: String,
    combined_endpoint: String,
    options: ServeOptions,
}

impl Default for SpotStreams {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotStreams {
    pub fn new() -> Self {
        Self::with_options(ServeOptions::default())
    }

    pub fn with_options(options: ServeOptions) -> Self {
        Self {
            ws_endpoint: WS_ENDPOINT.to_string(),
            combined_endpoint: COMBINED_ENDPOINT.to_string(),
            options,
        }
    }

    /// Points the catalogue at other hosts, e.g. a testnet or a local peer
    pub fn with_base_urls(
        ws_endpoint: impl Into<String>,
        combined_endpoint: impl Into<String>,
        options: ServeOptions,
    ) -> Self {
        Self {
            ws_endpoint: ws_endpoint.into(),
            combined_endpoint: combined_endpoint.into(),
            options,
        }
    }

    pub fn options(&self) -> &ServeOptions {
        &self.options
    }

    fn single(&self, stream: &str) -> WsConfig {
        WsConfig::stream(&self.ws_endpoint, stream)
    }

    fn combined<I, S>(&self, streams: I) -> Result<WsConfig, WsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        WsConfig::combined(&self.combined_endpoint, streams)
    }

    async fn run<H: MessageHandler>(
        &self,
        ctx: &CancellationToken,
        config: WsConfig,
        handler: H,
    ) -> Result<Subscription, WsError> {
        serve(ctx, config, &self.options, handler).await
    }

    /// Top `levels` bids and asks of one symbol; events carry `symbol` uppercased
    pub async fn partial_depth<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        levels: DepthLevels,
        speed: UpdateSpeed,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<PartialDepthEvent>,
    {
        let config = self.single(&partial_depth_stream(symbol, levels, speed));
        self.run(
            ctx,
            config,
            Flat::<PartialDepthEvent, _>::with_symbol(handler, symbol),
        )
        .await
    }

    pub async fn combined_partial_depth<S, H>(
        &self,
        ctx: &CancellationToken,
        symbol_levels: &[(S, DepthLevels)],
        speed: UpdateSpeed,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        S: AsRef<str>,
        H: EventHandler<PartialDepthEvent>,
    {
        let config = self.combined(
            symbol_levels
                .iter()
                .map(|(symbol, levels)| partial_depth_stream(symbol.as_ref(), *levels, speed)),
        )?;
        self.run(ctx, config, Combined::<PartialDepthEvent, _>::new(handler)).await
    }

    pub async fn diff_depth<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        speed: UpdateSpeed,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<DiffDepthEvent>,
    {
        let config = self.single(&diff_depth_stream(symbol, speed));
        self.run(ctx, config, Flat::<DiffDepthEvent, _>::new(handler)).await
    }

    pub async fn combined_diff_depth<S, H>(
        &self,
        ctx: &CancellationToken,
        symbols: &[S],
        speed: UpdateSpeed,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        S: AsRef<str>,
        H: EventHandler<DiffDepthEvent>,
    {
        let config = self.combined(
            symbols
                .iter()
                .map(|symbol| diff_depth_stream(symbol.as_ref(), speed)),
        )?;
        self.run(ctx, config, Combined::<DiffDepthEvent, _>::new(handler)).await
    }

    /// `interval` as Binance spells it: `1s`, `1m`, `15m`, `1h`, `1d` ...
    pub async fn kline<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        interval: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<KlineEvent>,
    {
        let config = self.single(&kline_stream(symbol, interval));
        self.run(ctx, config, Flat::<KlineEvent, _>::new(handler)).await
    }

    pub async fn combined_kline<S, I, H>(
        &self,
        ctx: &CancellationToken,
        symbol_intervals: &[(S, I)],
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        S: AsRef<str>,
        I: AsRef<str>,
        H: EventHandler<KlineEvent>,
    {
        let config = self.combined(
            symbol_intervals
                .iter()
                .map(|(symbol, interval)| kline_stream(symbol.as_ref(), interval.as_ref())),
        )?;
        self.run(ctx, config, Combined::<KlineEvent, _>::new(handler)).await
    }

    pub async fn agg_trade<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<AggTradeEvent>,
    {
        let config = self.single(&named_stream(symbol, "aggTrade"));
        self.run(ctx, config, Flat::<AggTradeEvent, _>::new(handler)).await
    }

    pub async fn combined_agg_trade<S, H>(
        &self,
        ctx: &CancellationToken,
        symbols: &[S],
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        S: AsRef<str>,
        H: EventHandler<AggTradeEvent>,
    {
        let config = self.combined(
            symbols
                .iter()
                .map(|symbol| named_stream(symbol.as_ref(), "aggTrade")),
        )?;
        self.run(ctx, config, Combined::<AggTradeEvent, _>::new(handler)).await
    }

    pub async fn trade<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<TradeEvent>,
    {
        let config = self.single(&named_stream(symbol, "trade"));
        self.run(ctx, config, Flat::<TradeEvent, _>::new(handler)).await
    }

    pub async fn combined_trade<S, H>(
        &self,
        ctx: &CancellationToken,
        symbols: &[S],
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        S: AsRef<str>,
        H: EventHandler<TradeEvent>,
    {
        let config = self.combined(
            symbols
                .iter()
                .map(|symbol| named_stream(symbol.as_ref(), "trade")),
        )?;
        self.run(ctx, config, Combined::<TradeEvent, _>::new(handler)).await
    }

    /// Rolling 24h statistics, pushed every second
    pub async fn market_stat<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<MarketStatEvent>,
    {
        let config = self.single(&named_stream(symbol, "ticker"));
        self.run(ctx, config, Flat::<MarketStatEvent, _>::new(handler)).await
    }

    pub async fn combined_market_stat<S, H>(
        &self,
        ctx: &CancellationToken,
        symbols: &[S],
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        S: AsRef<str>,
        H: EventHandler<MarketStatEvent>,
    {
        let config = self.combined(
            symbols
                .iter()
                .map(|symbol| named_stream(symbol.as_ref(), "ticker")),
        )?;
        self.run(ctx, config, Combined::<MarketStatEvent, _>::new(handler)).await
    }

    pub async fn all_market_stats<H>(
        &self,
        ctx: &CancellationToken,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<Vec<MarketStatEvent>>,
    {
        let config = self.single("!ticker@arr");
        self.run(ctx, config, Flat::<Vec<MarketStatEvent>, _>::new(handler)).await
    }

    pub async fn all_mini_market_stats<H>(
        &self,
        ctx: &CancellationToken,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<Vec<MiniMarketStatEvent>>,
    {
        let config = self.single("!miniTicker@arr");
        self.run(ctx, config, Flat::<Vec<MiniMarketStatEvent>, _>::new(handler)).await
    }

    /// Best bid/ask updates in real time
    pub async fn book_ticker<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<BookTickerEvent>,
    {
        let config = self.single(&named_stream(symbol, "bookTicker"));
        self.run(ctx, config, Flat::<BookTickerEvent, _>::new(handler)).await
    }

    pub async fn combined_book_ticker<S, H>(
        &self,
        ctx: &CancellationToken,
        symbols: &[S],
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        S: AsRef<str>,
        H: EventHandler<BookTickerEvent>,
    {
        let config = self.combined(
            symbols
                .iter()
                .map(|symbol| named_stream(symbol.as_ref(), "bookTicker")),
        )?;
        self.run(ctx, config, Combined::<BookTickerEvent, _>::new(handler)).await
    }

    pub async fn all_book_ticker<H>(
        &self,
        ctx: &CancellationToken,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<BookTickerEvent>,
    {
        let config = self.single("!bookTicker");
        self.run(ctx, config, Flat::<BookTickerEvent, _>::new(handler)).await
    }

    /// Account, balance, order and order-list updates for `listen_key`
    pub async fn user_data<H>(
        &self,
        ctx: &CancellationToken,
        listen_key: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<UserDataEvent>,
    {
        let config = self.single(listen_key);
        self.run(ctx, config, Flat::<UserDataEvent, _>::new(handler)).await
    }

    /// Same stream as [`Self::user_data`], frames left undecoded
    pub async fn user_data_raw<H>(
        &self,
        ctx: &CancellationToken,
        listen_key: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<Vec<u8>>,
    {
        let config = self.single(listen_key);
        self.run(ctx, config, Raw::new(handler)).await
    }
}
