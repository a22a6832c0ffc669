/*
[INPUT]:  Symbols, stream parameters, cancellation context and event handlers
[OUTPUT]: Running USD-M futures subscriptions built on ws::serve
[POS]:    Futures layer - market and user data stream catalogue
[UPDATE]: When adding futures streams or changing endpoint formats
*/

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::events::{
    AggTradeEvent, BlvtInfoEvent, BlvtKlineEvent, BookTickerEvent, CompositeIndexEvent,
    ContinuousKlineEvent, DepthEvent, KlineEvent, LiquidationOrderEvent, MarkPriceEvent,
    MarketTickerEvent, MiniMarketTickerEvent, UserDataEvent,
};
use crate::spot::DepthLevels;
use crate::ws::{
    Combined, Enveloped, EventHandler, Flat, MessageHandler, Raw, ServeOptions, Subscription,
    WsConfig, WsError, WsRpc, serve,
};

pub const WS_ENDPOINT: &str = "wss://fstream.binance.com/ws";
pub const COMBINED_ENDPOINT: &str = "wss://fstream.binance.com/stream?streams=";
/// Combined endpoint without a stream list; streams are added by SUBSCRIBE
pub const RPC_ENDPOINT: &str = "wss://fstream.binance.com/stream";

/// Push cadence of mark price streams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkPriceRate {
    #[default]
    Secs3,
    Secs1,
}

impl MarkPriceRate {
    fn suffix(&self) -> &'static str {
        match self {
            MarkPriceRate::Secs3 => "",
            MarkPriceRate::Secs1 => "@1s",
        }
    }
}

impl TryFrom<Duration> for MarkPriceRate {
    type Error = WsError;

    fn try_from(rate: Duration) -> Result<Self, Self::Error> {
        match rate.as_millis() {
            3000 => Ok(MarkPriceRate::Secs3),
            1000 => Ok(MarkPriceRate::Secs1),
            _ => Err(WsError::InvalidEndpoint(format!(
                "invalid mark price rate {rate:?}, expected 3s or 1s"
            ))),
        }
    }
}

/// Push cadence of futures depth streams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DepthSpeed {
    #[default]
    Ms250,
    Ms500,
    Ms100,
}

impl DepthSpeed {
    fn suffix(&self) -> &'static str {
        match self {
            DepthSpeed::Ms250 => "",
            DepthSpeed::Ms500 => "@500ms",
            DepthSpeed::Ms100 => "@100ms",
        }
    }
}

impl TryFrom<Duration> for DepthSpeed {
    type Error = WsError;

    fn try_from(rate: Duration) -> Result<Self, Self::Error> {
        match rate.as_millis() {
            250 => Ok(DepthSpeed::Ms250),
            500 => Ok(DepthSpeed::Ms500),
            100 => Ok(DepthSpeed::Ms100),
            _ => Err(WsError::InvalidEndpoint(format!(
                "invalid depth rate {rate:?}, expected 250ms, 500ms or 100ms"
            ))),
        }
    }
}

/// Pair, contract type (`perpetual`, `current_quarter`, ...) and interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuousKlineArgs {
    pub pair: String,
    pub contract_type: String,
    pub interval: String,
}

impl ContinuousKlineArgs {
    pub fn new(
        pair: impl Into<String>,
        contract_type: impl Into<String>,
        interval: impl Into<String>,
    ) -> Self {
        Self {
            pair: pair.into(),
            contract_type: contract_type.into(),
            interval: interval.into(),
        }
    }

    /// `btcusdt_perpetual@continuousKline_1m`
    pub fn stream(&self) -> String {
        format!(
            "{}_{}@continuousKline_{}",
            self.pair.to_lowercase(),
            self.contract_type.to_lowercase(),
            self.interval
        )
    }
}

pub fn mark_price_stream(symbol: &str, rate: MarkPriceRate) -> String {
    format!("{}@markPrice{}", symbol.to_lowercase(), rate.suffix())
}

pub fn depth_stream(symbol: &str, levels: Option<DepthLevels>, speed: DepthSpeed) -> String {
    let levels = levels.map(|levels| levels.as_str()).unwrap_or_default();
    format!("{}@depth{}{}", symbol.to_lowercase(), levels, speed.suffix())
}

pub fn kline_stream(symbol: &str, interval: &str) -> String {
    format!("{}@kline_{}", symbol.to_lowercase(), interval)
}

/// Leveraged token names keep their case: `BTCUP@tokenNav`
pub fn blvt_info_stream(name: &str) -> String {
    format!("{}@tokenNav", name.to_uppercase())
}

pub fn blvt_kline_stream(name: &str, interval: &str) -> String {
    format!("{}@nav_Kline_{}", name.to_uppercase(), interval)
}

pub fn composite_index_stream(symbol: &str) -> String {
    named_stream(symbol, "compositeIndex")
}

fn named_stream(symbol: &str, name: &str) -> String {
    format!("{}@{}", symbol.to_lowercase(), name)
}

/// USD-M futures stream catalogue over one endpoint set and one connection policy
#[derive(Debug, Clone)]
pub struct FuturesStreams {
    ws_endpoint: String,
    combined_endpoint: String,
    rpc_endpoint: String,
    options: ServeOptions,
}

impl Default for FuturesStreams {
    fn default() -> Self {
        Self::new()
    }
}

impl FuturesStreams {
    pub fn new() -> Self {
        Self::with_options(ServeOptions::default())
    }

    pub fn with_options(options: ServeOptions) -> Self {
        Self {
            ws_endpoint: WS_ENDPOINT.to_string(),
            combined_endpoint: COMBINED_ENDPOINT.to_string(),
            rpc_endpoint: RPC_ENDPOINT.to_string(),
            options,
        }
    }

    pub fn with_base_urls(
        ws_endpoint: impl Into<String>,
        combined_endpoint: impl Into<String>,
        rpc_endpoint: impl Into<String>,
        options: ServeOptions,
    ) -> Self {
        Self {
            ws_endpoint: ws_endpoint.into(),
            combined_endpoint: combined_endpoint.into(),
            rpc_endpoint: rpc_endpoint.into(),
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

    /// RPC endpoint primed with one SUBSCRIBE for `streams`
    fn subscribed(&self, streams: Vec<String>) -> Result<WsConfig, WsError> {
        if streams.is_empty() {
            return Err(WsError::InvalidEndpoint(format!(
                "{}: subscription needs at least one stream",
                self.rpc_endpoint
            )));
        }
        let rpc = WsRpc::subscribe(streams, 1).to_text()?;
        Ok(WsConfig::new(self.rpc_endpoint.clone()).with_message(rpc))
    }

    async fn run<H: MessageHandler>(
        &self,
        ctx: &CancellationToken,
        config: WsConfig,
        handler: H,
    ) -> Result<Subscription, WsError> {
        serve(ctx, config, &self.options, handler).await
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

    /// Mark price and funding rate of one symbol
    pub async fn mark_price<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        rate: MarkPriceRate,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<MarkPriceEvent>,
    {
        let config = self.single(&mark_price_stream(symbol, rate));
        self.run(ctx, config, Flat::<MarkPriceEvent, _>::new(handler)).await
    }

    pub async fn combined_mark_price<S, H>(
        &self,
        ctx: &CancellationToken,
        symbol_rates: &[(S, MarkPriceRate)],
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        S: AsRef<str>,
        H: EventHandler<MarkPriceEvent>,
    {
        let config = self.combined(
            symbol_rates
                .iter()
                .map(|(symbol, rate)| mark_price_stream(symbol.as_ref(), *rate)),
        )?;
        self.run(ctx, config, Combined::<MarkPriceEvent, _>::new(handler)).await
    }

    pub async fn all_mark_price<H>(
        &self,
        ctx: &CancellationToken,
        rate: MarkPriceRate,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<Vec<MarkPriceEvent>>,
    {
        let config = self.single(&format!("!markPrice@arr{}", rate.suffix()));
        self.run(ctx, config, Flat::<Vec<MarkPriceEvent>, _>::new(handler)).await
    }

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

    pub async fn continuous_kline<H>(
        &self,
        ctx: &CancellationToken,
        args: &ContinuousKlineArgs,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<ContinuousKlineEvent>,
    {
        let config = self.single(&args.stream());
        self.run(ctx, config, Flat::<ContinuousKlineEvent, _>::new(handler)).await
    }

    /// Subscribes every pair through one SUBSCRIBE RPC sent after connect
    pub async fn combined_continuous_kline<H>(
        &self,
        ctx: &CancellationToken,
        args: &[ContinuousKlineArgs],
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<ContinuousKlineEvent>,
    {
        let config = self.subscribed(args.iter().map(ContinuousKlineArgs::stream).collect())?;
        self.run(ctx, config, Enveloped::<ContinuousKlineEvent, _>::new(handler)).await
    }

    pub async fn mini_market_ticker<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<MiniMarketTickerEvent>,
    {
        let config = self.single(&named_stream(symbol, "miniTicker"));
        self.run(ctx, config, Flat::<MiniMarketTickerEvent, _>::new(handler)).await
    }

    pub async fn all_mini_market_ticker<H>(
        &self,
        ctx: &CancellationToken,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<Vec<MiniMarketTickerEvent>>,
    {
        let config = self.single("!miniTicker@arr");
        self.run(ctx, config, Flat::<Vec<MiniMarketTickerEvent>, _>::new(handler)).await
    }

    pub async fn market_ticker<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<MarketTickerEvent>,
    {
        let config = self.single(&named_stream(symbol, "ticker"));
        self.run(ctx, config, Flat::<MarketTickerEvent, _>::new(handler)).await
    }

    pub async fn all_market_ticker<H>(
        &self,
        ctx: &CancellationToken,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<Vec<MarketTickerEvent>>,
    {
        let config = self.single("!ticker@arr");
        self.run(ctx, config, Flat::<Vec<MarketTickerEvent>, _>::new(handler)).await
    }

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

    /// Forced liquidations of one symbol
    pub async fn liquidation_order<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<LiquidationOrderEvent>,
    {
        let config = self.single(&named_stream(symbol, "forceOrder"));
        self.run(ctx, config, Flat::<LiquidationOrderEvent, _>::new(handler)).await
    }

    /// NAV, basket and leverage of one leveraged token
    pub async fn blvt_info<H>(
        &self,
        ctx: &CancellationToken,
        name: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<BlvtInfoEvent>,
    {
        let config = self.single(&blvt_info_stream(name));
        self.run(ctx, config, Flat::<BlvtInfoEvent, _>::new(handler)).await
    }

    pub async fn blvt_kline<H>(
        &self,
        ctx: &CancellationToken,
        name: &str,
        interval: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<BlvtKlineEvent>,
    {
        let config = self.single(&blvt_kline_stream(name, interval));
        self.run(ctx, config, Flat::<BlvtKlineEvent, _>::new(handler)).await
    }

    pub async fn composite_index<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<CompositeIndexEvent>,
    {
        let config = self.single(&composite_index_stream(symbol));
        self.run(ctx, config, Flat::<CompositeIndexEvent, _>::new(handler)).await
    }

    pub async fn all_liquidation_order<H>(
        &self,
        ctx: &CancellationToken,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<LiquidationOrderEvent>,
    {
        let config = self.single("!forceOrder@arr");
        self.run(ctx, config, Flat::<LiquidationOrderEvent, _>::new(handler)).await
    }

    pub async fn partial_depth<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        levels: DepthLevels,
        speed: DepthSpeed,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<DepthEvent>,
    {
        let config = self.single(&depth_stream(symbol, Some(levels), speed));
        self.run(ctx, config, Flat::<DepthEvent, _>::new(handler)).await
    }

    pub async fn combined_partial_depth<S, H>(
        &self,
        ctx: &CancellationToken,
        symbol_levels: &[(S, DepthLevels)],
        speed: DepthSpeed,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        S: AsRef<str>,
        H: EventHandler<DepthEvent>,
    {
        let config = self.combined(
            symbol_levels
                .iter()
                .map(|(symbol, levels)| depth_stream(symbol.as_ref(), Some(*levels), speed)),
        )?;
        self.run(ctx, config, Combined::<DepthEvent, _>::new(handler)).await
    }

    pub async fn diff_depth<H>(
        &self,
        ctx: &CancellationToken,
        symbol: &str,
        speed: DepthSpeed,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        H: EventHandler<DepthEvent>,
    {
        let config = self.single(&depth_stream(symbol, None, speed));
        self.run(ctx, config, Flat::<DepthEvent, _>::new(handler)).await
    }

    pub async fn combined_diff_depth<S, H>(
        &self,
        ctx: &CancellationToken,
        symbols: &[S],
        speed: DepthSpeed,
        handler: H,
    ) -> Result<Subscription, WsError>
    where
        S: AsRef<str>,
        H: EventHandler<DepthEvent>,
    {
        let config = self.combined(
            symbols
                .iter()
                .map(|symbol| depth_stream(symbol.as_ref(), None, speed)),
        )?;
        self.run(ctx, config, Combined::<DepthEvent, _>::new(handler)).await
    }

    /// Listen-key stream with frames left undecoded
    pub async fn user_data<H>(
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

    /// Same stream as [`Self::user_data`], decoded into [`UserDataEvent`]
    pub async fn user_data_events<H>(
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, DepthSpeed::Ms250, "btcusdt@depth")]
    #[case(None, DepthSpeed::Ms500, "btcusdt@depth@500ms")]
    #[case(Some(DepthLevels::Five), DepthSpeed::Ms250, "btcusdt@depth5")]
    #[case(Some(DepthLevels::Twenty), DepthSpeed::Ms100, "btcusdt@depth20@100ms")]
    fn test_depth_stream(
        #[case] levels: Option<DepthLevels>,
        #[case] speed: DepthSpeed,
        #[case] expected: &str,
    ) {
        assert_eq!(depth_stream("BTCUSDT", levels, speed), expected);
    }

    #[rstest]
    #[case(MarkPriceRate::Secs3, "ethusdt@markPrice")]
    #[case(MarkPriceRate::Secs1, "ethusdt@markPrice@1s")]
    fn test_mark_price_stream(#[case] rate: MarkPriceRate, #[case] expected: &str) {
        assert_eq!(mark_price_stream("ETHUSDT", rate), expected);
    }

    #[rstest]
    #[case("btcup", "BTCUP@tokenNav")]
    #[case("BTCDOWN", "BTCDOWN@tokenNav")]
    fn test_blvt_info_stream_keeps_name_uppercase(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(blvt_info_stream(name), expected);
    }

    #[rstest]
    #[case("btcup", "1m", "BTCUP@nav_Kline_1m")]
    #[case("EthDown", "4h", "ETHDOWN@nav_Kline_4h")]
    fn test_blvt_kline_stream(#[case] name: &str, #[case] interval: &str, #[case] expected: &str) {
        assert_eq!(blvt_kline_stream(name, interval), expected);
    }

    #[rstest]
    #[case("DEFIUSDT", "defiusdt@compositeIndex")]
    #[case("defiusdt", "defiusdt@compositeIndex")]
    fn test_composite_index_stream(#[case] symbol: &str, #[case] expected: &str) {
        assert_eq!(composite_index_stream(symbol), expected);
    }

    #[rstest]
    #[case(Duration::from_secs(3), Some(MarkPriceRate::Secs3))]
    #[case(Duration::from_secs(1), Some(MarkPriceRate::Secs1))]
    #[case(Duration::from_secs(2), None)]
    fn test_mark_price_rate_from_duration(
        #[case] rate: Duration,
        #[case] expected: Option<MarkPriceRate>,
    ) {
        assert_eq!(MarkPriceRate::try_from(rate).ok(), expected);
    }

    #[rstest]
    #[case(Duration::from_millis(250), Some(DepthSpeed::Ms250))]
    #[case(Duration::from_millis(500), Some(DepthSpeed::Ms500))]
    #[case(Duration::from_millis(100), Some(DepthSpeed::Ms100))]
    #[case(Duration::from_millis(1000), None)]
    fn test_depth_speed_from_duration(
        #[case] rate: Duration,
        #[case] expected: Option<DepthSpeed>,
    ) {
        assert_eq!(DepthSpeed::try_from(rate).ok(), expected);
    }

    #[test]
    fn test_continuous_kline_stream_is_lowercase() {
        let args = ContinuousKlineArgs::new("BTCUSDT", "PERPETUAL", "1m");
        assert_eq!(args.stream(), "btcusdt_perpetual@continuousKline_1m");
    }

    #[test]
    fn test_subscribed_config_primes_rpc() {
        let streams = FuturesStreams::new();
        let config = streams
            .subscribed(vec![
                ContinuousKlineArgs::new("BTCUSDT", "perpetual", "1m").stream(),
                ContinuousKlineArgs::new("ETHUSDT", "current_quarter", "5m").stream(),
            ])
            .unwrap();

        assert_eq!(config.endpoint, "wss://fstream.binance.com/stream");
        assert_eq!(
            config.send_after_connect,
            vec![
                r#"{"method":"SUBSCRIBE","params":["btcusdt_perpetual@continuousKline_1m","ethusdt_current_quarter@continuousKline_5m"],"id":1}"#
            ]
        );
    }

    #[test]
    fn test_subscribed_rejects_empty_list() {
        let streams = FuturesStreams::new();
        assert!(matches!(
            streams.subscribed(Vec::new()),
            Err(WsError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_all_mark_price_endpoint() {
        let streams = FuturesStreams::new();
        let config = streams.single(&format!("!markPrice@arr{}", MarkPriceRate::Secs1.suffix()));
        assert_eq!(config.endpoint, "wss://fstream.binance.com/ws/!markPrice@arr@1s");
    }
}
