/*
[INPUT]:  USD-M futures market and user data stream payloads
[OUTPUT]: Typed futures events, symbol-restorable for combined streams
[POS]:    Futures layer - stream payload definitions
[UPDATE]: When Binance changes futures stream payloads
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::models::serde_helpers;
use crate::types::{
    Ask, Bid, ExecutionType, MarginType, OrderStatus, OrderType, PositionSide, Side, TimeInForce,
    WorkingType,
};
use crate::ws::WithSymbol;

pub use crate::spot::events::{Kline, KlineEvent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggTradeEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "a")]
    pub agg_trade_id: i64,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
    #[serde(rename = "f")]
    pub first_trade_id: i64,
    #[serde(rename = "l")]
    pub last_trade_id: i64,
    #[serde(rename = "T")]
    pub trade_time: i64,
    #[serde(rename = "m")]
    pub maker: bool,
}

/// Mark price and funding rate of one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkPriceEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub mark_price: Decimal,
    #[serde(rename = "i", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub index_price: Decimal,
    #[serde(rename = "P", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub estimated_settle_price: Decimal,
    /// Empty for symbols without funding, read as zero
    #[serde(rename = "r", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub funding_rate: Decimal,
    #[serde(rename = "T")]
    pub next_funding_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousKlineEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "ps")]
    pub pair: String,
    #[serde(rename = "ct")]
    pub contract_type: String,
    #[serde(rename = "k")]
    pub kline: ContinuousKline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousKline {
    #[serde(rename = "t")]
    pub start_time: i64,
    #[serde(rename = "T")]
    pub end_time: i64,
    #[serde(rename = "i")]
    pub interval: String,
    #[serde(rename = "f")]
    pub first_trade_id: i64,
    #[serde(rename = "L")]
    pub last_trade_id: i64,
    #[serde(rename = "o", with = "rust_decimal::serde::str")]
    pub open: Decimal,
    #[serde(rename = "c", with = "rust_decimal::serde::str")]
    pub close: Decimal,
    #[serde(rename = "h", with = "rust_decimal::serde::str")]
    pub high: Decimal,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub low: Decimal,
    #[serde(rename = "v", with = "rust_decimal::serde::str")]
    pub volume: Decimal,
    #[serde(rename = "n")]
    pub trade_num: i64,
    #[serde(rename = "x")]
    pub is_final: bool,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quote_volume: Decimal,
    #[serde(rename = "V", with = "rust_decimal::serde::str")]
    pub active_buy_volume: Decimal,
    #[serde(rename = "Q", with = "rust_decimal::serde::str")]
    pub active_buy_quote_volume: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniMarketTickerEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "c", with = "rust_decimal::serde::str")]
    pub close_price: Decimal,
    #[serde(rename = "o", with = "rust_decimal::serde::str")]
    pub open_price: Decimal,
    #[serde(rename = "h", with = "rust_decimal::serde::str")]
    pub high_price: Decimal,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub low_price: Decimal,
    #[serde(rename = "v", with = "rust_decimal::serde::str")]
    pub volume: Decimal,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quote_volume: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTickerEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price_change: Decimal,
    #[serde(rename = "P", with = "rust_decimal::serde::str")]
    pub price_change_percent: Decimal,
    #[serde(rename = "w", with = "rust_decimal::serde::str")]
    pub weighted_avg_price: Decimal,
    #[serde(rename = "c", with = "rust_decimal::serde::str")]
    pub close_price: Decimal,
    #[serde(rename = "Q", with = "rust_decimal::serde::str")]
    pub close_qty: Decimal,
    #[serde(rename = "o", with = "rust_decimal::serde::str")]
    pub open_price: Decimal,
    #[serde(rename = "h", with = "rust_decimal::serde::str")]
    pub high_price: Decimal,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub low_price: Decimal,
    #[serde(rename = "v", with = "rust_decimal::serde::str")]
    pub base_volume: Decimal,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quote_volume: Decimal,
    #[serde(rename = "O")]
    pub open_time: i64,
    #[serde(rename = "C")]
    pub close_time: i64,
    #[serde(rename = "F")]
    pub first_id: i64,
    #[serde(rename = "L")]
    pub last_id: i64,
    #[serde(rename = "n")]
    pub trade_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookTickerEvent {
    #[serde(rename = "e", default)]
    pub event: String,
    #[serde(rename = "u")]
    pub update_id: i64,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "T")]
    pub transaction_time: i64,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "b", with = "rust_decimal::serde::str")]
    pub best_bid_price: Decimal,
    #[serde(rename = "B", with = "rust_decimal::serde::str")]
    pub best_bid_qty: Decimal,
    #[serde(rename = "a", with = "rust_decimal::serde::str")]
    pub best_ask_price: Decimal,
    #[serde(rename = "A", with = "rust_decimal::serde::str")]
    pub best_ask_qty: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationOrderEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "o")]
    pub order: LiquidationOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationOrder {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "S")]
    pub side: Side,
    #[serde(rename = "o")]
    pub order_type: OrderType,
    #[serde(rename = "f")]
    pub time_in_force: TimeInForce,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub orig_quantity: Decimal,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(rename = "ap", with = "rust_decimal::serde::str")]
    pub avg_price: Decimal,
    #[serde(rename = "X")]
    pub status: OrderStatus,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub last_filled_qty: Decimal,
    #[serde(rename = "z", with = "rust_decimal::serde::str")]
    pub accumulated_filled_qty: Decimal,
    #[serde(rename = "T")]
    pub trade_time: i64,
}

/// Partial and diff depth share one payload on futures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "T")]
    pub transaction_time: i64,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "U")]
    pub first_update_id: i64,
    #[serde(rename = "u")]
    pub last_update_id: i64,
    /// `u` of the previous event; a gap means the local book is stale
    #[serde(rename = "pu")]
    pub prev_last_update_id: i64,
    #[serde(rename = "b")]
    pub bids: Vec<Bid>,
    #[serde(rename = "a")]
    pub asks: Vec<Ask>,
}

/// Net asset value and basket of one leveraged token (`BTCUP`, `BTCDOWN`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlvtInfoEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    /// Tokens issued
    #[serde(rename = "m")]
    pub issued: f64,
    #[serde(rename = "b", default)]
    pub baskets: Vec<BlvtBasket>,
    #[serde(rename = "n")]
    pub nav: f64,
    #[serde(rename = "l")]
    pub leverage: f64,
    #[serde(rename = "t")]
    pub target_leverage: i64,
    #[serde(rename = "f")]
    pub funding_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlvtBasket {
    #[serde(rename = "s")]
    pub symbol: String,
    /// Futures position held for the token; negative for DOWN tokens
    #[serde(rename = "n")]
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlvtKlineEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "k")]
    pub kline: BlvtKline,
}

/// NAV candle; `o/c/h/l` are NAV prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlvtKline {
    #[serde(rename = "t")]
    pub start_time: i64,
    #[serde(rename = "T")]
    pub close_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "i")]
    pub interval: String,
    #[serde(rename = "f")]
    pub first_update_time: i64,
    #[serde(rename = "L")]
    pub last_update_time: i64,
    #[serde(rename = "o", with = "rust_decimal::serde::str")]
    pub open: Decimal,
    #[serde(rename = "c", with = "rust_decimal::serde::str")]
    pub close: Decimal,
    #[serde(rename = "h", with = "rust_decimal::serde::str")]
    pub high: Decimal,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub low: Decimal,
    #[serde(rename = "v", with = "rust_decimal::serde::str")]
    pub leverage: Decimal,
    #[serde(rename = "n")]
    pub count: i64,
}

/// Price and constituents of a composite index symbol (e.g. `DEFIUSDT`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeIndexEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(rename = "c", default)]
    pub composition: Vec<Composition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    #[serde(rename = "b")]
    pub base_asset: String,
    #[serde(rename = "w", with = "rust_decimal::serde::str")]
    pub weight_qty: Decimal,
    #[serde(rename = "W", with = "rust_decimal::serde::str")]
    pub weight_percent: Decimal,
}

macro_rules! with_symbol {
    ($($event:ty),+ $(,)?) => {
        $(
            impl WithSymbol for $event {
                fn set_symbol(&mut self, symbol: String) {
                    self.symbol = symbol;
                }
            }
        )+
    };
}

with_symbol!(
    AggTradeEvent,
    MarkPriceEvent,
    MiniMarketTickerEvent,
    MarketTickerEvent,
    BookTickerEvent,
    DepthEvent,
);

/// Events pushed on a futures listen-key stream, tagged by `e`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "e")]
pub enum UserDataEvent {
    #[serde(rename = "ACCOUNT_UPDATE")]
    AccountUpdate(AccountUpdateEvent),
    #[serde(rename = "ORDER_TRADE_UPDATE")]
    OrderTradeUpdate(Box<OrderTradeUpdateEvent>),
    #[serde(rename = "ACCOUNT_CONFIG_UPDATE")]
    AccountConfigUpdate(AccountConfigUpdateEvent),
    #[serde(rename = "MARGIN_CALL")]
    MarginCall(MarginCallEvent),
    #[serde(rename = "listenKeyExpired")]
    ListenKeyExpired {
        #[serde(rename = "E")]
        time: i64,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountUpdateEvent {
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "T")]
    pub transaction_time: i64,
    #[serde(rename = "a")]
    pub update: AccountUpdate,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountUpdate {
    /// Why the update happened, e.g. `ORDER`, `FUNDING_FEE`, `DEPOSIT`
    #[serde(rename = "m")]
    pub reason: String,
    #[serde(rename = "B", default)]
    pub balances: Vec<Balance>,
    #[serde(rename = "P", default)]
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Balance {
    #[serde(rename = "a")]
    pub asset: String,
    #[serde(rename = "wb", with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    #[serde(rename = "cw", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub cross_wallet_balance: Decimal,
    #[serde(rename = "bc", default, deserialize_with = "serde_helpers::deserialize_null_decimal")]
    pub change_balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Position {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "ps")]
    pub side: PositionSide,
    #[serde(rename = "pa", with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(rename = "mt")]
    pub margin_type: MarginType,
    #[serde(rename = "iw", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub isolated_wallet: Decimal,
    #[serde(rename = "ep", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub entry_price: Decimal,
    #[serde(rename = "mp", default, deserialize_with = "serde_helpers::deserialize_null_decimal")]
    pub mark_price: Option<Decimal>,
    #[serde(rename = "up", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub unrealized_pnl: Decimal,
    #[serde(rename = "cr", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub accumulated_realized: Decimal,
    #[serde(rename = "mm", default, deserialize_with = "serde_helpers::deserialize_null_decimal")]
    pub maintenance_margin_required: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderTradeUpdateEvent {
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "T")]
    pub transaction_time: i64,
    #[serde(rename = "o")]
    pub order: OrderTradeUpdate,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderTradeUpdate {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "c")]
    pub client_order_id: String,
    #[serde(rename = "S")]
    pub side: Side,
    #[serde(rename = "o")]
    pub order_type: OrderType,
    #[serde(rename = "f")]
    pub time_in_force: TimeInForce,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub original_qty: Decimal,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub original_price: Decimal,
    #[serde(rename = "ap", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub average_price: Decimal,
    #[serde(rename = "sp", default, deserialize_with = "serde_helpers::deserialize_null_decimal")]
    pub stop_price: Option<Decimal>,
    #[serde(rename = "x")]
    pub execution_type: ExecutionType,
    #[serde(rename = "X")]
    pub status: OrderStatus,
    #[serde(rename = "i")]
    pub order_id: i64,
    #[serde(rename = "aid", default)]
    pub algo_id: i64,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub last_filled_qty: Decimal,
    #[serde(rename = "z", default, deserialize_with = "serde_helpers::deserialize_null_decimal")]
    pub accumulated_filled_qty: Option<Decimal>,
    #[serde(rename = "L", with = "rust_decimal::serde::str")]
    pub last_filled_price: Decimal,
    #[serde(rename = "N", default)]
    pub commission_asset: Option<String>,
    #[serde(rename = "n", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub commission: Decimal,
    #[serde(rename = "T")]
    pub trade_time: i64,
    #[serde(rename = "t")]
    pub trade_id: i64,
    #[serde(rename = "b", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub bids_notional: Decimal,
    #[serde(rename = "a", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub asks_notional: Decimal,
    #[serde(rename = "m")]
    pub is_maker: bool,
    #[serde(rename = "R")]
    pub is_reduce_only: bool,
    #[serde(rename = "wt")]
    pub working_type: WorkingType,
    #[serde(rename = "ot")]
    pub original_type: OrderType,
    #[serde(rename = "ps")]
    pub position_side: PositionSide,
    #[serde(rename = "cp", default)]
    pub is_closing_position: bool,
    #[serde(rename = "AP", default, deserialize_with = "serde_helpers::deserialize_null_decimal")]
    pub activation_price: Option<Decimal>,
    #[serde(rename = "cr", default, deserialize_with = "serde_helpers::deserialize_null_decimal")]
    pub callback_rate: Option<Decimal>,
    #[serde(rename = "rp", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub realized_pnl: Decimal,
    #[serde(rename = "at", default)]
    pub algo_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountConfigUpdateEvent {
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "T")]
    pub transaction_time: i64,
    #[serde(rename = "ac")]
    pub leverage: Option<LeverageUpdate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeverageUpdate {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "l")]
    pub leverage: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarginCallEvent {
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "cw", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub cross_wallet_balance: Decimal,
    #[serde(rename = "p", default)]
    pub positions: Vec<Position>,
}
