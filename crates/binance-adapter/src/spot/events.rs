/*
[INPUT]:  Spot market and user data stream payloads
[OUTPUT]: Typed spot events, symbol-restorable for combined streams
[POS]:    Spot layer - stream payload definitions
[UPDATE]: When Binance changes spot stream payloads
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::models::serde_helpers;
use crate::types::{Ask, Bid, ExecutionType, OrderStatus, OrderType, Side, TimeInForce};
use crate::ws::WithSymbol;

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

/// Top-of-book snapshot; the payload carries no symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialDepthEvent {
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: i64,
    pub bids: Vec<Bid>,
    pub asks: Vec<Ask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffDepthEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "U")]
    pub first_update_id: i64,
    #[serde(rename = "u")]
    pub last_update_id: i64,
    #[serde(rename = "b")]
    pub bids: Vec<Bid>,
    #[serde(rename = "a")]
    pub asks: Vec<Ask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlineEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "k")]
    pub kline: Kline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    #[serde(rename = "t")]
    pub start_time: i64,
    #[serde(rename = "T")]
    pub end_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "i")]
    pub interval: String,
    /// -1 when the kline has no trades
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
    pub is_buyer_maker: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "t")]
    pub trade_id: i64,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
    #[serde(rename = "b", default)]
    pub buyer_order_id: i64,
    #[serde(rename = "a", default)]
    pub seller_order_id: i64,
    #[serde(rename = "T")]
    pub trade_time: i64,
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

/// Rolling 24h statistics of one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStatEvent {
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
    #[serde(rename = "x", with = "rust_decimal::serde::str")]
    pub prev_close_price: Decimal,
    #[serde(rename = "c", with = "rust_decimal::serde::str")]
    pub last_price: Decimal,
    #[serde(rename = "Q", with = "rust_decimal::serde::str")]
    pub close_qty: Decimal,
    #[serde(rename = "b", with = "rust_decimal::serde::str")]
    pub bid_price: Decimal,
    #[serde(rename = "B", with = "rust_decimal::serde::str")]
    pub bid_qty: Decimal,
    #[serde(rename = "a", with = "rust_decimal::serde::str")]
    pub ask_price: Decimal,
    #[serde(rename = "A", with = "rust_decimal::serde::str")]
    pub ask_qty: Decimal,
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
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniMarketStatEvent {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "c", with = "rust_decimal::serde::str")]
    pub last_price: Decimal,
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
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookTickerEvent {
    #[serde(rename = "u")]
    pub update_id: i64,
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

with_symbol!(
    PartialDepthEvent,
    DiffDepthEvent,
    KlineEvent,
    AggTradeEvent,
    TradeEvent,
    MarketStatEvent,
    MiniMarketStatEvent,
    BookTickerEvent,
);

/// Events pushed on a spot listen-key stream, tagged by `e`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "e")]
pub enum UserDataEvent {
    #[serde(rename = "outboundAccountPosition")]
    AccountPosition(AccountPosition),
    #[serde(rename = "balanceUpdate")]
    BalanceUpdate(BalanceUpdate),
    #[serde(rename = "executionReport")]
    ExecutionReport(Box<ExecutionReport>),
    #[serde(rename = "listStatus")]
    ListStatus(ListStatus),
    /// Event kinds this crate does not model, e.g. `listenKeyExpired`
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountPosition {
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "u")]
    pub account_update_time: i64,
    #[serde(rename = "B", default)]
    pub balances: Vec<AccountBalance>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountBalance {
    #[serde(rename = "a")]
    pub asset: String,
    #[serde(rename = "f", with = "rust_decimal::serde::str")]
    pub free: Decimal,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub locked: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BalanceUpdate {
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "a")]
    pub asset: String,
    #[serde(rename = "d", with = "rust_decimal::serde::str")]
    pub change: Decimal,
    #[serde(rename = "T")]
    pub clear_time: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecutionReport {
    #[serde(rename = "E")]
    pub time: i64,
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
    pub quantity: Decimal,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(rename = "P", default, deserialize_with = "serde_helpers::deserialize_null_decimal")]
    pub stop_price: Option<Decimal>,
    #[serde(rename = "d", default)]
    pub trailing_delta: i64,
    #[serde(rename = "F", default, deserialize_with = "serde_helpers::deserialize_null_decimal")]
    pub iceberg_quantity: Option<Decimal>,
    /// -1 unless the order belongs to an order list
    #[serde(rename = "g")]
    pub order_list_id: i64,
    #[serde(rename = "C", default)]
    pub orig_client_order_id: String,
    #[serde(rename = "x")]
    pub execution_type: ExecutionType,
    #[serde(rename = "X")]
    pub status: OrderStatus,
    #[serde(rename = "r")]
    pub reject_reason: String,
    #[serde(rename = "i")]
    pub order_id: i64,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub last_filled_quantity: Decimal,
    #[serde(rename = "z", default, deserialize_with = "serde_helpers::deserialize_null_decimal")]
    pub filled_quantity: Option<Decimal>,
    #[serde(rename = "L", with = "rust_decimal::serde::str")]
    pub last_filled_price: Decimal,
    #[serde(rename = "n", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub fee: Decimal,
    #[serde(rename = "N", default)]
    pub fee_asset: Option<String>,
    #[serde(rename = "T")]
    pub transaction_time: i64,
    /// -1 when the event is not a fill
    #[serde(rename = "t")]
    pub trade_id: i64,
    #[serde(rename = "w")]
    pub is_in_order_book: bool,
    #[serde(rename = "m")]
    pub is_maker: bool,
    #[serde(rename = "O")]
    pub create_time: i64,
    #[serde(rename = "Z", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub filled_quote_quantity: Decimal,
    #[serde(rename = "Y", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub last_quote_quantity: Decimal,
    #[serde(rename = "Q", default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub quote_order_quantity: Decimal,
    #[serde(rename = "D", default)]
    pub trailing_time: i64,
    #[serde(rename = "j", default)]
    pub strategy_id: i64,
    #[serde(rename = "J", default)]
    pub strategy_type: i64,
    #[serde(rename = "W", default)]
    pub working_time: i64,
    #[serde(rename = "V", default)]
    pub self_trade_prevention_mode: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListStatus {
    #[serde(rename = "E")]
    pub time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "g")]
    pub order_list_id: i64,
    #[serde(rename = "c")]
    pub contingency_type: String,
    #[serde(rename = "l")]
    pub list_status_type: String,
    #[serde(rename = "L")]
    pub list_order_status: String,
    #[serde(rename = "r")]
    pub reject_reason: String,
    #[serde(rename = "C")]
    pub list_client_order_id: String,
    #[serde(rename = "T")]
    pub transaction_time: i64,
    #[serde(rename = "O", default)]
    pub orders: Vec<ListStatusOrder>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListStatusOrder {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "i")]
    pub order_id: i64,
    #[serde(rename = "c")]
    pub client_order_id: String,
}
