/*
[INPUT]:  Binance payload fragments shared by several streams
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One `[price, quantity]` entry of an order book side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel(
    #[serde(with = "rust_decimal::serde::str")] pub Decimal,
    #[serde(with = "rust_decimal::serde::str")] pub Decimal,
);

impl PriceLevel {
    pub fn price(&self) -> Decimal {
        self.0
    }

    pub fn quantity(&self) -> Decimal {
        self.1
    }

    /// Zero quantity in a diff update removes the level
    pub fn is_removal(&self) -> bool {
        self.1.is_zero()
    }
}

pub type Bid = PriceLevel;
pub type Ask = PriceLevel;

pub(crate) mod serde_helpers {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::str::FromStr;

    fn parse(value: Value) -> Result<Option<Decimal>, String> {
        match value {
            Value::Null => Ok(None),
            Value::String(raw) if raw.trim().is_empty() => Ok(None),
            Value::String(raw) => Decimal::from_str(raw.trim())
                .map(Some)
                .map_err(|err| err.to_string()),
            Value::Number(number) => Decimal::from_str(&number.to_string())
                .map(Some)
                .map_err(|err| err.to_string()),
            other => Err(format!("invalid decimal value: {other}")),
        }
    }

    /// `null` and `""` become `None`
    pub fn deserialize_null_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse(Value::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }

    /// Treats `null` like a missing field
    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn deserialize_decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse(Value::deserialize(deserializer)?)
            .map(Option::unwrap_or_default)
            .map_err(serde::de::Error::custom)
    }
}
