/*
[INPUT]:  Stream names to (un)subscribe on an open connection
[OUTPUT]: JSON RPC control frames sent after connect
[POS]:    WebSocket layer - subscribe-style control messages
[UPDATE]: When adding new RPC methods or changing format
*/

use serde::{Deserialize, Serialize};

use super::error::WsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcMethod {
    Subscribe,
    Unsubscribe,
}

/// `{"method": "SUBSCRIBE", "params": [...], "id": 1}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsRpc {
    pub method: RpcMethod,
    pub params: Vec<String>,
    pub id: u64,
}

impl WsRpc {
    pub fn subscribe<I, S>(streams: I, id: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method: RpcMethod::Subscribe,
            params: streams.into_iter().map(Into::into).collect(),
            id,
        }
    }

    pub fn unsubscribe<I, S>(streams: I, id: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method: RpcMethod::Unsubscribe,
            params: streams.into_iter().map(Into::into).collect(),
            id,
        }
    }

    pub fn to_text(&self) -> Result<String, WsError> {
        Ok(serde_json::to_string(self)?)
    }
}
