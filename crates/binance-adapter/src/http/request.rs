/*
[INPUT]:  Method, endpoint path, query/form parameters and extra headers
[OUTPUT]: Request description turned into a reqwest call by BinanceClient
[POS]:    HTTP layer - request builder
[UPDATE]: When adding parameter encodings or request options
*/

use std::fmt::Display;

use reqwest::Method;
use serde::Serialize;
use url::form_urlencoded;

use super::error::Result;

/// One REST call: endpoint relative to the client's base URL plus parameters.
///
/// Setting a key twice keeps the last value; parameters are encoded sorted by
/// key.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub endpoint: String,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

fn set(pairs: &mut Vec<(String, String)>, key: String, value: String) {
    pairs.retain(|(existing, _)| *existing != key);
    pairs.push((key, value));
}

fn encode(pairs: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(sorted)
        .finish()
}

impl Request {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            form: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    /// Query parameter rendered with `Display`
    pub fn param(mut self, key: impl Into<String>, value: impl Display) -> Self {
        set(&mut self.query, key.into(), value.to_string());
        self
    }

    /// Query parameter holding a list, sent JSON-encoded: `symbols=["BTCUSDT","ETHUSDT"]`
    pub fn list_param<T: Serialize>(mut self, key: impl Into<String>, values: &[T]) -> Result<Self> {
        let encoded = serde_json::to_string(values)?;
        set(&mut self.query, key.into(), encoded);
        Ok(self)
    }

    /// Body parameter; any form parameter makes the body url-encoded
    pub fn form_param(mut self, key: impl Into<String>, value: impl Display) -> Self {
        set(&mut self.form, key.into(), value.to_string());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query_string(&self) -> String {
        encode(&self.query)
    }

    pub fn form_body(&self) -> Option<String> {
        (!self.form.is_empty()).then(|| encode(&self.form))
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_sorted_and_encoded() {
        let request = Request::get("/api/v3/depth")
            .param("symbol", "BTCUSDT")
            .param("limit", 5)
            .param("note", "a b&c");

        assert_eq!(
            request.query_string(),
            "limit=5&note=a+b%26c&symbol=BTCUSDT"
        );
        assert_eq!(request.form_body(), None);
    }

    #[test]
    fn test_param_set_twice_keeps_last() {
        let request = Request::get("/x").param("page", 1).param("page", 2);
        assert_eq!(request.query_string(), "page=2");
    }

    #[test]
    fn test_list_param_is_json() {
        let request = Request::get("/api/v3/ticker/price")
            .list_param("symbols", &["BTCUSDT", "ETHUSDT"])
            .unwrap();
        assert_eq!(
            request.query_string(),
            "symbols=%5B%22BTCUSDT%22%2C%22ETHUSDT%22%5D"
        );
    }

    #[test]
    fn test_form_body() {
        let request = Request::post("/sapi/v1/asset/transfer")
            .form_param("type", "MAIN_UMFUTURE")
            .form_param("amount", "1.5");
        assert_eq!(
            request.form_body().as_deref(),
            Some("amount=1.5&type=MAIN_UMFUTURE")
        );
    }
}
