/*
[INPUT]:  Public catalogue parameters (announcement page)
[OUTPUT]: Asset list and announcement articles
[POS]:    HTTP layer - public web endpoints (no auth required)
[UPDATE]: When adding new public endpoints or changing response format
*/

use crate::http::{BinanceClient, BinanceError, Request, Result};
use crate::types::{AllAssetsResponse, AnnouncementsResponse};

const ALL_ASSETS_ENDPOINT: &str = "/bapi/asset/v2/public/asset/asset/get-all-asset";
const ANNOUNCEMENTS_ENDPOINT: &str = "/bapi/apex/v1/public/apex/cms/article/list/query";
/// "New Cryptocurrency Listing" catalogue
const LISTING_CATALOG_ID: u32 = 48;

impl BinanceClient {
    /// Every asset known to the exchange
    ///
    /// GET /bapi/asset/v2/public/asset/asset/get-all-asset
    pub async fn get_all_assets(&self) -> Result<AllAssetsResponse> {
        let response: AllAssetsResponse = self.send_json(Request::get(ALL_ASSETS_ENDPOINT)).await?;
        if !response.success {
            return Err(BinanceError::Unsuccessful(
                "failed to get the assets".to_string(),
            ));
        }
        Ok(response)
    }

    /// First page of listing announcements
    ///
    /// GET /bapi/apex/v1/public/apex/cms/article/list/query?type=1&pageNo=1&pageSize=10&catalogId=48
    pub async fn get_announcements(&self) -> Result<AnnouncementsResponse> {
        self.get_announcements_page(1, 10).await
    }

    pub async fn get_announcements_page(
        &self,
        page_no: u32,
        page_size: u32,
    ) -> Result<AnnouncementsResponse> {
        let request = Request::get(ANNOUNCEMENTS_ENDPOINT)
            .param("type", 1)
            .param("pageNo", page_no)
            .param("pageSize", page_size)
            .param("catalogId", LISTING_CATALOG_ID);
        let response: AnnouncementsResponse = self.send_json(request).await?;
        if !response.success {
            let mut text = "failed to get announcements".to_string();
            if let Some(message) = &response.message {
                text.push_str(": ");
                text.push_str(message);
            }
            return Err(BinanceError::Unsuccessful(text));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{BinanceClient, BinanceError, ClientConfig};
    use crate::types::AssetInfo;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> BinanceClient {
        BinanceClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
            .expect("client init")
    }

    #[tokio::test]
    async fn test_get_all_assets() {
        let server = MockServer::start().await;
        let mock_response = r#"{
            "code": "000000",
            "data": [
                {"assetCode": "BTC", "logoUrl": "https://bin.bnbstatic.com/btc.png", "assetDigit": 8, "trading": true},
                {"assetCode": "LUNC", "logoUrl": "", "assetDigit": 2, "trading": false}
            ],
            "success": true
        }"#;

        let _mock = Mock::given(method("GET"))
            .and(path("/bapi/asset/v2/public/asset/asset/get-all-asset"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_raw(mock_response, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .get_all_assets()
            .await
            .expect("get_all_assets failed");

        assert_eq!(
            response.data[0],
            AssetInfo {
                asset_code: "BTC".to_string(),
                logo_url: "https://bin.bnbstatic.com/btc.png".to_string(),
                asset_digit: 8,
                trading: true,
            }
        );
        assert!(!response.data[1].trading);
    }

    #[tokio::test]
    async fn test_get_all_assets_unsuccessful() {
        let server = MockServer::start().await;
        let _mock = Mock::given(method("GET"))
            .and(path("/bapi/asset/v2/public/asset/asset/get-all-asset"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"data":null,"success":false}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let err = client(&server).get_all_assets().await.expect_err("must fail");
        assert!(matches!(err, BinanceError::Unsuccessful(_)));
    }

    #[tokio::test]
    async fn test_get_announcements() {
        let server = MockServer::start().await;
        let mock_response = r#"{
            "code": "000000",
            "message": null,
            "data": {"catalogs": [{
                "catalogId": 48,
                "parentCatalogId": null,
                "icon": "https://public.bnbstatic.com/icon.png",
                "catalogName": "New Cryptocurrency Listing",
                "description": null,
                "catalogType": 1,
                "total": 1510,
                "articles": [
                    {"id": 204837, "code": "a1b2", "title": "Binance Will List Example (EXM)", "type": 1, "releaseDate": 1718960402000}
                ],
                "catalogs": []
            }]},
            "success": true
        }"#;

        let _mock = Mock::given(method("GET"))
            .and(path("/bapi/apex/v1/public/apex/cms/article/list/query"))
            .and(query_param("type", "1"))
            .and(query_param("pageNo", "1"))
            .and(query_param("pageSize", "10"))
            .and(query_param("catalogId", "48"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(mock_response, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .get_announcements()
            .await
            .expect("get_announcements failed");

        let articles: Vec<_> = response.articles().collect();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, 204837);
        assert_eq!(articles[0].release_date, 1718960402000);
        assert_eq!(response.data.catalogs[0].total, 1510);
    }

    #[tokio::test]
    async fn test_get_announcements_unsuccessful_carries_message() {
        let server = MockServer::start().await;
        let _mock = Mock::given(method("GET"))
            .and(path("/bapi/apex/v1/public/apex/cms/article/list/query"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"message":"system busy","data":null,"success":false}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_announcements_page(2, 20)
            .await
            .expect_err("must fail");

        match err {
            BinanceError::Unsuccessful(text) => {
                assert_eq!(text, "failed to get announcements: system busy");
            }
            other => panic!("Expected Unsuccessful, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let server = MockServer::start().await;
        let _mock = Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client(&server).get_all_assets().await.expect_err("must fail");
        assert!(err.is_retryable());
    }
}
