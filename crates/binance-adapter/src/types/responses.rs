/*
[INPUT]:  Public REST endpoint schemas
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::models::serde_helpers;

/// `{"code": -1121, "msg": "Invalid symbol."}` returned with HTTP >= 400
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    pub asset_code: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub asset_digit: i64,
    #[serde(default)]
    pub trading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllAssetsResponse {
    #[serde(default, deserialize_with = "serde_helpers::null_as_default")]
    pub data: Vec<AssetInfo>,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub code: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: i64,
    /// Milliseconds since epoch
    pub release_date: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementCatalog {
    pub catalog_id: i64,
    #[serde(default)]
    pub icon: String,
    pub catalog_name: String,
    #[serde(default)]
    pub catalog_type: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementData {
    #[serde(default)]
    pub catalogs: Vec<AnnouncementCatalog>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementsResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::null_as_default")]
    pub data: AnnouncementData,
    pub success: bool,
}

impl AnnouncementsResponse {
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.data
            .catalogs
            .iter()
            .flat_map(|catalog| catalog.articles.iter())
    }
}
