use crate::utils::error::{AdsError, Result};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const ADVERTISER_PATH: &str = "/open_api/v1.3/oauth2/advertiser/get/";
const UNNAMED: &str = "未命名";

/// 已授權的廣告帳戶
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertiserInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub advertiser_id: String,
    #[serde(default)]
    pub advertiser_name: String,
    #[serde(default)]
    pub status: String,
}

impl AdvertiserInfo {
    /// `名稱（ID）`，沒有名稱時顯示未命名
    pub fn display_name(&self) -> String {
        let name = if self.advertiser_name.is_empty() {
            UNNAMED
        } else {
            self.advertiser_name.as_str()
        };
        format!("{}（{}）", name, self.advertiser_id)
    }
}

#[derive(Debug, Deserialize)]
struct AdvertiserResponse {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<AdvertiserList>,
}

#[derive(Debug, Deserialize)]
struct AdvertiserList {
    list: Option<Vec<AdvertiserInfo>>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "advertiser_id must be a string or number, got {}",
            other
        ))),
    }
}

/// 查詢 access token 可操作的廣告帳戶
pub async fn fetch_advertisers(
    client: &Client,
    base_url: &str,
    app_id: &str,
    app_secret: &str,
    access_token: &str,
) -> Result<Vec<AdvertiserInfo>> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), ADVERTISER_PATH);

    tracing::info!("📣 Fetching TikTok advertisers for app {}", app_id);
    let response = client
        .get(&url)
        .query(&[("app_id", app_id), ("secret", app_secret)])
        .header("Access-Token", access_token)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AdsError::HttpStatusError {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    let text = response.text().await?;
    let parsed: AdvertiserResponse = serde_json::from_str(text.trim())?;

    if parsed.code != 0 {
        return Err(AdsError::RemoteError {
            service: "tiktok".to_string(),
            code: parsed.code,
            message: parsed.message,
        });
    }

    let advertisers = parsed
        .data
        .and_then(|data| data.list)
        .ok_or_else(|| AdsError::ValidationError {
            message: "TikTok advertiser response has no data.list".to_string(),
        })?;

    tracing::info!("✅ Found {} advertiser account(s)", advertisers.len());
    for advertiser in &advertisers {
        tracing::debug!("📣 {} [{}]", advertiser.display_name(), advertiser.status);
    }
    Ok(advertisers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_advertisers_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/open_api/v1.3/oauth2/advertiser/get/")
                .query_param("app_id", "app")
                .query_param("secret", "s3cret")
                .header("access-token", "act.token");
            then.status(200).json_body(json!({
                "code": 0,
                "message": "OK",
                "data": {
                    "list": [
                        {
                            "advertiser_id": "7000000000000000001",
                            "advertiser_name": "Spring Store",
                            "status": "STATUS_ENABLE"
                        },
                        {"advertiser_id": 7000000000000000002u64}
                    ]
                }
            }));
        });

        let advertisers = fetch_advertisers(
            &Client::new(),
            &server.base_url(),
            "app",
            "s3cret",
            "act.token",
        )
        .await
        .unwrap();

        mock.assert();
        assert_eq!(advertisers.len(), 2);
        assert_eq!(advertisers[0].advertiser_name, "Spring Store");
        assert_eq!(advertisers[0].status, "STATUS_ENABLE");
        assert_eq!(
            advertisers[0].display_name(),
            "Spring Store（7000000000000000001）"
        );
        assert_eq!(advertisers[1].advertiser_id, "7000000000000000002");
        assert_eq!(advertisers[1].display_name(), "未命名（7000000000000000002）");
    }

    #[tokio::test]
    async fn test_fetch_advertisers_business_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/open_api/v1.3/oauth2/advertiser/get/");
            then.status(200)
                .json_body(json!({"code": 40001, "message": "Access token is invalid"}));
        });

        let err = fetch_advertisers(&Client::new(), &server.base_url(), "app", "s3cret", "bad")
            .await
            .unwrap_err();

        match err {
            AdsError::RemoteError { service, code, message } => {
                assert_eq!(service, "tiktok");
                assert_eq!(code, 40001);
                assert_eq!(message, "Access token is invalid");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_advertisers_without_list_is_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/open_api/v1.3/oauth2/advertiser/get/");
            then.status(200)
                .json_body(json!({"code": 0, "message": "OK", "data": {}}));
        });

        let err = fetch_advertisers(&Client::new(), &server.base_url(), "app", "s3cret", "act.token")
            .await
            .unwrap_err();

        assert!(matches!(err, AdsError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_advertisers_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/open_api/v1.3/oauth2/advertiser/get/");
            then.status(503).body("Service Unavailable");
        });

        let err = fetch_advertisers(&Client::new(), &server.base_url(), "app", "s3cret", "act.token")
            .await
            .unwrap_err();

        assert!(matches!(err, AdsError::HttpStatusError { status: 503, .. }));
    }
}
