use crate::utils::error::{AdsError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ACCESS_TOKEN_PATH: &str = "/open_api/v1.3/oauth2/access_token/";

/// 授權碼換得的令牌
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub advertiser_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<TokenGrant>,
}

pub async fn exchange_auth_code(
    client: &Client,
    base_url: &str,
    app_id: &str,
    app_secret: &str,
    auth_code: &str,
) -> Result<TokenGrant> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), ACCESS_TOKEN_PATH);
    let body = serde_json::json!({
        "app_id": app_id,
        "secret": app_secret,
        "auth_code": auth_code,
        "grant_type": "authorization_code",
    });

    tracing::info!("🔑 Exchanging TikTok auth code for app {}", app_id);
    let response = client.post(&url).json(&body).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AdsError::HttpStatusError {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    let text = response.text().await?;
    let parsed: TokenResponse = serde_json::from_str(text.trim())?;

    match parsed {
        TokenResponse {
            code: 0,
            data: Some(grant),
            ..
        } => {
            tracing::info!(
                "✅ Access token granted for {} advertiser(s)",
                grant.advertiser_ids.len()
            );
            Ok(grant)
        }
        TokenResponse { code, message, .. } => Err(AdsError::RemoteError {
            service: "tiktok".to_string(),
            code,
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_exchange_auth_code_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/open_api/v1.3/oauth2/access_token/")
                .json_body_partial(r#"{"auth_code": "abc", "grant_type": "authorization_code"}"#);
            then.status(200).json_body(json!({
                "code": 0,
                "message": "OK",
                "data": {
                    "access_token": "act.token",
                    "refresh_token": "rft.token",
                    "expires_in": 86400,
                    "advertiser_ids": ["7000000000000000001"]
                }
            }));
        });

        let grant = exchange_auth_code(&Client::new(), &server.base_url(), "app", "secret", "abc")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(grant.access_token, "act.token");
        assert_eq!(grant.advertiser_ids, vec!["7000000000000000001"]);
    }

    #[tokio::test]
    async fn test_exchange_auth_code_business_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/open_api/v1.3/oauth2/access_token/");
            then.status(200)
                .json_body(json!({"code": 40105, "message": "auth_code expired"}));
        });

        let err = exchange_auth_code(&Client::new(), &server.base_url(), "app", "secret", "old")
            .await
            .unwrap_err();

        match err {
            AdsError::RemoteError { code, message, .. } => {
                assert_eq!(code, 40105);
                assert_eq!(message, "auth_code expired");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
