use crate::domain::model::Stage;
use crate::domain::ports::{JsonResponse, JsonTransport};
use crate::utils::error::{AdsError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_RETRY_DELAY_SECONDS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// 固定間隔的重試設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECONDS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// 測試用：不等待
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

/// 成功送達的回應與實際花費的嘗試次數
#[derive(Debug, Clone, PartialEq)]
pub struct Delivered {
    pub body: serde_json::Value,
    pub attempts: u32,
}

/// 每個請求都有逾時，卡住的連線會當成一次失敗的嘗試
pub fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// 以 reqwest 實作的單次 JSON POST
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(build_client(timeout)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JsonTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<JsonResponse> {
        let mut request = self.client.post(url).json(body);
        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        tracing::debug!("📡 POST {} -> {}", url, status);

        if (200..300).contains(&status) {
            let body = serde_json::from_str(&text)?;
            Ok(JsonResponse { status, body })
        } else {
            // 錯誤回應不一定是 JSON，保留原文
            let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
            Ok(JsonResponse { status, body })
        }
    }
}

/// 依重試設定送出 POST
///
/// 連線失敗、非 2xx、回應無法解析時等待後重試；用完次數回傳
/// [`AdsError::StageCallError`]。其他錯誤直接回傳。
pub async fn post_with_retry<T: JsonTransport + ?Sized>(
    transport: &T,
    policy: &RetryPolicy,
    stage: Stage,
    url: &str,
    headers: &[(&str, &str)],
    body: &serde_json::Value,
) -> Result<Delivered> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        let error = match transport.post_json(url, headers, body).await {
            Ok(response) if response.is_success() => {
                return Ok(Delivered {
                    body: response.body,
                    attempts: attempt,
                });
            }
            Ok(response) => AdsError::HttpStatusError {
                status: response.status,
                body: response.body.to_string(),
            },
            Err(e) if e.is_retryable() => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            "⚠️ {} request attempt {}/{} failed: {}",
            stage,
            attempt,
            max_attempts,
            error
        );
        last_error = error.to_string();

        if attempt < max_attempts && !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(AdsError::StageCallError {
        stage,
        attempts: max_attempts,
        message: last_error,
    })
}
