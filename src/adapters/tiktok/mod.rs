//! TikTok Business API 的系列、組、廣告建立呼叫。

pub mod advertiser;
pub mod auth;

use crate::adapters::http::{post_with_retry, Delivered, ReqwestTransport, RetryPolicy};
use crate::domain::model::{FormattedRow, Stage};
use crate::domain::ports::{AdsApi, AdvertiserConfig, JsonTransport};
use crate::utils::error::{AdsError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://business-api.tiktok.com";
pub const DEFAULT_IDENTITY_AUTHORIZED_BC_ID: &str = "7049325583804661762";

const CAMPAIGN_PATH: &str = "/open_api/v1.3/campaign/create/";
const ADGROUP_PATH: &str = "/open_api/v1.3/adgroup/create/";
const AD_PATH: &str = "/open_api/v1.3/ad/create/";

const ADGROUP_DAILY_BUDGET: f64 = 20.0;

pub struct TiktokClient<T: JsonTransport = ReqwestTransport> {
    transport: T,
    base_url: String,
    retry: RetryPolicy,
    identity_authorized_bc_id: String,
}

impl TiktokClient<ReqwestTransport> {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self::with_transport(ReqwestTransport::new(timeout)?, base_url))
    }
}

impl<T: JsonTransport> TiktokClient<T> {
    pub fn with_transport(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
            identity_authorized_bc_id: DEFAULT_IDENTITY_AUTHORIZED_BC_ID.to_string(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_identity_authorized_bc_id(mut self, bc_id: impl Into<String>) -> Self {
        self.identity_authorized_bc_id = bc_id.into();
        self
    }

    async fn create(
        &self,
        stage: Stage,
        path: &str,
        config: &AdvertiserConfig,
        payload: &Value,
    ) -> Result<Delivered> {
        let url = format!("{}{}", self.base_url, path);
        let headers = [
            ("Access-Token", config.access_token.as_str()),
            ("Content-Type", "application/json"),
        ];

        tracing::debug!("📤 Creating {} with payload: {}", stage, payload);
        post_with_retry(&self.transport, &self.retry, stage, &url, &headers, payload).await
    }
}

#[async_trait]
impl<T: JsonTransport> AdsApi for TiktokClient<T> {
    async fn create_campaign(&self, config: &AdvertiserConfig, row: &FormattedRow) -> Result<String> {
        let payload = campaign_payload(config, row);
        let delivered = self
            .create(Stage::Campaign, CAMPAIGN_PATH, config, &payload)
            .await?;
        let id = extract_id(Stage::Campaign, &delivered, "/data/campaign_id")?;
        tracing::info!("✅ Campaign created: {}", id);
        Ok(id)
    }

    async fn create_adgroup(
        &self,
        config: &AdvertiserConfig,
        campaign_id: &str,
        row: &FormattedRow,
    ) -> Result<String> {
        let payload = adgroup_payload(config, campaign_id, row, Utc::now());
        let delivered = self
            .create(Stage::AdGroup, ADGROUP_PATH, config, &payload)
            .await?;
        let id = extract_id(Stage::AdGroup, &delivered, "/data/adgroup_id")?;
        tracing::info!("✅ Ad group created: {} (campaign {})", id, campaign_id);
        Ok(id)
    }

    async fn create_ad(
        &self,
        config: &AdvertiserConfig,
        adgroup_id: &str,
        row: &FormattedRow,
    ) -> Result<String> {
        let payload = ad_payload(config, adgroup_id, row, &self.identity_authorized_bc_id);
        let delivered = self.create(Stage::Ad, AD_PATH, config, &payload).await?;
        let id = extract_id(Stage::Ad, &delivered, "/data/ad_ids/0")?;
        tracing::info!("✅ Ad created: {} (ad group {})", id, adgroup_id);
        Ok(id)
    }
}

pub fn campaign_payload(config: &AdvertiserConfig, row: &FormattedRow) -> Value {
    json!({
        "advertiser_id": config.advertiser_id,
        "budget_mode": "BUDGET_MODE_INFINITE",
        "objective_type": "ENGAGEMENT",
        "operation_status": "DISABLE",
        "campaign_name": row.campaign.name,
    })
}

pub fn adgroup_payload(
    config: &AdvertiserConfig,
    campaign_id: &str,
    row: &FormattedRow,
    now: DateTime<Utc>,
) -> Value {
    let adgroup = &row.adgroup;
    let bid_type = if adgroup.bid == "0" {
        "BID_TYPE_NO_BID"
    } else {
        "BID_TYPE_CUSTOM"
    };

    json!({
        "advertiser_id": config.advertiser_id,
        "campaign_id": campaign_id,
        "adgroup_name": adgroup.name,
        "placements": ["PLACEMENT_TIKTOK"],
        "comment_disabled": false,
        "video_download_disabled": false,
        "location_ids": adgroup.location_ids,
        "gender": adgroup.gender,
        "age_groups": adgroup.age_groups,
        "budget_mode": "BUDGET_MODE_DAY",
        "budget": ADGROUP_DAILY_BUDGET,
        "schedule_type": "SCHEDULE_FROM_NOW",
        "schedule_start_time": now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "dayparting": adgroup.dayparting,
        "optimization_goal": "FOLLOWERS",
        "bid_type": bid_type,
        "conversion_bid_price": adgroup.bid,
        "billing_event": "OCPM",
        "pacing": "PACING_MODE_SMOOTH",
        "operation_status": "ENABLE",
    })
}

pub fn ad_payload(
    config: &AdvertiserConfig,
    adgroup_id: &str,
    row: &FormattedRow,
    identity_authorized_bc_id: &str,
) -> Value {
    let ad = &row.ad;
    json!({
        "advertiser_id": config.advertiser_id,
        "adgroup_id": adgroup_id,
        "creatives": [{
            "ad_name": ad.name,
            "identity_type": "BC_AUTH_TT",
            "identity_id": ad.identity_id,
            "identity_authorized_bc_id": identity_authorized_bc_id,
            "dynamic_destination": "UNSET",
            "ad_format": "SINGLE_VIDEO",
            "tiktok_item_id": ad.tiktok_item_id,
            "creative_authorized": false,
        }],
    })
}

/// 2xx 但沒有 ID 視為業務錯誤，不重試
fn extract_id(stage: Stage, delivered: &Delivered, pointer: &str) -> Result<String> {
    let id = match delivered.body.pointer(pointer) {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };

    id.ok_or_else(|| {
        let message = delivered
            .body
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or("unknown")
            .to_string();
        let code = delivered.body.get("code").cloned().unwrap_or_default();
        tracing::error!("❌ {} creation rejected (code {}): {}", stage, code, message);
        AdsError::StageCallError {
            stage,
            attempts: delivered.attempts,
            message,
        }
    })
}
