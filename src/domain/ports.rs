use crate::domain::model::{FormattedRow, Stage, TablePage};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 一次建立請求共用的帳戶設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertiserConfig {
    pub access_token: String,
    pub advertiser_id: String,
}

/// 單次 HTTP 回應：狀態碼與解析後的 JSON
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl JsonResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 單次 POST，不包含重試
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<JsonResponse>;
}

/// 廣告平台的三個建立階段
#[async_trait]
pub trait AdsApi: Send + Sync {
    async fn create_campaign(&self, config: &AdvertiserConfig, row: &FormattedRow)
        -> Result<String>;

    async fn create_adgroup(
        &self,
        config: &AdvertiserConfig,
        campaign_id: &str,
        row: &FormattedRow,
    ) -> Result<String>;

    async fn create_ad(
        &self,
        config: &AdvertiserConfig,
        adgroup_id: &str,
        row: &FormattedRow,
    ) -> Result<String>;
}

/// 資料表的讀取與回寫
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn read_rows(&self, page_token: Option<&str>, page_size: usize) -> Result<TablePage>;

    async fn write_back_fields(
        &self,
        record_id: &str,
        fields: &HashMap<String, serde_json::Value>,
    ) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    BatchStarted {
        total: usize,
    },
    RowStarted {
        index: usize,
        total: usize,
        record_id: String,
    },
    StageStarted {
        index: usize,
        stage: Stage,
        percent: u8,
    },
    RowFinished {
        index: usize,
        success: bool,
    },
    BatchFinished {
        succeeded: usize,
        failed: usize,
    },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

impl ProgressSink for () {
    fn on_event(&self, _event: ProgressEvent) {}
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for tokio::sync::mpsc::UnboundedSender<ProgressEvent> {
    fn on_event(&self, event: ProgressEvent) {
        // 接收端已關閉時直接丟棄
        let _ = self.send(event);
    }
}
