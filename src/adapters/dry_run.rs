//! 試跑用的替身：不呼叫廣告平台、不回寫表格，只顯示哪些階段會被建立。

use crate::domain::model::{FormattedRow, TablePage};
use crate::domain::ports::{AdsApi, AdvertiserConfig, TableStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 以流水號產生假 ID 的廣告平台
#[derive(Debug, Default)]
pub struct PlanningApi {
    counter: AtomicUsize,
}

impl PlanningApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("planned-{}-{}", prefix, n)
    }
}

#[async_trait]
impl AdsApi for PlanningApi {
    async fn create_campaign(&self, _config: &AdvertiserConfig, row: &FormattedRow) -> Result<String> {
        let id = self.next_id("campaign");
        tracing::info!(
            "📝 [dry-run] Would create campaign '{}' as {}",
            row.campaign.name,
            id
        );
        Ok(id)
    }

    async fn create_adgroup(
        &self,
        _config: &AdvertiserConfig,
        campaign_id: &str,
        row: &FormattedRow,
    ) -> Result<String> {
        let id = self.next_id("adgroup");
        tracing::info!(
            "📝 [dry-run] Would create ad group '{}' under {} as {}",
            row.adgroup.name,
            campaign_id,
            id
        );
        Ok(id)
    }

    async fn create_ad(
        &self,
        _config: &AdvertiserConfig,
        adgroup_id: &str,
        row: &FormattedRow,
    ) -> Result<String> {
        let id = self.next_id("ad");
        tracing::info!(
            "📝 [dry-run] Would create ad '{}' under {} as {}",
            row.ad.name,
            adgroup_id,
            id
        );
        Ok(id)
    }
}

/// 照常讀取，但丟棄所有回寫
pub struct ReadOnlyTable<'a, T: TableStore + ?Sized> {
    inner: &'a T,
}

impl<'a, T: TableStore + ?Sized> ReadOnlyTable<'a, T> {
    pub fn new(inner: &'a T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: TableStore + ?Sized> TableStore for ReadOnlyTable<'_, T> {
    async fn read_rows(&self, page_token: Option<&str>, page_size: usize) -> Result<TablePage> {
        self.inner.read_rows(page_token, page_size).await
    }

    async fn write_back_fields(
        &self,
        record_id: &str,
        fields: &HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        tracing::info!(
            "📝 [dry-run] Skipping write-back of {} field(s) to {}",
            fields.len(),
            record_id
        );
        Ok(())
    }
}
