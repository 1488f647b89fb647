use crate::core::format::format_row;
use crate::core::orchestrator::RowPipeline;
use crate::domain::model::{CarryOverState, PipelineResult, RawRow};
use crate::domain::ports::{AdsApi, AdvertiserConfig, ProgressEvent, ProgressSink, TableStore};
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_record_id, Validate};
use serde::Serialize;

impl Validate for AdvertiserConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("tiktok.access_token", &self.access_token)?;
        validate_non_empty_string("tiktok.advertiser_id", &self.advertiser_id)?;
        Ok(())
    }
}

/// 批次執行摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: Vec<PipelineResult>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    fn from_results(results: Vec<PipelineResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        let failed = results.len() - succeeded;
        Self {
            results,
            succeeded,
            failed,
        }
    }
}

/// 依 `page_token` 讀完所有分頁，保留表格順序
pub async fn read_all_rows<T: TableStore + ?Sized>(table: &T, page_size: usize) -> Result<Vec<RawRow>> {
    let mut rows = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = table.read_rows(page_token.as_deref(), page_size).await?;
        rows.extend(page.records);

        match page.page_token {
            // 同一個 token 再讀只會拿到同一頁
            Some(token) if page.has_more && page_token.as_deref() == Some(token.as_str()) => {
                tracing::warn!("⚠️ Table returned page token '{}' twice, stop paging", token);
                break;
            }
            Some(token) if page.has_more => page_token = Some(token),
            _ => break,
        }
    }

    tracing::info!("📥 Loaded {} record(s) from table", rows.len());
    Ok(rows)
}

/// 只保留指定的記錄；未指定時全部保留
pub fn select_records(rows: Vec<RawRow>, record_ids: &[String]) -> Result<Vec<RawRow>> {
    if record_ids.is_empty() {
        return Ok(rows);
    }

    for id in record_ids {
        validate_record_id(id)?;
        if !rows.iter().any(|row| &row.record_id == id) {
            tracing::warn!("⚠️ Record {} not found in table, ignoring", id);
        }
    }

    Ok(rows
        .into_iter()
        .filter(|row| record_ids.contains(&row.record_id))
        .collect())
}

/// 逐筆執行建立流程並寫回表格
///
/// 記錄永遠依傳入順序、一次一筆地處理。沿用狀態只存在於單次 [`BatchDriver::run`]
/// 之內，以 fold 的方式在記錄之間傳遞。
pub struct BatchDriver<'a, A: AdsApi + ?Sized, T: TableStore + ?Sized> {
    api: &'a A,
    table: &'a T,
    progress: &'a dyn ProgressSink,
}

impl<'a, A: AdsApi + ?Sized, T: TableStore + ?Sized> BatchDriver<'a, A, T> {
    pub fn new(api: &'a A, table: &'a T) -> Self {
        Self {
            api,
            table,
            progress: &(),
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(&self, config: &AdvertiserConfig, rows: &[RawRow]) -> Result<BatchReport> {
        // 配置錯誤直接中止整個批次，不處理任何記錄
        config.validate()?;

        let total = rows.len();
        tracing::info!("🚀 Starting batch creation for {} record(s)", total);
        self.progress.on_event(ProgressEvent::BatchStarted { total });

        let pipeline = RowPipeline::new(self.api, config, self.progress);
        let mut carry = CarryOverState::default();
        let mut results = Vec::with_capacity(total);

        for (index, row) in rows.iter().enumerate() {
            self.progress.on_event(ProgressEvent::RowStarted {
                index,
                total,
                record_id: row.record_id.clone(),
            });

            let (next, result) = self.process_row(&pipeline, index, carry, row).await;
            carry = next;

            self.progress.on_event(ProgressEvent::RowFinished {
                index,
                success: result.success,
            });
            results.push(result);
        }

        let report = BatchReport::from_results(results);
        tracing::info!(
            "📊 Batch finished - total: {}, succeeded: {}, failed: {}",
            total,
            report.succeeded,
            report.failed
        );
        self.progress.on_event(ProgressEvent::BatchFinished {
            succeeded: report.succeeded,
            failed: report.failed,
        });

        Ok(report)
    }

    /// 單筆處理：傳入目前的沿用狀態，回傳下一個狀態與本筆結果
    pub async fn process_row(
        &self,
        pipeline: &RowPipeline<'_, A>,
        index: usize,
        carry: CarryOverState,
        row: &RawRow,
    ) -> (CarryOverState, PipelineResult) {
        let formatted = format_row(row);
        let mut result = pipeline.run(index, &formatted, &carry).await;
        let next = carry.advance(&formatted, &result);

        // 即使本筆失敗，已取得的 ID 也要寫回
        let fields = result.write_back_fields();
        if fields.is_empty() {
            tracing::debug!("Record {} has nothing to write back", row.record_id);
        } else if let Err(e) = self.table.write_back_fields(&row.record_id, &fields).await {
            tracing::error!("❌ Write-back failed for record {}: {}", row.record_id, e);
            result.write_back_error = Some(e.to_string());
        } else {
            tracing::debug!(
                "💾 Wrote back {} field(s) to record {}",
                fields.len(),
                row.record_id
            );
        }

        (next, result)
    }
}
