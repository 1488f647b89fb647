use crate::core::reuse::{resolve_ad, resolve_adgroup, resolve_campaign, Resolution};
use crate::domain::model::{
    CarryOverState, FormattedRow, PipelineResult, Stage, StageError, StageId, StageOutcome,
};
use crate::domain::ports::{AdsApi, AdvertiserConfig, ProgressEvent, ProgressSink};
use crate::utils::error::AdsError;

/// 單筆記錄的 系列 → 組 → 廣告 建立流程
///
/// 上游階段失敗後，下游階段一律標記為跳過且不會發出請求；
/// 回傳結果的三個階段都一定有值。
pub struct RowPipeline<'a, A: AdsApi + ?Sized> {
    api: &'a A,
    config: &'a AdvertiserConfig,
    progress: &'a dyn ProgressSink,
}

impl<'a, A: AdsApi + ?Sized> RowPipeline<'a, A> {
    pub fn new(api: &'a A, config: &'a AdvertiserConfig, progress: &'a dyn ProgressSink) -> Self {
        Self {
            api,
            config,
            progress,
        }
    }

    pub async fn run(
        &self,
        index: usize,
        row: &FormattedRow,
        carry: &CarryOverState,
    ) -> PipelineResult {
        let campaign = self.campaign_stage(index, row, carry).await;
        let adgroup = self.adgroup_stage(index, row, carry, &campaign).await;
        let ad = self.ad_stage(index, row, &campaign, &adgroup).await;

        let result = PipelineResult::new(row.record_id.clone(), campaign, adgroup, ad);
        if result.success {
            tracing::info!("✅ Record {} created", row.record_id);
        } else {
            tracing::error!(
                "❌ Record {} failed: {} (campaign: {}, adgroup: {}, ad: {})",
                row.record_id,
                result.error.as_deref().unwrap_or("unknown"),
                row.campaign.name,
                row.adgroup.name,
                row.ad.name
            );
        }
        result
    }

    async fn campaign_stage(
        &self,
        index: usize,
        row: &FormattedRow,
        carry: &CarryOverState,
    ) -> StageOutcome {
        match resolve_campaign(&row.campaign, carry) {
            Resolution::Existing(id) => Ok(StageId::existing(id)),
            Resolution::Reused(id) => {
                tracing::debug!("♻️ Reusing campaign {} (sequence {})", id, row.campaign.sequence);
                Ok(StageId::reused(id))
            }
            Resolution::New => {
                self.stage_started(index, Stage::Campaign);
                tracing::info!("📡 Creating campaign '{}'", row.campaign.name);
                self.api
                    .create_campaign(self.config, row)
                    .await
                    .map(StageId::created)
                    .map_err(|e| call_failed(Stage::Campaign, e))
            }
        }
    }

    async fn adgroup_stage(
        &self,
        index: usize,
        row: &FormattedRow,
        carry: &CarryOverState,
        campaign: &StageOutcome,
    ) -> StageOutcome {
        let campaign_id = campaign.as_ref().ok().map(|c| c.id.as_str());

        match resolve_adgroup(campaign_id, &row.adgroup, carry) {
            Resolution::Existing(id) => Ok(StageId::existing(id)),
            Resolution::Reused(id) => {
                tracing::debug!("♻️ Reusing adgroup {} (sequence {})", id, row.adgroup.sequence);
                Ok(StageId::reused(id))
            }
            Resolution::New => match campaign_id {
                Some(campaign_id) => {
                    self.stage_started(index, Stage::AdGroup);
                    tracing::info!(
                        "📡 Creating adgroup '{}' under campaign {}",
                        row.adgroup.name,
                        campaign_id
                    );
                    self.api
                        .create_adgroup(self.config, campaign_id, row)
                        .await
                        .map(StageId::created)
                        .map_err(|e| call_failed(Stage::AdGroup, e))
                }
                None => {
                    tracing::warn!("⏭️ Skipping adgroup: campaign failed");
                    Err(StageError::Skipped {
                        stage: Stage::AdGroup,
                        upstream: Stage::Campaign,
                    })
                }
            },
        }
    }

    async fn ad_stage(
        &self,
        index: usize,
        row: &FormattedRow,
        campaign: &StageOutcome,
        adgroup: &StageOutcome,
    ) -> StageOutcome {
        let adgroup_id = match (campaign, adgroup) {
            (Ok(_), Ok(adgroup)) => adgroup.id.as_str(),
            (Err(_), _) => return skip_ad(Stage::Campaign),
            (Ok(_), Err(_)) => return skip_ad(Stage::AdGroup),
        };

        match resolve_ad(&row.ad) {
            Resolution::Existing(id) | Resolution::Reused(id) => Ok(StageId::existing(id)),
            Resolution::New => {
                self.stage_started(index, Stage::Ad);
                tracing::info!("📡 Creating ad '{}' under adgroup {}", row.ad.name, adgroup_id);
                self.api
                    .create_ad(self.config, adgroup_id, row)
                    .await
                    .map(StageId::created)
                    .map_err(|e| call_failed(Stage::Ad, e))
            }
        }
    }

    fn stage_started(&self, index: usize, stage: Stage) {
        self.progress.on_event(ProgressEvent::StageStarted {
            index,
            stage,
            percent: stage.progress_percent(),
        });
    }
}

fn skip_ad(upstream: Stage) -> StageOutcome {
    tracing::warn!("⏭️ Skipping ad: {} did not succeed", upstream);
    Err(StageError::Skipped {
        stage: Stage::Ad,
        upstream,
    })
}

fn call_failed(stage: Stage, error: AdsError) -> StageError {
    let message = match error {
        AdsError::StageCallError { message, .. } => message,
        other => other.to_string(),
    };
    StageError::CallFailed { stage, message }
}
