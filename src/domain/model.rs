use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 多維表格中的一筆原始記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub record_id: String,
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
}

/// 分頁讀取結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablePage {
    pub records: Vec<RawRow>,
    pub has_more: bool,
    pub page_token: Option<String>,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Campaign,
    AdGroup,
    Ad,
}

impl Stage {
    /// 寫回表格時使用的欄位名稱
    pub fn id_field(&self) -> &'static str {
        match self {
            Stage::Campaign => "系列ID",
            Stage::AdGroup => "组ID",
            Stage::Ad => "广告ID",
        }
    }

    pub fn progress_percent(&self) -> u8 {
        match self {
            Stage::Campaign => 33,
            Stage::AdGroup => 66,
            Stage::Ad => 100,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Campaign => write!(f, "campaign"),
            Stage::AdGroup => write!(f, "adgroup"),
            Stage::Ad => write!(f, "ad"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "AGE_18_24")]
    Age18To24,
    #[serde(rename = "AGE_25_34")]
    Age25To34,
    #[serde(rename = "AGE_35_44")]
    Age35To44,
    #[serde(rename = "AGE_45_54")]
    Age45To54,
    #[serde(rename = "AGE_55_100")]
    Age55To100,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    #[serde(rename = "GENDER_UNLIMITED")]
    Unlimited,
    #[serde(rename = "GENDER_MALE")]
    Male,
    #[serde(rename = "GENDER_FEMALE")]
    Female,
}

/// 一週 7 天 × 48 個半小時時段的投放時段字串
///
/// 只能透過 [`Dayparting::all_day`] 或 [`Dayparting::from_hour_range`] 建立，
/// 長度永遠是 336，且每個字元只會是 `'0'` 或 `'1'`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Dayparting(String);

impl Dayparting {
    pub const SLOTS_PER_DAY: usize = 48;
    pub const DAYS: usize = 7;
    pub const LEN: usize = Self::SLOTS_PER_DAY * Self::DAYS;

    pub fn all_day() -> Self {
        Self("1".repeat(Self::LEN))
    }

    pub fn never() -> Self {
        Self("0".repeat(Self::LEN))
    }

    /// `[start_hour*2, end_hour*2)` 的時段設為 `'1'`，超出一天範圍的部分截斷
    pub fn from_hour_range(start_hour: u32, end_hour: u32) -> Self {
        let start = (start_hour as usize * 2).min(Self::SLOTS_PER_DAY);
        let end = (end_hour as usize * 2).min(Self::SLOTS_PER_DAY);

        let day: String = (0..Self::SLOTS_PER_DAY)
            .map(|slot| if slot >= start && slot < end { '1' } else { '0' })
            .collect();

        Self(day.repeat(Self::DAYS))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Dayparting {
    fn default() -> Self {
        Self::all_day()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignParams {
    pub sequence: String,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdGroupParams {
    pub sequence: String,
    pub id: String,
    pub name: String,
    pub location_ids: Vec<String>,
    pub age_groups: Vec<AgeGroup>,
    pub gender: Gender,
    pub dayparting: Dayparting,
    pub bid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdParams {
    pub sequence: String,
    pub id: String,
    pub name: String,
    pub identity_id: String,
    pub tiktok_item_id: String,
}

/// 依建立階段分組後的記錄
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormattedRow {
    pub record_id: String,
    pub campaign: CampaignParams,
    pub adgroup: AdGroupParams,
    pub ad: AdParams,
}

/// 同一批次內跨記錄沿用的最近一次建立結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarryOverState {
    pub previous_campaign_id: String,
    pub previous_campaign_sequence: String,
    pub previous_adgroup_id: String,
    pub previous_adgroup_sequence: String,
}

impl CarryOverState {
    /// 只有本筆實際建立了系列或組時才更新對應的 ID 與序號
    pub fn advance(mut self, row: &FormattedRow, result: &PipelineResult) -> Self {
        if let Ok(campaign) = &result.campaign {
            if campaign.origin == IdOrigin::Created {
                self.previous_campaign_id = campaign.id.clone();
                self.previous_campaign_sequence = row.campaign.sequence.clone();
            }
        }
        if let Ok(adgroup) = &result.adgroup {
            if adgroup.origin == IdOrigin::Created {
                self.previous_adgroup_id = adgroup.id.clone();
                self.previous_adgroup_sequence = row.adgroup.sequence.clone();
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdOrigin {
    /// 表格中已填寫
    Existing,
    /// 沿用同批次前一筆建立的結果
    Reused,
    /// 本筆新建
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageId {
    pub id: String,
    pub origin: IdOrigin,
}

impl StageId {
    pub fn existing(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin: IdOrigin::Existing,
        }
    }

    pub fn reused(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin: IdOrigin::Reused,
        }
    }

    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin: IdOrigin::Created,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageError {
    #[error("{stage} creation failed: {message}")]
    CallFailed { stage: Stage, message: String },

    #[error("{stage} skipped due to upstream {upstream} failure")]
    Skipped { stage: Stage, upstream: Stage },
}

impl StageError {
    pub fn is_skipped(&self) -> bool {
        matches!(self, StageError::Skipped { .. })
    }
}

pub type StageOutcome = std::result::Result<StageId, StageError>;

/// 單筆記錄的執行結果，三個階段永遠都有值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub record_id: String,
    pub success: bool,
    pub campaign: StageOutcome,
    pub adgroup: StageOutcome,
    pub ad: StageOutcome,
    pub error: Option<String>,
    pub write_back_error: Option<String>,
}

impl PipelineResult {
    pub fn new(
        record_id: impl Into<String>,
        campaign: StageOutcome,
        adgroup: StageOutcome,
        ad: StageOutcome,
    ) -> Self {
        let error = [&campaign, &adgroup, &ad]
            .into_iter()
            .find_map(|outcome| outcome.as_ref().err().map(|e| e.to_string()));

        Self {
            record_id: record_id.into(),
            success: error.is_none(),
            campaign,
            adgroup,
            ad,
            error,
            write_back_error: None,
        }
    }

    pub fn outcome(&self, stage: Stage) -> &StageOutcome {
        match stage {
            Stage::Campaign => &self.campaign,
            Stage::AdGroup => &self.adgroup,
            Stage::Ad => &self.ad,
        }
    }

    /// 需要寫回表格的欄位，只包含成功取得的 ID
    pub fn write_back_fields(&self) -> HashMap<String, serde_json::Value> {
        [Stage::Campaign, Stage::AdGroup, Stage::Ad]
            .into_iter()
            .filter_map(|stage| match self.outcome(stage) {
                Ok(stage_id) if !stage_id.id.is_empty() => Some((
                    stage.id_field().to_string(),
                    serde_json::Value::String(stage_id.id.clone()),
                )),
                _ => None,
            })
            .collect()
    }
}
