//! 判斷系列與組要沿用既有 ID 還是重新建立。
//!
//! 優先順序固定：表格中已有的 ID > 同批次相同序號 > 新建。

use crate::domain::model::{AdGroupParams, AdParams, CampaignParams, CarryOverState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Existing(String),
    Reused(String),
    New,
}

pub fn resolve_campaign(campaign: &CampaignParams, carry: &CarryOverState) -> Resolution {
    if !campaign.id.is_empty() {
        return Resolution::Existing(campaign.id.clone());
    }

    if !campaign.sequence.is_empty() && campaign.sequence == carry.previous_campaign_sequence {
        return Resolution::Reused(carry.previous_campaign_id.clone());
    }

    Resolution::New
}

/// `campaign_id` 為 `None` 代表系列建立失敗
pub fn resolve_adgroup(
    campaign_id: Option<&str>,
    adgroup: &AdGroupParams,
    carry: &CarryOverState,
) -> Resolution {
    if !adgroup.id.is_empty() {
        return Resolution::Existing(adgroup.id.clone());
    }

    // 新系列底下一定是新組
    match campaign_id {
        Some(id) if id == carry.previous_campaign_id => {}
        _ => return Resolution::New,
    }

    if !adgroup.sequence.is_empty() && adgroup.sequence == carry.previous_adgroup_sequence {
        return Resolution::Reused(carry.previous_adgroup_id.clone());
    }

    Resolution::New
}

pub fn resolve_ad(ad: &AdParams) -> Resolution {
    if ad.id.is_empty() {
        Resolution::New
    } else {
        Resolution::Existing(ad.id.clone())
    }
}
