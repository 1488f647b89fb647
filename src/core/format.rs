//! 把多維表格的中文欄位整理成各建立階段需要的參數。
//!
//! 這一層不會失敗：無法對應的值一律換成預設值，並只記一條警告日誌。

use crate::domain::model::{
    AdGroupParams, AdParams, AgeGroup, CampaignParams, Dayparting, FormattedRow, Gender, RawRow,
};
use serde_json::Value;

pub const FIELD_CAMPAIGN_SEQUENCE: &str = "系列序号";
pub const FIELD_CAMPAIGN_ID: &str = "系列ID";
pub const FIELD_CAMPAIGN_NAME: &str = "系列名称";
pub const FIELD_ADGROUP_SEQUENCE: &str = "组序号";
pub const FIELD_ADGROUP_ID: &str = "组ID";
pub const FIELD_ADGROUP_NAME: &str = "组名称";
pub const FIELD_COUNTRY: &str = "国家";
pub const FIELD_AGE: &str = "年龄";
pub const FIELD_GENDER: &str = "性别";
pub const FIELD_DAYPARTING: &str = "投放时段";
pub const FIELD_BID: &str = "出价";
pub const FIELD_AD_SEQUENCE: &str = "广告序号";
pub const FIELD_AD_ID: &str = "广告ID";
pub const FIELD_AD_NAME: &str = "广告名称";
pub const FIELD_IDENTITY_ID: &str = "identity_id";
pub const FIELD_TIKTOK_ITEM_ID: &str = "tiktok_item_id";

const ALL_DAY: &str = "全天";

const LOCATION_US: &str = "6252001";
const LOCATION_CA: &str = "6251999";

pub fn format_row(row: &RawRow) -> FormattedRow {
    let campaign = CampaignParams {
        sequence: scalar_text(row, FIELD_CAMPAIGN_SEQUENCE),
        id: scalar_text(row, FIELD_CAMPAIGN_ID),
        name: rich_text(row, FIELD_CAMPAIGN_NAME),
    };

    let adgroup = AdGroupParams {
        sequence: scalar_text(row, FIELD_ADGROUP_SEQUENCE),
        id: scalar_text(row, FIELD_ADGROUP_ID),
        name: rich_text(row, FIELD_ADGROUP_NAME),
        location_ids: location_ids(&rich_text(row, FIELD_COUNTRY)),
        age_groups: age_groups(&rich_text(row, FIELD_AGE)),
        gender: gender(&rich_text(row, FIELD_GENDER)),
        dayparting: dayparting(&rich_text(row, FIELD_DAYPARTING)),
        bid: scalar_text(row, FIELD_BID),
    };

    let ad = AdParams {
        sequence: scalar_text(row, FIELD_AD_SEQUENCE),
        id: scalar_text(row, FIELD_AD_ID),
        name: rich_text(row, FIELD_AD_NAME),
        identity_id: rich_text(row, FIELD_IDENTITY_ID),
        tiktok_item_id: rich_text(row, FIELD_TIKTOK_ITEM_ID),
    };

    FormattedRow {
        record_id: row.record_id.clone(),
        campaign,
        adgroup,
        ad,
    }
}

/// 文字欄位的值是 `[{"text": "...", "type": "text"}]`，只取第一段
fn rich_text(row: &RawRow, field: &str) -> String {
    match row.fields.get(field) {
        Some(Value::Array(segments)) => segments
            .first()
            .and_then(|segment| segment.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(text)) => text.clone(),
        _ => String::new(),
    }
}

/// 序號、ID、出價等欄位可能是字串或數字
fn scalar_text(row: &RawRow, field: &str) -> String {
    match row.fields.get(field) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number_text(number),
        Some(Value::Array(_)) => rich_text(row, field),
        _ => String::new(),
    }
}

fn number_text(number: &serde_json::Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    match number.as_f64() {
        Some(float) if float.fract() == 0.0 && float.abs() < 1e15 => format!("{}", float as i64),
        _ => number.to_string(),
    }
}

pub fn location_ids(country: &str) -> Vec<String> {
    match country {
        "CA" => vec![LOCATION_CA.to_string()],
        "US&CA" => vec![LOCATION_US.to_string(), LOCATION_CA.to_string()],
        _ => vec![LOCATION_US.to_string()],
    }
}

pub fn age_groups(code: &str) -> Vec<AgeGroup> {
    use AgeGroup::*;

    let groups: &[AgeGroup] = match code {
        "1855" => &[Age18To24, Age25To34, Age35To44, Age45To54, Age55To100],
        "1854" => &[Age18To24, Age25To34, Age35To44, Age45To54],
        "1844" => &[Age18To24, Age25To34, Age35To44],
        "1834" => &[Age18To24, Age25To34],
        "1824" => &[Age18To24],
        "2555" => &[Age25To34, Age35To44, Age45To54, Age55To100],
        "2554" => &[Age25To34, Age35To44, Age45To54],
        "2544" => &[Age25To34, Age35To44],
        "2534" => &[Age25To34],
        "3555" => &[Age35To44, Age45To54, Age55To100],
        "3554" => &[Age35To44, Age45To54],
        "3544" => &[Age35To44],
        "4555" => &[Age45To54, Age55To100],
        "4554" => &[Age45To54],
        "5500" => &[Age55To100],
        "" => &[],
        _ => {
            tracing::warn!("⚠️ Unmapped age code '{}', using no age restriction", code);
            &[]
        }
    };

    groups.to_vec()
}

pub fn gender(text: &str) -> Gender {
    match text {
        "不限" => Gender::Unlimited,
        "男性" => Gender::Male,
        "女性" => Gender::Female,
        "" => Gender::Unlimited,
        other => {
            tracing::warn!("⚠️ Unmapped gender '{}', defaulting to unlimited", other);
            Gender::Unlimited
        }
    }
}

/// `全天` 或 `HHHH`（開始小時 + 結束小時）
pub fn dayparting(text: &str) -> Dayparting {
    // 表格文字常帶結尾換行或空白
    let text = text.trim();
    if text.is_empty() || text == ALL_DAY {
        return Dayparting::all_day();
    }

    let hours = text
        .get(..2)
        .zip(text.get(2..))
        .and_then(|(start, end)| Some((start.parse::<u32>().ok()?, end.parse::<u32>().ok()?)));

    match hours {
        Some((start, end)) => Dayparting::from_hour_range(start, end),
        None => {
            tracing::warn!("⚠️ Unparsable dayparting '{}', no delivery slots set", text);
            Dayparting::never()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn text_cell(text: &str) -> Value {
        json!([{ "text": text, "type": "text" }])
    }

    fn raw_row(fields: Vec<(&str, Value)>) -> RawRow {
        RawRow {
            record_id: "recTest001".to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_format_full_row() {
        let row = raw_row(vec![
            (FIELD_CAMPAIGN_SEQUENCE, json!("1")),
            (FIELD_CAMPAIGN_NAME, text_cell("Spring Campaign")),
            (FIELD_ADGROUP_SEQUENCE, json!(2)),
            (FIELD_ADGROUP_NAME, text_cell("Group A")),
            (FIELD_COUNTRY, text_cell("US&CA")),
            (FIELD_AGE, text_cell("2544")),
            (FIELD_GENDER, text_cell("女性")),
            (FIELD_DAYPARTING, text_cell("0622")),
            (FIELD_BID, json!(1.5)),
            (FIELD_AD_NAME, text_cell("Ad 1")),
            (FIELD_IDENTITY_ID, text_cell("identity-1")),
            (FIELD_TIKTOK_ITEM_ID, text_cell("7300000000000000001")),
        ]);

        let formatted = format_row(&row);

        assert_eq!(formatted.record_id, "recTest001");
        assert_eq!(formatted.campaign.sequence, "1");
        assert_eq!(formatted.campaign.id, "");
        assert_eq!(formatted.campaign.name, "Spring Campaign");
        assert_eq!(formatted.adgroup.sequence, "2");
        assert_eq!(formatted.adgroup.location_ids, vec!["6252001", "6251999"]);
        assert_eq!(
            formatted.adgroup.age_groups,
            vec![AgeGroup::Age25To34, AgeGroup::Age35To44]
        );
        assert_eq!(formatted.adgroup.gender, Gender::Female);
        assert_eq!(formatted.adgroup.bid, "1.5");
        assert_eq!(formatted.ad.identity_id, "identity-1");
        assert_eq!(formatted.ad.tiktok_item_id, "7300000000000000001");
    }

    #[test]
    fn test_format_empty_row_uses_defaults() {
        let formatted = format_row(&raw_row(vec![]));

        assert_eq!(formatted.campaign, CampaignParams::default());
        assert_eq!(formatted.adgroup.location_ids, vec!["6252001"]);
        assert!(formatted.adgroup.age_groups.is_empty());
        assert_eq!(formatted.adgroup.gender, Gender::Unlimited);
        assert_eq!(formatted.adgroup.dayparting, Dayparting::all_day());
    }

    #[test]
    fn test_existing_ids_are_read() {
        let row = raw_row(vec![
            (FIELD_CAMPAIGN_ID, json!("1790000000000001")),
            (FIELD_ADGROUP_ID, json!("1790000000000002")),
            (FIELD_AD_ID, json!("1790000000000003")),
        ]);

        let formatted = format_row(&row);
        assert_eq!(formatted.campaign.id, "1790000000000001");
        assert_eq!(formatted.adgroup.id, "1790000000000002");
        assert_eq!(formatted.ad.id, "1790000000000003");
    }

    #[test]
    fn test_location_ids() {
        assert_eq!(location_ids("CA"), vec!["6251999"]);
        assert_eq!(location_ids("US&CA"), vec!["6252001", "6251999"]);
        assert_eq!(location_ids("US"), vec!["6252001"]);
        assert_eq!(location_ids(""), vec!["6252001"]);
    }

    #[test]
    fn test_age_groups_known_codes() {
        assert_eq!(age_groups("1855").len(), 5);
        assert_eq!(age_groups("1824"), vec![AgeGroup::Age18To24]);
        assert_eq!(age_groups("5500"), vec![AgeGroup::Age55To100]);
        assert_eq!(
            age_groups("4555"),
            vec![AgeGroup::Age45To54, AgeGroup::Age55To100]
        );
    }

    #[test]
    fn test_unmapped_age_codes_are_empty() {
        for code in ["", "1800", "9999", "18-55", "185", "abcd", "18555"] {
            assert!(age_groups(code).is_empty(), "code {code:?} should map to nothing");
        }
    }

    #[test]
    fn test_gender_mapping() {
        assert_eq!(gender("不限"), Gender::Unlimited);
        assert_eq!(gender("男性"), Gender::Male);
        assert_eq!(gender("女性"), Gender::Female);
        assert_eq!(gender("其他"), Gender::Unlimited);
    }

    #[test]
    fn test_dayparting_all_day() {
        let value = dayparting("全天");
        assert_eq!(value.as_str().len(), 336);
        assert!(value.as_str().chars().all(|c| c == '1'));
    }

    #[test]
    fn test_dayparting_hour_range() {
        let value = dayparting("0622");
        let text = value.as_str();
        assert_eq!(text.len(), 336);

        let expected_day: String = (0..48)
            .map(|slot| if (12..44).contains(&slot) { '1' } else { '0' })
            .collect();
        assert_eq!(text, expected_day.repeat(7));
    }

    #[test]
    fn test_dayparting_ignores_surrounding_whitespace() {
        for text in ["0622\n", "0622 ", " 0622", "\t0622\r\n"] {
            assert_eq!(dayparting(text), dayparting("0622"), "input {text:?}");
        }
        let ones = dayparting("0622\n")
            .as_str()
            .chars()
            .filter(|c| *c == '1')
            .count();
        assert_eq!(ones, 32 * 7);
        assert_eq!(dayparting("全天\n"), Dayparting::all_day());
    }

    #[test]
    fn test_dayparting_unparsable_is_empty_schedule() {
        let value = dayparting("morning");
        assert_eq!(value.as_str().len(), 336);
        assert!(value.as_str().chars().all(|c| c == '0'));
    }
}
