use crate::utils::error::{AdsError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(AdsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AdsError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AdsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| AdsError::MissingConfigError {
        field: field_name.to_string(),
    })
}

/// 空字串視為缺少配置，與未填寫相同
pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AdsError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AdsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 多維表格的記錄 ID 一律以 `rec` 開頭
pub fn validate_record_id(record_id: &str) -> Result<()> {
    if record_id.is_empty() {
        return Err(AdsError::ValidationError {
            message: "record_id cannot be empty".to_string(),
        });
    }
    if !record_id.starts_with("rec") {
        return Err(AdsError::ValidationError {
            message: format!("Malformed record_id: {}", record_id),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("feishu.base_url", "https://open.feishu.cn").is_ok());
        assert!(validate_url("feishu.base_url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("feishu.base_url", "").is_err());
        assert!(validate_url("feishu.base_url", "invalid-url").is_err());
        assert!(validate_url("feishu.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_non_empty_string_reports_missing_field() {
        let err = validate_non_empty_string("tiktok.advertiser_id", "  ").unwrap_err();
        assert!(matches!(err, AdsError::MissingConfigError { field } if field == "tiktok.advertiser_id"));
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("feishu.page_size", 100, 1, 500).is_ok());
        assert!(validate_range("feishu.page_size", 0, 1, 500).is_err());
        assert!(validate_range("feishu.page_size", 501, 1, 500).is_err());
    }

    #[test]
    fn test_validate_record_id() {
        assert!(validate_record_id("recuXyZ123").is_ok());
        assert!(validate_record_id("").is_err());
        assert!(validate_record_id("row-1").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("cli_a1b2".to_string());
        let absent: Option<String> = None;
        assert_eq!(validate_required_field("tiktok.app_id", &present).unwrap(), "cli_a1b2");
        assert!(validate_required_field("tiktok.app_id", &absent).is_err());
    }
}
