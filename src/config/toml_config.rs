use crate::adapters::feishu::{self, FeishuSettings};
use crate::adapters::http::{
    RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT_SECONDS, DEFAULT_RETRY_DELAY_SECONDS,
};
use crate::adapters::tiktok;
use crate::domain::ports::AdvertiserConfig;
use crate::utils::error::{AdsError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub feishu: FeishuConfig,
    pub tiktok: TiktokConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeishuConfig {
    pub app_id: String,
    pub app_secret: String,
    pub app_token: String,
    pub table_id: String,
    pub view_id: Option<String>,
    pub page_size: Option<usize>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiktokConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub advertiser_id: String,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub base_url: Option<String>,
    pub identity_authorized_bc_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,
    /// 單次請求的逾時
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_delay_seconds() -> u64 {
    DEFAULT_RETRY_DELAY_SECONDS
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECONDS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_seconds: DEFAULT_RETRY_DELAY_SECONDS,
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AdsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TIKTOK_ACCESS_TOKEN})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| AdsError::config(format!("Invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn advertiser_config(&self) -> AdvertiserConfig {
        AdvertiserConfig {
            access_token: self.tiktok.access_token.clone(),
            advertiser_id: self.tiktok.advertiser_id.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_secs(self.retry.delay_seconds),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.retry.timeout_seconds)
    }

    pub fn feishu_settings(&self) -> FeishuSettings {
        FeishuSettings {
            base_url: self
                .feishu
                .base_url
                .clone()
                .unwrap_or_else(|| feishu::DEFAULT_BASE_URL.to_string()),
            app_id: self.feishu.app_id.clone(),
            app_secret: self.feishu.app_secret.clone(),
            app_token: self.feishu.app_token.clone(),
            table_id: self.feishu.table_id.clone(),
            view_id: self.feishu.view_id.clone(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.feishu.page_size.unwrap_or(feishu::DEFAULT_PAGE_SIZE)
    }

    pub fn tiktok_base_url(&self) -> &str {
        self.tiktok
            .base_url
            .as_deref()
            .unwrap_or(tiktok::DEFAULT_BASE_URL)
    }

    pub fn identity_authorized_bc_id(&self) -> &str {
        self.tiktok
            .identity_authorized_bc_id
            .as_deref()
            .unwrap_or(tiktok::DEFAULT_IDENTITY_AUTHORIZED_BC_ID)
    }

    /// `auth` 指令需要的 TikTok 應用憑證
    pub fn tiktok_app_credentials(&self) -> Result<(&str, &str)> {
        let app_id = validate_required_field("tiktok.app_id", &self.tiktok.app_id)?;
        let app_secret = validate_required_field("tiktok.app_secret", &self.tiktok.app_secret)?;
        validate_resolved("tiktok.app_id", app_id)?;
        validate_resolved("tiktok.app_secret", app_secret)?;
        Ok((app_id.as_str(), app_secret.as_str()))
    }

    pub fn tiktok_access_token(&self) -> Result<&str> {
        validate_resolved("tiktok.access_token", &self.tiktok.access_token)?;
        Ok(self.tiktok.access_token.as_str())
    }

    /// 只檢查飛書相關設定 (verify 指令)
    pub fn validate_feishu(&self) -> Result<()> {
        validate_resolved("feishu.app_id", &self.feishu.app_id)?;
        validate_resolved("feishu.app_secret", &self.feishu.app_secret)?;
        validate_resolved("feishu.app_token", &self.feishu.app_token)?;
        validate_resolved("feishu.table_id", &self.feishu.table_id)?;

        if let Some(base_url) = &self.feishu.base_url {
            validate_url("feishu.base_url", base_url)?;
        }
        if let Some(page_size) = self.feishu.page_size {
            validate_range("feishu.page_size", page_size, 1, 500)?;
        }
        Ok(())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        self.validate_feishu()?;

        validate_resolved("tiktok.access_token", &self.tiktok.access_token)?;
        validate_resolved("tiktok.advertiser_id", &self.tiktok.advertiser_id)?;
        if let Some(base_url) = &self.tiktok.base_url {
            validate_url("tiktok.base_url", base_url)?;
        }

        validate_range("retry.max_attempts", self.retry.max_attempts, 1, 100)?;
        validate_range("retry.delay_seconds", self.retry.delay_seconds, 0, 300)?;
        validate_range("retry.timeout_seconds", self.retry.timeout_seconds, 1, 600)?;

        Ok(())
    }
}

/// 非空且環境變數已被替換
fn validate_resolved(field: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field, value)?;
    if value.contains("${") {
        return Err(AdsError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: "Environment variable is not set".to_string(),
        });
    }
    Ok(())
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
