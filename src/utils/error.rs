use crate::domain::model::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdsError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed at {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("{stage} creation failed after {attempts} attempt(s): {message}")]
    StageCallError {
        stage: Stage,
        attempts: u32,
        message: String,
    },

    #[error("{service} returned error code {code}: {message}")]
    RemoteError {
        service: String,
        code: i64,
        message: String,
    },

    #[error("HTTP error! status: {status}")]
    HttpStatusError { status: u16, body: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Remote,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AdsError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::ApiError(_) | Self::HttpStatusError { .. } => ErrorCategory::Network,
            Self::StageCallError { .. } | Self::RemoteError { .. } => ErrorCategory::Remote,
            Self::CsvError(_) | Self::SerializationError(_) | Self::ValidationError { .. } => {
                ErrorCategory::Data
            }
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 是否值得以相同請求重試
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ApiError(_) | Self::HttpStatusError { .. } | Self::SerializationError(_)
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingConfigError { field } => format!("缺少必要配置: {}", field),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("配置 {} 無效: {}", field, reason)
            }
            Self::ConfigError { message } | Self::ConfigValidationError { message, .. } => {
                format!("配置錯誤: {}", message)
            }
            Self::StageCallError { stage, message, .. } => {
                format!("{} 建立失敗: {}", stage, message)
            }
            Self::RemoteError {
                service, message, ..
            } => format!("{} 回傳錯誤: {}", service, message),
            Self::ApiError(_) | Self::HttpStatusError { .. } => {
                format!("網路請求失敗: {}", self)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "檢查配置檔與環境變數是否完整",
            ErrorCategory::Network => "確認網路連線後重新執行",
            ErrorCategory::Remote => "確認 access token 與廣告帳戶權限是否有效",
            ErrorCategory::Data => "檢查表格欄位內容與格式",
            ErrorCategory::System => "檢查檔案路徑與權限",
        }
    }
}

pub type Result<T> = std::result::Result<T, AdsError>;
