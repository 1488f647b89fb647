//! CLI 指令背後的流程，組合設定、飛書、TikTok 與批次執行。

use crate::adapters::dry_run::{PlanningApi, ReadOnlyTable};
use crate::adapters::feishu::FeishuClient;
use crate::adapters::http::build_client;
use crate::adapters::tiktok::advertiser::{fetch_advertisers, AdvertiserInfo};
use crate::adapters::tiktok::auth::{exchange_auth_code, TokenGrant};
use crate::adapters::tiktok::TiktokClient;
use crate::config::AppConfig;
use crate::core::batch::{read_all_rows, select_records, BatchDriver, BatchReport};
use crate::domain::ports::ProgressSink;
use crate::utils::error::Result;
use crate::utils::report::write_report_file;
use crate::utils::validation::Validate;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub records: Vec<String>,
    pub report: Option<PathBuf>,
    pub dry_run: bool,
}

pub async fn run_batch(
    config: &AppConfig,
    options: &RunOptions,
    progress: &dyn ProgressSink,
) -> Result<BatchReport> {
    config.validate()?;

    let feishu = FeishuClient::new(config.feishu_settings(), config.request_timeout())?;
    let rows = read_all_rows(&feishu, config.page_size()).await?;
    let rows = select_records(rows, &options.records)?;
    let advertiser = config.advertiser_config();

    let report = if options.dry_run {
        tracing::info!("📝 Dry run: no ads will be created and nothing is written back");
        let api = PlanningApi::new();
        let table = ReadOnlyTable::new(&feishu);
        BatchDriver::new(&api, &table)
            .with_progress(progress)
            .run(&advertiser, &rows)
            .await?
    } else {
        let api = TiktokClient::new(config.tiktok_base_url(), config.request_timeout())?
            .with_retry(config.retry_policy())
            .with_identity_authorized_bc_id(config.identity_authorized_bc_id());
        BatchDriver::new(&api, &feishu)
            .with_progress(progress)
            .run(&advertiser, &rows)
            .await?
    };

    if let Some(path) = &options.report {
        write_report_file(path, &report.results)?;
    }

    Ok(report)
}

pub async fn verify(config: &AppConfig) -> Result<()> {
    config.validate_feishu()?;

    let feishu = FeishuClient::new(config.feishu_settings(), config.request_timeout())?;
    feishu.tenant_access_token().await?;
    tracing::info!("✅ Feishu tenant token acquired");
    feishu.verify_table().await
}

/// 換得令牌後一併查詢可操作的廣告帳戶
pub async fn authorize(
    config: &AppConfig,
    auth_code: &str,
) -> Result<(TokenGrant, Vec<AdvertiserInfo>)> {
    let (app_id, app_secret) = config.tiktok_app_credentials()?;
    let client = build_client(config.request_timeout())?;
    let base_url = config.tiktok_base_url();

    let grant = exchange_auth_code(&client, base_url, app_id, app_secret, auth_code).await?;
    let advertisers =
        fetch_advertisers(&client, base_url, app_id, app_secret, &grant.access_token).await?;
    Ok((grant, advertisers))
}

/// 以設定檔中的 access token 列出廣告帳戶
pub async fn list_advertisers(config: &AppConfig) -> Result<Vec<AdvertiserInfo>> {
    let (app_id, app_secret) = config.tiktok_app_credentials()?;
    let access_token = config.tiktok_access_token()?;
    let client = build_client(config.request_timeout())?;
    fetch_advertisers(
        &client,
        config.tiktok_base_url(),
        app_id,
        app_secret,
        access_token,
    )
    .await
}
