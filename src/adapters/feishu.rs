//! 飛書多維表格：租戶令牌、資料表檢查、分頁讀取與記錄回寫。

use crate::adapters::http::build_client;
use crate::domain::model::{RawRow, TablePage};
use crate::domain::ports::TableStore;
use crate::utils::error::{AdsError, Result};
use crate::utils::validation::validate_record_id;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn";
pub const DEFAULT_PAGE_SIZE: usize = 100;

const TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";

// 令牌到期前提早換新
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct FeishuSettings {
    pub base_url: String,
    pub app_id: String,
    pub app_secret: String,
    pub app_token: String,
    pub table_id: String,
    pub view_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: String,
    #[serde(default)]
    expire: u64,
}

#[derive(Debug, Deserialize)]
struct TableList {
    #[serde(default)]
    items: Vec<TableItem>,
}

#[derive(Debug, Deserialize)]
struct TableItem {
    table_id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    items: Option<Vec<RecordItem>>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    page_token: Option<String>,
    #[serde(default)]
    total: usize,
}

#[derive(Debug, Deserialize)]
struct RecordItem {
    record_id: String,
    #[serde(default)]
    fields: HashMap<String, serde_json::Value>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct FeishuClient {
    client: Client,
    settings: FeishuSettings,
    token: Mutex<Option<CachedToken>>,
}

impl FeishuClient {
    pub fn new(settings: FeishuSettings, timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(build_client(timeout)?, settings))
    }

    pub fn with_client(client: Client, mut settings: FeishuSettings) -> Self {
        settings.base_url = settings.base_url.trim_end_matches('/').to_string();
        Self {
            client,
            settings,
            token: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url, path)
    }

    fn table_url(&self, suffix: &str) -> String {
        self.url(&format!(
            "/open-apis/bitable/v1/apps/{}/tables/{}{}",
            self.settings.app_token, self.settings.table_id, suffix
        ))
    }

    /// 取得租戶令牌，未過期時沿用快取
    pub async fn tenant_access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("🔑 Requesting Feishu tenant access token");
        let response = self
            .client
            .post(self.url(TOKEN_PATH))
            .json(&serde_json::json!({
                "app_id": self.settings.app_id,
                "app_secret": self.settings.app_secret,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdsError::HttpStatusError {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: TokenResponse = response.json().await?;
        if parsed.code != 0 || parsed.tenant_access_token.is_empty() {
            return Err(remote_error(parsed.code, parsed.msg));
        }

        let lifetime = Duration::from_secs(parsed.expire).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: parsed.tenant_access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(parsed.tenant_access_token)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.tenant_access_token().await?;
        Ok(request
            .bearer_auth(token)
            .header("Content-Type", "application/json; charset=utf-8"))
    }

    /// 確認應用可存取多維表格，且設定的資料表存在
    pub async fn verify_table(&self) -> Result<()> {
        let url = self.url(&format!(
            "/open-apis/bitable/v1/apps/{}/tables",
            self.settings.app_token
        ));
        let request = self.authorized(self.client.get(url)).await?;
        let tables: TableList = send(request).await?;

        match tables
            .items
            .iter()
            .find(|table| table.table_id == self.settings.table_id)
        {
            Some(table) => {
                tracing::info!("✅ Table {} ({}) is accessible", table.table_id, table.name);
                Ok(())
            }
            None => Err(AdsError::ValidationError {
                message: format!("Table {} does not exist in this base", self.settings.table_id),
            }),
        }
    }
}

#[async_trait]
impl TableStore for FeishuClient {
    async fn read_rows(&self, page_token: Option<&str>, page_size: usize) -> Result<TablePage> {
        let mut query = vec![("page_size", page_size.to_string())];
        if let Some(view_id) = self.settings.view_id.as_deref().filter(|v| !v.is_empty()) {
            query.push(("view_id", view_id.to_string()));
        }
        if let Some(token) = page_token.filter(|t| !t.is_empty()) {
            query.push(("page_token", token.to_string()));
        }

        let request = self
            .authorized(self.client.get(self.table_url("/records")).query(&query))
            .await?;
        let list: RecordList = send(request).await?;

        let records: Vec<RawRow> = list
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| RawRow {
                record_id: item.record_id,
                fields: item.fields,
            })
            .collect();
        tracing::debug!(
            "📥 Read {} record(s), has_more: {}",
            records.len(),
            list.has_more
        );

        Ok(TablePage {
            records,
            has_more: list.has_more,
            page_token: list.page_token.filter(|t| !t.is_empty()),
            total: list.total,
        })
    }

    async fn write_back_fields(
        &self,
        record_id: &str,
        fields: &HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        validate_record_id(record_id)?;

        let request = self
            .authorized(
                self.client
                    .put(self.table_url(&format!("/records/{}", record_id)))
                    .json(&serde_json::json!({ "fields": fields })),
            )
            .await?;
        let _: serde_json::Value = send(request).await?;

        Ok(())
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AdsError::HttpStatusError {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    let envelope: Envelope<T> = response.json().await?;
    match envelope {
        Envelope {
            code: 0,
            data: Some(data),
            ..
        } => Ok(data),
        Envelope { code, msg, .. } => Err(remote_error(code, msg)),
    }
}

fn remote_error(code: i64, message: String) -> AdsError {
    AdsError::RemoteError {
        service: "feishu".to_string(),
        code,
        message: if message.is_empty() {
            "unknown".to_string()
        } else {
            message
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn settings(base_url: String) -> FeishuSettings {
        FeishuSettings {
            base_url,
            app_id: "cli_app".to_string(),
            app_secret: "secret".to_string(),
            app_token: "bascnApp".to_string(),
            table_id: "tblAds".to_string(),
            view_id: Some("vewMain".to_string()),
        }
    }

    fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(POST).path(TOKEN_PATH);
            then.status(200).json_body(json!({
                "code": 0,
                "msg": "ok",
                "tenant_access_token": "t-123",
                "expire": 7200
            }));
        })
    }

    #[tokio::test]
    async fn test_token_is_cached() {
        let server = MockServer::start();
        let token_mock = mock_token(&server);
        let client = FeishuClient::new(settings(server.base_url()), Duration::from_secs(5)).unwrap();

        assert_eq!(client.tenant_access_token().await.unwrap(), "t-123");
        assert_eq!(client.tenant_access_token().await.unwrap(), "t-123");
        token_mock.assert_hits(1);
    }

    #[tokio::test]
    async fn test_read_rows_page() {
        let server = MockServer::start();
        mock_token(&server);
        let records_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/open-apis/bitable/v1/apps/bascnApp/tables/tblAds/records")
                .header("authorization", "Bearer t-123")
                .query_param("page_size", "2")
                .query_param("view_id", "vewMain")
                .query_param("page_token", "p1");
            then.status(200).json_body(json!({
                "code": 0,
                "msg": "success",
                "data": {
                    "has_more": true,
                    "page_token": "p2",
                    "total": 3,
                    "items": [
                        {"record_id": "recA", "fields": {"系列序号": "1"}},
                        {"record_id": "recB", "fields": {}}
                    ]
                }
            }));
        });

        let client = FeishuClient::new(settings(server.base_url()), Duration::from_secs(5)).unwrap();
        let page = client.read_rows(Some("p1"), 2).await.unwrap();

        records_mock.assert();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].record_id, "recA");
        assert_eq!(page.page_token.as_deref(), Some("p2"));
        assert!(page.has_more);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_write_back_sends_fields() {
        let server = MockServer::start();
        mock_token(&server);
        let update_mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/open-apis/bitable/v1/apps/bascnApp/tables/tblAds/records/recA")
                .json_body(json!({"fields": {"系列ID": "C1"}}));
            then.status(200)
                .json_body(json!({"code": 0, "msg": "success", "data": {"record": {}}}));
        });

        let client = FeishuClient::new(settings(server.base_url()), Duration::from_secs(5)).unwrap();
        let mut fields = HashMap::new();
        fields.insert("系列ID".to_string(), json!("C1"));
        client.write_back_fields("recA", &fields).await.unwrap();

        update_mock.assert();
    }

    #[tokio::test]
    async fn test_write_back_rejects_bad_record_id() {
        let server = MockServer::start();
        let token_mock = mock_token(&server);
        let client = FeishuClient::new(settings(server.base_url()), Duration::from_secs(5)).unwrap();

        let err = client
            .write_back_fields("row-1", &HashMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AdsError::ValidationError { .. }));
        token_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_remote_error_code() {
        let server = MockServer::start();
        mock_token(&server);
        server.mock(|when, then| {
            when.method(GET).path("/open-apis/bitable/v1/apps/bascnApp/tables");
            then.status(200)
                .json_body(json!({"code": 91402, "msg": "NOTEXIST"}));
        });

        let client = FeishuClient::new(settings(server.base_url()), Duration::from_secs(5)).unwrap();
        let err = client.verify_table().await.unwrap_err();

        match err {
            AdsError::RemoteError { service, code, .. } => {
                assert_eq!(service, "feishu");
                assert_eq!(code, 91402);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_table_missing() {
        let server = MockServer::start();
        mock_token(&server);
        server.mock(|when, then| {
            when.method(GET).path("/open-apis/bitable/v1/apps/bascnApp/tables");
            then.status(200).json_body(json!({
                "code": 0,
                "data": {"items": [{"table_id": "tblOther", "name": "Other"}]}
            }));
        });

        let client = FeishuClient::new(settings(server.base_url()), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.verify_table().await,
            Err(AdsError::ValidationError { .. })
        ));
    }
}
