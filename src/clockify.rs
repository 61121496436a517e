use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, Response,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::time_entry::{TimeEntriesPayload, TimeEntry};

pub const CLOCKIFY_API_URL: &str = "https://api.clockify.me/api";

/// 1回のリクエストで取得するtime entryの件数。
const PAGE_SIZE: u32 = 50;

/// Clockifyのワークスペース。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

/// Clockifyのユーザー。
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Clockify APIのエラーレスポンス。
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// Clockifyからデータを取得するためのリポジトリ。
#[cfg_attr(test, automock)]
#[async_trait(?Send)]
pub trait ClockifyRepository {
    /// ワークスペースの一覧を取得する。
    async fn read_workspaces(&self) -> Result<Vec<Workspace>>;

    /// APIキーに紐づくユーザーを取得する。
    async fn read_current_user(&self) -> Result<User>;

    /// 指定された期間の現在のユーザーのtime entryを取得する。
    ///
    /// # Arguments
    ///
    /// * `workspace_id` - ワークスペースのID
    /// * `start_at` - 取得するタイムエントリーの開始日時
    /// * `end_at` - 取得するタイムエントリーの終了日時
    async fn read_time_entries(
        &self,
        workspace_id: &str,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>>;
}

/// ワークスペースIDが24文字の16進数であるかを確認する。
pub fn is_valid_workspace_id(id: &str) -> bool {
    id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit())
}

/// Clockify APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = ClockifyClient::new(&api_key);
/// let time_entries = client.read_time_entries(&workspace_id, &start_at, &end_at).await.unwrap();
/// ```
pub struct ClockifyClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl ClockifyClient {
    /// 新しい`ClockifyClient`を返す。
    pub fn new(api_key: &str) -> Self {
        Self::with_api_url(CLOCKIFY_API_URL, api_key)
    }

    /// 接続先を指定して新しい`ClockifyClient`を返す。
    pub fn with_api_url(api_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// GETリクエストを送り、レスポンスをデシリアライズする。
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.api_url, path);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Clockify API at {}", url))?;

        ensure_success(response)
            .await?
            .json::<T>()
            .await
            .context("Failed to deserialize response")
    }
}

/// エラーステータスの場合はAPIのメッセージを含めたエラーを返す。
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ApiError>()
        .await
        .ok()
        .and_then(|error| error.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
    bail!("Clockify API error ({}): {}", status.as_u16(), message)
}

#[async_trait(?Send)]
impl ClockifyRepository for ClockifyClient {
    async fn read_workspaces(&self) -> Result<Vec<Workspace>> {
        let workspaces = self
            .get::<Vec<Workspace>>("/v1/workspaces", &[])
            .await
            .context("Failed to get workspace list from clockify")?;
        info!("length of workspaces: {}", workspaces.len());

        Ok(workspaces)
    }

    async fn read_current_user(&self) -> Result<User> {
        self.get::<User>("/v1/user", &[])
            .await
            .context("Failed to get current user from clockify")
    }

    async fn read_time_entries(
        &self,
        workspace_id: &str,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>> {
        let workspace_id = workspace_id.trim();
        if !is_valid_workspace_id(workspace_id) {
            bail!(
                "Invalid workspace ID format. Expected 24-character hex string, got: {}",
                workspace_id
            );
        }

        let user = self.read_current_user().await?;
        if user.id.is_empty() {
            bail!("Failed to get current user ID");
        }

        let path = format!(
            "/workspaces/{}/timeEntries/user/{}/full",
            workspace_id, user.id
        );
        let payload = self
            .get::<TimeEntriesPayload>(
                &path,
                &[
                    ("start", start_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
                    ("end", end_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
                    ("page", "0".to_string()),
                    ("limit", PAGE_SIZE.to_string()),
                ],
            )
            .await
            .context("Failed to get time entries from clockify")?;
        let time_entries = payload.into_entries();
        info!("length of time entries: {}", time_entries.len());

        Ok(time_entries)
    }
}
