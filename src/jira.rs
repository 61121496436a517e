use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use reqwest::{header::ACCEPT, Client};
use serde::Deserialize;
use serde_json::json;

/// 自分に割り当てられていて、作業中または着手予定の課題を探すJQL。
pub const ASSIGNED_ISSUES_JQL: &str = r#"assignee = currentUser() AND status in ("In Progress", "Selected for Development") ORDER BY updated DESC"#;

/// Jiraの課題。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct JiraIssue {
    pub id: String,
    pub key: String,
    pub fields: JiraIssueFields,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct JiraIssueFields {
    #[serde(default)]
    pub summary: String,
    pub project: JiraProject,
    #[serde(default)]
    pub status: Option<JiraStatus>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct JiraProject {
    pub key: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct JiraStatus {
    pub name: String,
}

/// 検索APIのレスポンス。
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

/// Jira APIのエラーレスポンス。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    error_messages: Vec<String>,
}

/// Jiraから課題を取得するためのリポジトリ。
#[cfg_attr(test, automock)]
#[async_trait(?Send)]
pub trait JiraRepository {
    /// 自分に割り当てられた作業中の課題を取得する。
    async fn read_assigned_issues(&self) -> Result<Vec<JiraIssue>>;
}

/// Jira APIと通信するためのクライアント。
pub struct JiraClient {
    client: Client,
    base_url: String,
    email: String,
    api_token: String,
}

impl JiraClient {
    /// 新しい`JiraClient`を返す。
    ///
    /// # Arguments
    ///
    /// * `domain` - `example.atlassian.net`のようなJiraのドメイン
    /// * `email` - ログインに使うメールアドレス
    /// * `api_token` - APIトークン
    pub fn new(domain: &str, email: &str, api_token: &str) -> Self {
        let domain = domain.trim().trim_end_matches('/');
        Self::with_base_url(&format!("https://{}", domain), email, api_token)
    }

    /// 接続先のURLを指定して新しい`JiraClient`を返す。
    pub fn with_base_url(base_url: &str, email: &str, api_token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            api_token: api_token.to_string(),
        }
    }
}

#[async_trait(?Send)]
impl JiraRepository for JiraClient {
    async fn read_assigned_issues(&self) -> Result<Vec<JiraIssue>> {
        let url = format!("{}/rest/api/3/search", self.base_url);
        debug!("POST {}", url);
        let body = json!({
            "jql": ASSIGNED_ISSUES_JQL,
            "fields": ["summary", "project", "status"],
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Jira at {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let details = response
                .json::<ErrorResponse>()
                .await
                .map(|error| error.error_messages.join(", "))
                .unwrap_or_default();
            let details = if details.is_empty() {
                "No additional details provided.".to_string()
            } else {
                details
            };
            bail!(
                "Failed to fetch tasks from Jira. Status: {}: {}",
                status.as_u16(),
                details
            );
        }

        let issues = response
            .json::<SearchResponse>()
            .await
            .context("Failed to parse Jira response")?
            .issues;
        info!("length of assigned issues: {}", issues.len());

        Ok(issues)
    }
}
