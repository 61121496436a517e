use anyhow::{Context, Result};
use log::info;

use crate::jira::{JiraIssue, JiraRepository};

/// 自分に割り当てられたJiraの課題を表示するサブコマンド。
#[derive(Debug, clap::Args)]
pub struct JiraArgs {
    #[clap(
        short = 'p',
        long = "project",
        help = "Only show issues of the given project key"
    )]
    project: Option<String>,
}

pub struct JiraCommand<'a, T: JiraRepository> {
    jira_client: &'a T,
}

impl<'a, T: JiraRepository> JiraCommand<'a, T> {
    /// 新しい`JiraCommand`を返す。
    pub fn new(jira_client: &'a T) -> Self {
        Self { jira_client }
    }

    /// `jira`サブコマンドの処理を行う。
    ///
    /// プロジェクトが指定された場合は、そのプロジェクトの課題だけを返す。
    pub async fn run(&self, jira: JiraArgs) -> Result<Vec<JiraIssue>> {
        let issues = self
            .jira_client
            .read_assigned_issues()
            .await
            .context("Failed to retrieve Jira issues")?;

        let issues: Vec<JiraIssue> = match jira.project {
            Some(project) => issues
                .into_iter()
                .filter(|issue| issue.fields.project.key.eq_ignore_ascii_case(project.trim()))
                .collect(),
            None => issues,
        };
        info!("Jira issues to show: {}", issues.len());

        Ok(issues)
    }
}
