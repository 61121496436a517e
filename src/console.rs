use std::io::Write;

use anyhow::{Context, Result};

use crate::clockify::{User, Workspace};
use crate::config::Settings;
use crate::jira::JiraIssue;

/// Consoleに結果を表示するためのtrait。
pub trait ConsolePresenter {
    /// スタンドアップ用のレポートを表示する。
    fn show_report(&mut self, report: &str) -> Result<()>;

    /// ワークスペースの一覧を表示する。
    ///
    /// # Arguments
    ///
    /// * `user` - APIキーに紐づくユーザー
    /// * `workspaces` - 表示するワークスペース
    /// * `selected` - 設定済みのワークスペースID
    fn show_workspaces(&mut self, user: &User, workspaces: &[Workspace], selected: &str)
        -> Result<()>;

    /// Jiraの課題を表示する。
    fn show_issues(&mut self, issues: &[JiraIssue]) -> Result<()>;

    /// 設定を表示する。秘密の値は伏せる。
    fn show_settings(&mut self, settings: &Settings) -> Result<()>;
}

/// 結果をプレーンテキストで表示する。
pub struct ConsolePlainText<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsolePlainText<'a, W> {
    /// 新しい`ConsolePlainText`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

/// 末尾の4文字だけを残して伏せる。
fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }

    let chars: Vec<char> = secret.chars().collect();
    let visible: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****{}", visible)
}

fn or_not_set(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

impl<'a, W: Write> ConsolePresenter for ConsolePlainText<'a, W> {
    fn show_report(&mut self, report: &str) -> Result<()> {
        writeln!(self.writer, "{}", report).context("Failed to write standup report")
    }

    fn show_workspaces(
        &mut self,
        user: &User,
        workspaces: &[Workspace],
        selected: &str,
    ) -> Result<()> {
        writeln!(self.writer, "Signed in as {} <{}>", user.name, user.email)
            .context("Failed to write current user")?;

        for workspace in workspaces {
            let marker = if workspace.id == selected { "*" } else { " " };
            writeln!(
                self.writer,
                "{} {}  {}",
                marker, workspace.id, workspace.name
            )
            .with_context(|| format!("Failed to write workspace: {:?}", workspace))?;
        }

        Ok(())
    }

    fn show_issues(&mut self, issues: &[JiraIssue]) -> Result<()> {
        for issue in issues {
            let status = issue
                .fields
                .status
                .as_ref()
                .map(|status| format!(" ({})", status.name))
                .unwrap_or_default();
            writeln!(
                self.writer,
                "- [{}] {}{}",
                issue.key, issue.fields.summary, status
            )
            .with_context(|| format!("Failed to write issue: {}", issue.key))?;
        }

        Ok(())
    }

    fn show_settings(&mut self, settings: &Settings) -> Result<()> {
        let lines = [
            "[clockify]".to_string(),
            format!("api_key      = {}", mask_secret(&settings.clockify.api_key)),
            format!("workspace_id = {}", or_not_set(&settings.clockify.workspace_id)),
            "[jira]".to_string(),
            format!("email        = {}", or_not_set(&settings.jira.email)),
            format!("api_token    = {}", mask_secret(&settings.jira.api_token)),
            format!("domain       = {}", or_not_set(&settings.jira.domain)),
        ];

        writeln!(self.writer, "{}", lines.join("\n")).context("Failed to write settings")
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{mask_secret, ConsolePlainText, ConsolePresenter};
    use crate::clockify::{User, Workspace};
    use crate::config::Settings;
    use crate::jira::{JiraIssue, JiraIssueFields, JiraProject, JiraStatus};

    /// 正常系のテスト。
    #[test]
    fn test_show_report() {
        let mut writer = Vec::new();
        let mut presenter = ConsolePlainText::new(&mut writer);

        presenter.show_report("Date: 02-01-2024\n\nline").unwrap();

        assert_eq!(String::from_utf8(writer).unwrap(), "Date: 02-01-2024\n\nline\n");
    }

    #[test]
    fn test_show_workspaces_marks_selected() {
        let user = User {
            id: "u1".to_string(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
        };
        let workspaces = vec![
            Workspace {
                id: "ws1".to_string(),
                name: "Work".to_string(),
            },
            Workspace {
                id: "ws2".to_string(),
                name: "Side".to_string(),
            },
        ];
        let mut writer = Vec::new();
        let mut presenter = ConsolePlainText::new(&mut writer);

        presenter.show_workspaces(&user, &workspaces, "ws2").unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            "Signed in as Jane <jane@example.com>\n  ws1  Work\n* ws2  Side\n"
        );
    }

    #[rstest]
    #[case::no_issue(vec![], "")]
    #[case::with_status(
        vec![issue("ABC-1", "Fix bug", Some("In Progress"))],
        "- [ABC-1] Fix bug (In Progress)\n",
    )]
    #[case::without_status(
        vec![issue("ABC-1", "Fix bug", None), issue("XYZ-2", "Docs", None)],
        "- [ABC-1] Fix bug\n- [XYZ-2] Docs\n",
    )]
    fn test_show_issues(#[case] issues: Vec<JiraIssue>, #[case] expected: &str) {
        let mut writer = Vec::new();
        let mut presenter = ConsolePlainText::new(&mut writer);

        presenter.show_issues(&issues).unwrap();

        assert_eq!(String::from_utf8(writer).unwrap(), expected);
    }

    #[test]
    fn test_show_settings_masks_secrets() {
        let mut settings = Settings::default();
        settings.clockify.api_key = "abcdefgh1234".to_string();
        let mut writer = Vec::new();
        let mut presenter = ConsolePlainText::new(&mut writer);

        presenter.show_settings(&settings).unwrap();

        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("api_key      = ****1234"));
        assert!(!output.contains("abcdefgh"));
        assert!(output.contains("api_token    = (not set)"));
    }

    #[rstest]
    #[case::empty("", "(not set)")]
    #[case::short("ab", "****ab")]
    #[case::long("secret-value", "****alue")]
    fn test_mask_secret(#[case] secret: &str, #[case] expected: &str) {
        assert_eq!(mask_secret(secret), expected);
    }

    /// テスト用にダミーのJiraIssueを作成する。
    fn issue(key: &str, summary: &str, status: Option<&str>) -> JiraIssue {
        JiraIssue {
            id: key.to_string(),
            key: key.to_string(),
            fields: JiraIssueFields {
                summary: summary.to_string(),
                project: JiraProject {
                    key: "ABC".to_string(),
                    name: "Alpha".to_string(),
                },
                status: status.map(|name| JiraStatus {
                    name: name.to_string(),
                }),
            },
        }
    }
}
