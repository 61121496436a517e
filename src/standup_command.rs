use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::info;

use crate::clockify::ClockifyRepository;
use crate::datetime::{self, parse_date};
use crate::report::build_standup_report;

/// Clockifyのtime entryからスタンドアップ用のレポートを作成するサブコマンド。
#[derive(Debug, clap::Args)]
pub struct StandupArgs {
    #[clap(
        short = 's',
        long = "start",
        help = "Sets a custom start date in the format YYYY-MM-DD (defaults to the previous workday)",
        parse(try_from_str = parse_date),
    )]
    start: Option<NaiveDate>,

    #[clap(
        short = 'e',
        long = "end",
        help = "Sets a custom end date in the format YYYY-MM-DD (defaults to now)",
        parse(try_from_str = parse_date),
    )]
    end: Option<NaiveDate>,

    #[clap(
        short = 'w',
        long = "workspace",
        help = "Clockify workspace ID (defaults to the configured one)"
    )]
    workspace: Option<String>,
}

pub struct StandupCommand<'a, T: ClockifyRepository> {
    clockify_client: &'a T,
}

impl<'a, T: ClockifyRepository> StandupCommand<'a, T> {
    /// 新しい`StandupCommand`を返す。
    ///
    /// # Arguments
    /// * `clockify_client` - Clockify APIと通信するためのリポジトリ
    pub fn new(clockify_client: &'a T) -> Self {
        Self { clockify_client }
    }

    /// `standup`サブコマンドの処理を行う。
    ///
    /// 直前の稼働日から現在までのtime entryを取得し、レポートを返す。
    ///
    /// # Arguments
    ///
    /// * `standup` - `standup`サブコマンドの引数
    /// * `default_workspace` - 引数で指定されなかった場合に使うワークスペースID
    pub async fn run(&self, standup: StandupArgs, default_workspace: &str) -> Result<String> {
        let workspace_id = standup
            .workspace
            .unwrap_or_else(|| default_workspace.to_string());
        if workspace_id.trim().is_empty() {
            bail!("No workspace selected. Pass --workspace or run `clockify-standup workspaces --select`");
        }

        let now = datetime::now();
        let (start_at, end_at) = datetime::resolve_range(standup.start, standup.end, now)
            .context("Failed to resolve the date range")?;
        info!("Start at: {}, End at: {}", start_at, end_at);

        let time_entries = self
            .clockify_client
            .read_time_entries(&workspace_id, &start_at, &end_at)
            .await
            .context("Failed to retrieve time entries")?;
        info!("Time entries retrieved successfully.");

        Ok(build_standup_report(&time_entries, now.date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeZone, Utc};

    use super::{StandupArgs, StandupCommand};
    use crate::clockify::MockClockifyRepository;
    use crate::datetime::mock_datetime;
    use crate::report::NO_ENTRIES_MESSAGE;
    use crate::time_entry::{TimeEntry, TimeInterval};

    fn entry(description: &str, start: &str, duration: &str) -> TimeEntry {
        TimeEntry {
            id: description.to_string(),
            description: Some(description.to_string()),
            time_interval: TimeInterval {
                start: Some(start.to_string()),
                end: None,
                duration: Some(duration.to_string()),
            },
            project: None,
            task: None,
        }
    }

    #[tokio::test]
    async fn test_standup_command_no_entries() {
        let args = StandupArgs {
            start: None,
            end: None,
            workspace: None,
        };
        let mut clockify = MockClockifyRepository::new();
        clockify
            .expect_read_time_entries()
            .withf(|workspace_id, _, _| workspace_id == "stored-workspace")
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let command = StandupCommand::new(&clockify);
        let result = command.run(args, "stored-workspace").await.unwrap();

        assert_eq!(result, NO_ENTRIES_MESSAGE);
    }

    #[tokio::test]
    async fn test_standup_command_builds_report() {
        mock_datetime::set_mock_time(Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap());
        let args = StandupArgs {
            start: None,
            end: None,
            workspace: Some("cli-workspace".to_string()),
        };
        let mut clockify = MockClockifyRepository::new();
        clockify
            .expect_read_time_entries()
            .withf(|workspace_id, _, end_at| {
                workspace_id == "cli-workspace"
                    && *end_at == Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(vec![
                    entry("[ABC-1]: Fix bug", "2024-01-01T09:00:00Z", "PT1H"),
                    entry("[ABC-1]: Fix bug more", "2024-01-01T10:00:00Z", "PT30M"),
                    entry("[ABC-2]: Review", "2024-01-02T09:00:00Z", "PT15M"),
                ])
            });

        let command = StandupCommand::new(&clockify);
        let report = command.run(args, "stored-workspace").await.unwrap();
        mock_datetime::clear_mock_time();

        assert!(report.starts_with("Date: 02-01-2024"));
        assert!(report.contains("- Fix bug (1h 30m) [ABC-1]"));
        assert!(report.ends_with("- Review [ABC-2]"));
    }

    #[tokio::test]
    async fn test_standup_command_with_dates() {
        let args = StandupArgs {
            start: NaiveDate::from_ymd_opt(2000, 1, 1),
            end: NaiveDate::from_ymd_opt(2000, 1, 3),
            workspace: None,
        };
        let expected_start = Local.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap().to_utc();
        let mut clockify = MockClockifyRepository::new();
        clockify
            .expect_read_time_entries()
            .withf(move |_, start_at, _| *start_at == expected_start)
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let command = StandupCommand::new(&clockify);
        let result = command.run(args, "stored-workspace").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_standup_command_without_workspace() {
        let args = StandupArgs {
            start: None,
            end: None,
            workspace: None,
        };
        let mut clockify = MockClockifyRepository::new();
        clockify.expect_read_time_entries().times(0);

        let command = StandupCommand::new(&clockify);
        let result = command.run(args, "").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_standup_command_propagates_errors() {
        let args = StandupArgs {
            start: None,
            end: None,
            workspace: None,
        };
        let mut clockify = MockClockifyRepository::new();
        clockify
            .expect_read_time_entries()
            .withf(|workspace_id, _, _| workspace_id == "stored-workspace")
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("Clockify API error (401): Unauthorized")));

        let command = StandupCommand::new(&clockify);
        let error = command.run(args, "stored-workspace").await.unwrap_err();

        assert!(format!("{:#}", error).contains("Unauthorized"));
    }
}
