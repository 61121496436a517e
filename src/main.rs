use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

mod clockify;
mod config;
mod config_command;
mod console;
mod datetime;
mod duration;
mod jira;
mod jira_command;
mod render_command;
mod report;
mod standup_command;
mod task_reference;
mod time_entry;
mod workspace_command;

use clockify::ClockifyClient;
use config::{FileStorage, Settings};
use config_command::{config_command, ConfigArgs};
use console::{ConsolePlainText, ConsolePresenter};
use jira::JiraClient;
use jira_command::{JiraArgs, JiraCommand};
use render_command::{render_command, RenderArgs};
use standup_command::{StandupArgs, StandupCommand};
use workspace_command::{select_default_workspace, WorkspacesArgs, WorkspacesCommand};

/// Clockifyのtime entryからスタンドアップ用のレポートを作成するCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- config set-clockify --api-key <KEY>
/// $ cargo run -- workspaces --select
/// $ cargo run -- standup
/// $ cargo run -- render time-entries.json
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(short = 'v', long = "verbose", global = true, help = "Show debug logs")]
    verbose: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Fetch time entries from Clockify and print the standup report
    Standup(StandupArgs),
    /// Print the standup report from a Clockify JSON export
    Render(RenderArgs),
    /// List Clockify workspaces
    Workspaces(WorkspacesArgs),
    /// List Jira issues assigned to you
    Jira(JiraArgs),
    /// Manage stored credentials
    Config(ConfigArgs),
}

/// ログの出力先を設定する。
///
/// 標準出力はレポートのために空けておき、ログは標準エラー出力に出す。
fn setup_logger(verbose: bool) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue);
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("hyper", LevelFilter::Warn)
        .chain(io::stderr())
        .apply()
        .context("Failed to initialize logger")?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logger(args.verbose)?;

    let storage = FileStorage::default_location()?;
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut presenter = ConsolePlainText::new(&mut writer);

    match args.subcommand {
        SubCommands::Standup(standup) => {
            let settings = Settings::load(&storage)?.with_env();
            let client = ClockifyClient::new(settings.clockify_api_key()?);
            let report = StandupCommand::new(&client)
                .run(standup, &settings.clockify.workspace_id)
                .await?;
            presenter.show_report(&report)?;
        }
        SubCommands::Render(render) => {
            let report = render_command(render, io::stdin(), datetime::now().date_naive())?;
            presenter.show_report(&report)?;
        }
        SubCommands::Workspaces(workspaces_args) => {
            let mut settings = Settings::load(&storage)?;
            let env_settings = settings.clone().with_env();
            let client = ClockifyClient::new(env_settings.clockify_api_key()?);
            let (user, workspaces) = WorkspacesCommand::new(&client).run().await?;
            if workspaces_args.select && select_default_workspace(&mut settings, &workspaces) {
                settings.save(&storage)?;
            }
            presenter.show_workspaces(&user, &workspaces, &settings.clockify.workspace_id)?;
        }
        SubCommands::Jira(jira_args) => {
            let settings = Settings::load(&storage)?.with_env();
            let jira = settings.jira_connection()?;
            let client = JiraClient::new(&jira.domain, &jira.email, &jira.api_token);
            let issues = JiraCommand::new(&client).run(jira_args).await?;
            presenter.show_issues(&issues)?;
        }
        SubCommands::Config(config_args) => {
            let settings = config_command(config_args, &storage)?;
            presenter.show_settings(&settings)?;
        }
    }

    Ok(())
}
