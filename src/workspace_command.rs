use anyhow::{Context, Result};
use log::info;

use crate::clockify::{ClockifyRepository, User, Workspace};
use crate::config::Settings;

/// ワークスペースの一覧を表示するサブコマンド。
#[derive(Debug, clap::Args)]
pub struct WorkspacesArgs {
    #[clap(
        long = "select",
        help = "Store the first workspace when none is configured yet"
    )]
    pub select: bool,
}

pub struct WorkspacesCommand<'a, T: ClockifyRepository> {
    clockify_client: &'a T,
}

impl<'a, T: ClockifyRepository> WorkspacesCommand<'a, T> {
    /// 新しい`WorkspacesCommand`を返す。
    pub fn new(clockify_client: &'a T) -> Self {
        Self { clockify_client }
    }

    /// 現在のユーザーとワークスペースの一覧を取得する。
    pub async fn run(&self) -> Result<(User, Vec<Workspace>)> {
        let user = self
            .clockify_client
            .read_current_user()
            .await
            .context("Failed to retrieve current user")?;
        let workspaces = self
            .clockify_client
            .read_workspaces()
            .await
            .context("Failed to retrieve workspaces")?;

        Ok((user, workspaces))
    }
}

/// ワークスペースが未設定の場合、最初のワークスペースを選択する。
///
/// 選択した場合は`true`を返す。
pub fn select_default_workspace(settings: &mut Settings, workspaces: &[Workspace]) -> bool {
    if !settings.clockify.workspace_id.is_empty() {
        return false;
    }

    match workspaces.first() {
        Some(workspace) => {
            info!("Select workspace: {} ({})", workspace.name, workspace.id);
            settings.clockify.workspace_id = workspace.id.clone();
            true
        }
        None => false,
    }
}
