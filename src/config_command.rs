use anyhow::{bail, Context, Result};
use log::info;

use crate::clockify::is_valid_workspace_id;
use crate::config::{ClockifySettings, JiraSettings, Settings, SettingsStorage};

/// 保存された認証情報を管理するサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    #[clap(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the stored settings with secrets masked
    Show,
    /// Store the Clockify API key and workspace
    SetClockify {
        #[clap(long = "api-key", help = "Clockify API key")]
        api_key: Option<String>,
        #[clap(long = "workspace", help = "Clockify workspace ID")]
        workspace: Option<String>,
    },
    /// Store the Jira connection
    SetJira {
        #[clap(long = "email", help = "Email address used to sign in to Jira")]
        email: String,
        #[clap(long = "api-token", help = "Jira API token")]
        api_token: String,
        #[clap(long = "domain", help = "Jira domain such as example.atlassian.net")]
        domain: String,
    },
    /// Remove stored credentials (both when no flag is given)
    Clear {
        #[clap(long = "clockify", help = "Only clear Clockify settings")]
        clockify: bool,
        #[clap(long = "jira", help = "Only clear Jira settings")]
        jira: bool,
    },
}

/// `config`サブコマンドの処理を行う。
///
/// 変更後に保存された設定を返す。
///
/// # Arguments
///
/// * `config` - `config`サブコマンドの引数
/// * `storage` - 設定の保存先
pub fn config_command<S: SettingsStorage>(config: ConfigArgs, storage: &S) -> Result<Settings> {
    let mut settings = Settings::load(storage).context("Failed to load settings")?;

    match config.action {
        ConfigAction::Show => return Ok(settings),
        ConfigAction::SetClockify { api_key, workspace } => {
            if api_key.is_none() && workspace.is_none() {
                bail!("Nothing to set. Pass --api-key and/or --workspace");
            }
            if let Some(api_key) = api_key {
                settings.clockify.api_key = api_key.trim().to_string();
            }
            if let Some(workspace) = workspace {
                let workspace = workspace.trim();
                if !is_valid_workspace_id(workspace) {
                    bail!(
                        "Invalid workspace ID format. Expected 24-character hex string, got: {}",
                        workspace
                    );
                }
                settings.clockify.workspace_id = workspace.to_string();
            }
        }
        ConfigAction::SetJira {
            email,
            api_token,
            domain,
        } => {
            settings.jira.email = email.trim().to_string();
            settings.jira.api_token = api_token.trim().to_string();
            settings.jira.set_domain(&domain);
        }
        ConfigAction::Clear { clockify, jira } => {
            let both = !clockify && !jira;
            if clockify || both {
                settings.clockify = ClockifySettings::default();
            }
            if jira || both {
                settings.jira = JiraSettings::default();
            }
        }
    }

    settings.save(storage).context("Failed to save settings")?;
    info!("Settings saved.");

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{config_command, ConfigAction, ConfigArgs};
    use crate::config::{MemoryStorage, Settings};

    const WORKSPACE_ID: &str = "5f1e2d3c4b5a69788796a5b4";

    fn run(action: ConfigAction, storage: &MemoryStorage) -> anyhow::Result<Settings> {
        config_command(ConfigArgs { action }, storage)
    }

    fn stored() -> MemoryStorage {
        let storage = MemoryStorage::default();
        run(
            ConfigAction::SetClockify {
                api_key: Some("key".to_string()),
                workspace: Some(WORKSPACE_ID.to_string()),
            },
            &storage,
        )
        .unwrap();
        run(
            ConfigAction::SetJira {
                email: "me@example.com".to_string(),
                api_token: "token".to_string(),
                domain: "example.atlassian.net/".to_string(),
            },
            &storage,
        )
        .unwrap();
        storage
    }

    #[test]
    fn test_set_and_show() {
        let storage = stored();

        let settings = run(ConfigAction::Show, &storage).unwrap();

        assert_eq!(settings.clockify.api_key, "key");
        assert_eq!(settings.clockify.workspace_id, WORKSPACE_ID);
        assert_eq!(settings.jira.domain, "example.atlassian.net");
        assert!(settings.jira.is_connected());
    }

    #[test]
    fn test_set_clockify_keeps_other_values() {
        let storage = stored();

        run(
            ConfigAction::SetClockify {
                api_key: Some("new-key".to_string()),
                workspace: None,
            },
            &storage,
        )
        .unwrap();

        let settings = Settings::load(&storage).unwrap();
        assert_eq!(settings.clockify.api_key, "new-key");
        assert_eq!(settings.clockify.workspace_id, WORKSPACE_ID);
    }

    #[rstest]
    #[case::nothing(None, None)]
    #[case::invalid_workspace(None, Some("workspace"))]
    fn test_set_clockify_errors(#[case] api_key: Option<&str>, #[case] workspace: Option<&str>) {
        let storage = MemoryStorage::default();

        let result = run(
            ConfigAction::SetClockify {
                api_key: api_key.map(str::to_string),
                workspace: workspace.map(str::to_string),
            },
            &storage,
        );

        assert!(result.is_err());
        assert_eq!(Settings::load(&storage).unwrap(), Settings::default());
    }

    #[rstest]
    #[case::only_clockify(true, false, true, false)]
    #[case::only_jira(false, true, false, true)]
    #[case::both(false, false, true, true)]
    fn test_clear(
        #[case] clockify: bool,
        #[case] jira: bool,
        #[case] clockify_cleared: bool,
        #[case] jira_cleared: bool,
    ) {
        let storage = stored();

        let settings = run(ConfigAction::Clear { clockify, jira }, &storage).unwrap();

        assert_eq!(settings.clockify.api_key.is_empty(), clockify_cleared);
        assert_eq!(!settings.jira.is_connected(), jira_cleared);
    }
}
