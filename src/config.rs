use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "clockify-standup";
const SETTINGS_FILE: &str = "settings.json";

/// 設定の読み書きを行うためのtrait。
///
/// 保存先を差し替えられるように、`Settings`はこのtraitを通してのみ永続化する。
pub trait SettingsStorage {
    /// 保存された内容を返す。まだ保存されていない場合は`None`を返す。
    fn read(&self) -> Result<Option<String>>;

    /// 内容を保存する。
    fn write(&self, contents: &str) -> Result<()>;
}

/// ファイルに設定を保存する。
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// OSの設定ディレクトリ配下に保存する`FileStorage`を返す。
    pub fn default_location() -> Result<Self> {
        let config_dir = dirs::config_dir().context("Failed to find the config directory")?;

        Ok(Self::new(config_dir.join(APP_DIR).join(SETTINGS_FILE)))
    }
}

impl SettingsStorage for FileStorage {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            debug!("Settings file not found: {}", self.path.display());
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file: {}", self.path.display()))?;

        Ok(Some(contents))
    }

    fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut permissions = fs::metadata(&self.path)?.permissions();
            permissions.set_mode(0o600);
            fs::set_permissions(&self.path, permissions)
                .context("Failed to restrict settings file permissions")?;
        }

        Ok(())
    }
}

/// メモリ上に設定を保存する。テストで利用する。
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    contents: std::cell::RefCell<Option<String>>,
}

#[cfg(test)]
impl SettingsStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.contents.borrow().clone())
    }

    fn write(&self, contents: &str) -> Result<()> {
        *self.contents.borrow_mut() = Some(contents.to_string());
        Ok(())
    }
}

/// アプリケーションの設定。
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub clockify: ClockifySettings,
    pub jira: JiraSettings,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ClockifySettings {
    pub api_key: String,
    pub workspace_id: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct JiraSettings {
    pub email: String,
    pub api_token: String,
    pub domain: String,
}

impl JiraSettings {
    /// ドメインを設定する。前後の空白と末尾の`/`は取り除く。
    pub fn set_domain(&mut self, domain: &str) {
        self.domain = domain.trim().trim_end_matches('/').to_string();
    }

    /// Jiraに接続するための情報がすべて揃っているかを返す。
    pub fn is_connected(&self) -> bool {
        !self.email.is_empty() && !self.api_token.is_empty() && !self.domain.is_empty()
    }
}

impl Settings {
    /// 設定を読み込む。保存されていない場合は既定値を返す。
    pub fn load<S: SettingsStorage>(storage: &S) -> Result<Self> {
        match storage.read()? {
            Some(contents) => {
                serde_json::from_str(&contents).context("Failed to parse settings")
            }
            None => Ok(Self::default()),
        }
    }

    /// 設定を保存する。
    pub fn save<S: SettingsStorage>(&self, storage: &S) -> Result<()> {
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        storage.write(&contents)
    }

    /// 環境変数で設定を上書きする。
    ///
    /// `CLOCKIFY_API_KEY`, `CLOCKIFY_WORKSPACE_ID`, `JIRA_EMAIL`, `JIRA_API_TOKEN`, `JIRA_DOMAIN`を参照する。
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// `lookup`で見つかった値で設定を上書きする。空の値は無視する。
    pub fn with_overrides<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Self {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(api_key) = value("CLOCKIFY_API_KEY") {
            self.clockify.api_key = api_key;
        }
        if let Some(workspace_id) = value("CLOCKIFY_WORKSPACE_ID") {
            self.clockify.workspace_id = workspace_id.trim().to_string();
        }
        if let Some(email) = value("JIRA_EMAIL") {
            self.jira.email = email;
        }
        if let Some(api_token) = value("JIRA_API_TOKEN") {
            self.jira.api_token = api_token;
        }
        if let Some(domain) = value("JIRA_DOMAIN") {
            self.jira.set_domain(&domain);
        }

        self
    }

    /// ClockifyのAPIキーを返す。設定されていない場合はエラーを返す。
    pub fn clockify_api_key(&self) -> Result<&str> {
        if self.clockify.api_key.is_empty() {
            bail!("Clockify API key is not configured. Run `clockify-standup config set-clockify --api-key <KEY>` or set CLOCKIFY_API_KEY");
        }

        Ok(&self.clockify.api_key)
    }

    /// Jiraの接続情報を返す。揃っていない場合はエラーを返す。
    pub fn jira_connection(&self) -> Result<&JiraSettings> {
        if !self.jira.is_connected() {
            bail!("Jira is not connected. Run `clockify-standup config set-jira` or set JIRA_EMAIL, JIRA_API_TOKEN and JIRA_DOMAIN");
        }

        Ok(&self.jira)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::{FileStorage, JiraSettings, MemoryStorage, Settings, SettingsStorage};

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.clockify.api_key = "clockify-key".to_string();
        settings.clockify.workspace_id = "5f1e2d3c4b5a69788796a5b4".to_string();
        settings.jira.email = "me@example.com".to_string();
        settings.jira.api_token = "jira-token".to_string();
        settings.jira.set_domain("example.atlassian.net/");
        settings
    }

    #[test]
    fn test_load_without_saved_settings() {
        let storage = MemoryStorage::default();

        assert_eq!(Settings::load(&storage).unwrap(), Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::default();

        settings().save(&storage).unwrap();

        assert_eq!(Settings::load(&storage).unwrap(), settings());
    }

    #[test]
    fn test_load_partial_settings() {
        let storage = MemoryStorage::default();
        storage
            .write(r#"{"clockify": {"api_key": "only-key"}}"#)
            .unwrap();

        let loaded = Settings::load(&storage).unwrap();

        assert_eq!(loaded.clockify.api_key, "only-key");
        assert_eq!(loaded.clockify.workspace_id, "");
        assert!(!loaded.jira.is_connected());
    }

    #[test]
    fn test_load_broken_settings() {
        let storage = MemoryStorage::default();
        storage.write("{ not json").unwrap();

        assert!(Settings::load(&storage).is_err());
    }

    #[test]
    fn test_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("settings.json"));

        assert_eq!(storage.read().unwrap(), None);
        settings().save(&storage).unwrap();

        assert_eq!(Settings::load(&storage).unwrap(), settings());
    }

    #[test]
    fn test_with_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CLOCKIFY_API_KEY", "from-env"),
            ("JIRA_DOMAIN", " other.atlassian.net/ "),
            ("JIRA_EMAIL", "  "),
        ]);

        let overridden =
            settings().with_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(overridden.clockify.api_key, "from-env");
        assert_eq!(overridden.jira.domain, "other.atlassian.net");
        assert_eq!(overridden.jira.email, "me@example.com");
    }

    #[rstest]
    #[case::all("a@b.c", "token", "x.atlassian.net", true)]
    #[case::no_email("", "token", "x.atlassian.net", false)]
    #[case::no_token("a@b.c", "", "x.atlassian.net", false)]
    #[case::no_domain("a@b.c", "token", "", false)]
    fn test_is_connected(
        #[case] email: &str,
        #[case] api_token: &str,
        #[case] domain: &str,
        #[case] expected: bool,
    ) {
        let jira = JiraSettings {
            email: email.to_string(),
            api_token: api_token.to_string(),
            domain: domain.to_string(),
        };

        assert_eq!(jira.is_connected(), expected);
    }

    #[test]
    fn test_missing_credentials() {
        let settings = Settings::default();

        assert!(settings.clockify_api_key().is_err());
        assert!(settings.jira_connection().is_err());
    }
}
