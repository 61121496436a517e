use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::datetime::parse_timestamp;
use crate::duration::duration_millis;

/// Clockifyのtime entry。
///
/// 受け取った後は変更しない。値が欠けていても受け入れ、集計時に既定値で補う。
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub time_interval: TimeInterval,
    #[serde(default)]
    pub project: Option<ProjectRef>,
    #[serde(default)]
    pub task: Option<TaskRef>,
}

/// time entryの期間。
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TimeInterval {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ProjectRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TaskRef {
    #[serde(default)]
    pub name: String,
}

impl TimeEntry {
    /// 説明を返す。未設定の場合は空文字列を返す。
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// 開始時刻を返す。パースできない場合は`None`を返す。
    pub fn start_at(&self) -> Option<DateTime<Utc>> {
        self.time_interval.start.as_deref().and_then(parse_timestamp)
    }

    /// 終了時刻を返す。実行中のtime entryや、パースできない場合は`None`を返す。
    pub fn end_at(&self) -> Option<DateTime<Utc>> {
        self.time_interval.end.as_deref().and_then(parse_timestamp)
    }

    /// 作業時間をミリ秒で返す。
    pub fn duration_millis(&self) -> i64 {
        duration_millis(
            self.time_interval.duration.as_deref(),
            self.time_interval.start.as_deref(),
            self.time_interval.end.as_deref(),
        )
    }
}

/// Clockifyから受け取るtime entryの一覧。
///
/// `{"timeEntriesList": [...]}`の形式と、配列そのものの形式の両方を受け付ける。
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TimeEntriesPayload {
    Wrapped {
        #[serde(rename = "timeEntriesList")]
        time_entries_list: Vec<TimeEntry>,
    },
    List(Vec<TimeEntry>),
}

impl TimeEntriesPayload {
    pub fn into_entries(self) -> Vec<TimeEntry> {
        match self {
            TimeEntriesPayload::Wrapped { time_entries_list } => time_entries_list,
            TimeEntriesPayload::List(entries) => entries,
        }
    }
}

/// JSON文字列からtime entryの一覧を読み込む。
///
/// 形式が正しくない場合はエラーを返す。集計処理は正しい形式を前提とするため、ここで検証する。
pub fn parse_time_entries(json: &str) -> Result<Vec<TimeEntry>> {
    let payload = serde_json::from_str::<TimeEntriesPayload>(json).context(
        "Failed to parse time entries. Make sure the JSON is an array or includes a 'timeEntriesList' array",
    )?;

    Ok(payload.into_entries())
}
