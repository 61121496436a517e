use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;

use crate::datetime::{format_display_date, format_work_date};
use crate::duration::format_millis;
use crate::task_reference::{BracketReference, TaskReference};
use crate::time_entry::TimeEntry;

pub const NO_ENTRIES_MESSAGE: &str = "No time entries found.";
pub const NO_VALID_ENTRIES_MESSAGE: &str = "No valid time entries found.";
pub const YESTERDAY_HEADING: &str = "What I accomplished yesterday?";
pub const TODAY_HEADING: &str = "What I am going to do today?";

/// 開始日ごとにまとめたtime entry。
pub type DateBuckets<'a> = BTreeMap<NaiveDate, Vec<&'a TimeEntry>>;

/// 同じキーを持つtime entryを集計した結果。
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedTask {
    /// タスクの識別子、なければ表示用の説明。
    pub key: String,
    /// 最初に現れたtime entryの表示用の説明。
    pub display_description: String,
    pub task_token: Option<String>,
    pub total_millis: i64,
    pub formatted_duration: String,
    pub first_start: Option<DateTime<Utc>>,
    pub last_end: Option<DateTime<Utc>>,
}

/// 今日の予定として表示するタスク。作業時間は集計しない。
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedTask {
    pub key: String,
    pub display_description: String,
    pub task_token: Option<String>,
}

/// 開始時刻のUTCでの日付ごとにtime entryをまとめる。
///
/// 開始時刻がない、またはパースできないtime entryはどの日付にも含めない。
pub fn bucket_by_date(entries: &[TimeEntry]) -> DateBuckets<'_> {
    entries.iter().fold(BTreeMap::new(), |mut acc, entry| {
        match entry.start_at() {
            Some(start) => acc.entry(start.date_naive()).or_default().push(entry),
            None => debug!("Skip time entry without a valid start: {:?}", entry.id),
        }
        acc
    })
}

/// 「昨日」と「今日」として扱う日付を選ぶ。
///
/// 「昨日」は`today`より前で最も新しい日付とし、存在しない場合は最も古い日付とする。
/// 「今日」は`today`と一致する日付があればその日付とする。
pub fn select_dates(
    buckets: &DateBuckets<'_>,
    today: NaiveDate,
) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let yesterday = buckets
        .keys()
        .rev()
        .find(|date| **date < today)
        .or_else(|| buckets.keys().next())
        .copied();
    let current = buckets.contains_key(&today).then_some(today);

    (yesterday, current)
}

/// 同じキーのtime entryの作業時間を合計し、合計時間の降順に並べる。
///
/// 合計時間が同じ場合は最初に現れた順を保つ。合計はi64の上限で頭打ちにする。
pub fn aggregate<R: TaskReference + ?Sized>(
    entries: &[&TimeEntry],
    reference: &R,
) -> Vec<AggregatedTask> {
    let mut tasks: Vec<AggregatedTask> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let task_token = reference.token(entry.description());
        let display_description = reference.display(entry.description());
        let key = task_token
            .clone()
            .unwrap_or_else(|| display_description.clone());
        let millis = entry.duration_millis();
        let start = entry.start_at();
        let end = entry.end_at();

        match index_by_key.get(&key) {
            Some(&index) => {
                let task = &mut tasks[index];
                task.total_millis = task.total_millis.saturating_add(millis);
                task.first_start = earliest(task.first_start, start);
                task.last_end = latest(task.last_end, end);
            }
            None => {
                index_by_key.insert(key.clone(), tasks.len());
                tasks.push(AggregatedTask {
                    key,
                    display_description,
                    task_token,
                    total_millis: millis,
                    formatted_duration: String::new(),
                    first_start: start,
                    last_end: end,
                });
            }
        }
    }

    for task in tasks.iter_mut() {
        task.formatted_duration = format_millis(task.total_millis);
    }
    tasks.sort_by(|a, b| b.total_millis.cmp(&a.total_millis));

    tasks
}

/// キーごとに最初に現れたtime entryだけを残す。
pub fn plan<R: TaskReference + ?Sized>(entries: &[&TimeEntry], reference: &R) -> Vec<PlannedTask> {
    let mut planned: Vec<PlannedTask> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for entry in entries {
        let task_token = reference.token(entry.description());
        let display_description = reference.display(entry.description());
        let key = task_token
            .clone()
            .unwrap_or_else(|| display_description.clone());

        if seen.insert(key.clone()) {
            planned.push(PlannedTask {
                key,
                display_description,
                task_token,
            });
        }
    }

    planned
}

fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn token_suffix(task_token: &Option<String>) -> String {
    task_token
        .as_ref()
        .map(|token| format!(" [{}]", token))
        .unwrap_or_default()
}

fn render_aggregated(task: &AggregatedTask) -> String {
    format!(
        "- {} ({}){}",
        task.display_description,
        task.formatted_duration,
        token_suffix(&task.task_token)
    )
}

fn render_planned(task: &PlannedTask) -> String {
    format!(
        "- {}{}",
        task.display_description,
        token_suffix(&task.task_token)
    )
}

/// time entryからスタンドアップ用のレポートを作成する。
///
/// # Arguments
///
/// * `entries` - time entry。順序は問わない。
/// * `today` - 今日の日付(UTC)
///
/// # Examples
///
/// ```
/// let report = build_standup_report(&entries, Utc::now().date_naive());
/// println!("{}", report);
/// ```
pub fn build_standup_report(entries: &[TimeEntry], today: NaiveDate) -> String {
    build_standup_report_with(entries, today, &BracketReference)
}

/// タスクの参照の記法を指定してレポートを作成する。
pub fn build_standup_report_with<R: TaskReference + ?Sized>(
    entries: &[TimeEntry],
    today: NaiveDate,
    reference: &R,
) -> String {
    if entries.is_empty() {
        return NO_ENTRIES_MESSAGE.to_string();
    }

    let buckets = bucket_by_date(entries);
    if buckets.is_empty() {
        return NO_VALID_ENTRIES_MESSAGE.to_string();
    }
    let (yesterday, current) = select_dates(&buckets, today);

    let mut lines = vec![
        format!("Date: {}", format_display_date(today)),
        String::new(),
        YESTERDAY_HEADING.to_string(),
        String::new(),
    ];

    if let Some(date) = yesterday {
        lines.push(format!("(Work from {})", format_work_date(date)));
        lines.extend(
            aggregate(&buckets[&date], reference)
                .iter()
                .map(render_aggregated),
        );
    }

    lines.push(String::new());
    lines.push(TODAY_HEADING.to_string());
    lines.push(String::new());

    if let Some(date) = current {
        lines.extend(plan(&buckets[&date], reference).iter().map(render_planned));
    }

    lines.join("\n")
}
