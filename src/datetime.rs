use anyhow::{bail, Context, Result};
use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
    Weekday,
};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// タイムスタンプ文字列をパースする。
///
/// RFC 3339形式を優先し、タイムゾーンが付いていない場合はUTCとして扱う。
/// パースできない場合は`None`を返す。
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(s)
        .map(|datetime| datetime.to_utc())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
        })
        .ok()
}

/// 日付をパースする。
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}

/// 直前の稼働日を返す。
///
/// 前日が土曜日または日曜日の場合は、その直前の金曜日まで遡る。
pub fn previous_workday(date: NaiveDate) -> NaiveDate {
    let previous = date - Duration::days(1);
    match previous.weekday() {
        Weekday::Sun => previous - Duration::days(2),
        Weekday::Sat => previous - Duration::days(1),
        _ => previous,
    }
}

/// Localタイムゾーンで指定した日付・時刻をUTCに変換する。
fn local_to_utc(date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>> {
    let datetime = Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .with_context(|| format!("Failed to convert {} {} to DateTime<Local>", date, time))?
        .to_utc();

    Ok(datetime)
}

/// Localタイムゾーンで指定した日付の00:00:00をUTCで返す。
pub fn local_start_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(0, 0, 0).context("Failed to set hour, minute, and second")?;
    local_to_utc(date, time)
}

/// Localタイムゾーンで指定した日付の23:59:59.999をUTCで返す。
pub fn local_end_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    let time = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .context("Failed to set hour, minute, second, and millisecond")?;
    local_to_utc(date, time)
}

/// time entryを取得する期間を決定する。
///
/// - 開始日が指定されていない場合は、Localタイムゾーンでの今日の直前の稼働日の00:00:00とする。
/// - 終了日が指定されていない場合は`now`とし、指定された場合はその日の終わりまでを含める。
///
/// # Arguments
///
/// * `start` - 開始日
/// * `end` - 終了日
/// * `now` - 現在時刻
pub fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start_at = match start {
        Some(date) => local_start_of_day(date)?,
        None => {
            let today = now.with_timezone(&Local).date_naive();
            local_start_of_day(previous_workday(today))?
        }
    };
    let end_at = match end {
        Some(date) => local_end_of_day(date)?,
        None => now,
    };

    if start_at > end_at {
        bail!("Start ({}) must not be after end ({})", start_at, end_at);
    }

    Ok((start_at, end_at))
}

/// レポートのヘッダー用に日付を`DD-MM-YYYY`形式で返す。
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// 作業日を`Monday, January 1, 2024`の形式で返す。
pub fn format_work_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}
