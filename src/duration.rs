use once_cell::sync::Lazy;
use regex::Regex;

use crate::datetime::parse_timestamp;

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;

/// `PT1H30M15S`形式のdurationにマッチする正規表現。
static DURATION_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^PT(?:([0-9]+)H)?(?:([0-9]+)M)?(?:([0-9]+)S)?$")
        .expect("invalid duration token regex")
});

/// durationトークンをミリ秒に変換する。
///
/// 秒はパースするが値としては捨てる。文法にマッチしない場合や桁あふれする場合は`None`を返す。
pub fn token_millis(token: &str) -> Option<i64> {
    let captures = DURATION_TOKEN_REGEX.captures(token.trim())?;
    let group = |index: usize| -> Option<i64> {
        captures
            .get(index)
            .map_or(Some(0), |m| m.as_str().parse::<i64>().ok())
    };
    let hours = group(1)?;
    let minutes = group(2)?;
    let _seconds = group(3)?;

    hours
        .checked_mul(MILLIS_PER_HOUR)?
        .checked_add(minutes.checked_mul(MILLIS_PER_MINUTE)?)
}

/// 開始時刻と終了時刻の差をミリ秒で返す。
///
/// どちらかがパースできない場合や差が正でない場合は`None`を返す。
pub fn interval_millis(start: &str, end: &str) -> Option<i64> {
    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;
    let millis = (end - start).num_milliseconds();

    (millis > 0).then_some(millis)
}

/// time entryの作業時間をミリ秒で返す。
///
/// durationトークンを優先し、利用できない場合は開始・終了時刻から計算する。
/// どちらも利用できない場合は0を返す。
///
/// # Arguments
///
/// * `token` - `PT1H30M`形式のduration
/// * `start` - 開始時刻
/// * `end` - 終了時刻
pub fn duration_millis(token: Option<&str>, start: Option<&str>, end: Option<&str>) -> i64 {
    token
        .and_then(token_millis)
        .or_else(|| match (start, end) {
            (Some(start), Some(end)) => interval_millis(start, end),
            _ => None,
        })
        .unwrap_or(0)
}

/// ミリ秒を`1h 30m`の形式に整形する。
///
/// 時間が0の場合は時間を省略し、分は時間が0の場合は必ず表示する。
pub fn format_millis(millis: i64) -> String {
    if millis <= 0 {
        return "0m".to_string();
    }

    let total_minutes = millis / MILLIS_PER_MINUTE;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    let mut parts = Vec::with_capacity(2);
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || hours == 0 {
        parts.push(format!("{}m", minutes));
    }

    parts.join(" ")
}

/// 作業時間を`1h 30m`の形式で返す。
///
/// 表示と集計の値がずれないように、`duration_millis`の結果をそのまま整形する。
pub fn format_duration(token: Option<&str>, start: Option<&str>, end: Option<&str>) -> String {
    format_millis(duration_millis(token, start, end))
}
