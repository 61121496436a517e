use std::{fs, io::Read, path::PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;

use crate::report::build_standup_report;
use crate::time_entry::parse_time_entries;

/// 保存済みのClockifyのJSONからレポートを作成するサブコマンド。
#[derive(Debug, clap::Args)]
pub struct RenderArgs {
    #[clap(
        help = "Clockify time entries JSON file (reads stdin when omitted)",
        parse(from_os_str)
    )]
    file: Option<PathBuf>,
}

/// `render`サブコマンドの処理を行う。
///
/// # Arguments
///
/// * `render` - `render`サブコマンドの引数
/// * `stdin` - ファイルが指定されなかった場合の入力
/// * `today` - 今日の日付(UTC)
pub fn render_command<R: Read>(render: RenderArgs, mut stdin: R, today: NaiveDate) -> Result<String> {
    let json = match render.file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut json = String::new();
            stdin
                .read_to_string(&mut json)
                .context("Failed to read time entries from stdin")?;
            json
        }
    };

    let time_entries = parse_time_entries(&json)?;
    info!("length of time entries: {}", time_entries.len());

    Ok(build_standup_report(&time_entries, today))
}
