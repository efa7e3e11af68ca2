use std::fmt;

use anyhow::{Context, Result};
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// 1日の時間帯。エントリー名の既定値に利用する。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// 時刻（0-23時）から時間帯を返す。
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=21 => Self::Evening,
            _ => Self::Night,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        };
        f.write_str(label)
    }
}

/// 時間帯から既定のエントリー名を作成する。
pub fn default_entry_name(hour: u32) -> String {
    format!("{} Poop", TimeOfDay::from_hour(hour))
}

/// 指定したタイムゾーンでの1日の始まり（00:00:00.000）をUTCで返す。
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).expect("midnight must be valid");
    resolve_local(tz, day.and_time(midnight))
}

/// 指定したタイムゾーンでの1日の終わり（23:59:59.999）をUTCで返す。
pub fn end_of_day<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let last_moment =
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("end of day must be valid");
    resolve_local(tz, day.and_time(last_moment))
}

/// 基準日時を含む週（月曜始まり）の範囲を返す。両端を含む。
pub fn week_range<Tz: TimeZone>(reference: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = reference.timezone();
    let date = reference.date_naive();
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    let sunday = monday + Duration::days(6);

    (start_of_day(&tz, monday), end_of_day(&tz, sunday))
}

/// 基準日時を含む月の範囲を返す。両端を含む。
pub fn month_range<Tz: TimeZone>(reference: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = reference.timezone();
    let date = reference.date_naive();
    let first = first_day_of_month(date.year(), date.month()).unwrap_or(date);
    let last = last_day_of_month(date.year(), date.month()).unwrap_or(date);

    (start_of_day(&tz, first), end_of_day(&tz, last))
}

/// 月の初日を返す。
pub fn first_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// 月の最終日を返す。
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    first_day_of_month(next_year, next_month)?.pred_opt()
}

/// 日付を`Today`、`Yesterday`、もしくは`YYYY-MM-DD`で表示する。
pub fn relative_day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(day) {
        "Yesterday".to_string()
    } else {
        day.format("%Y-%m-%d").to_string()
    }
}

/// 秒数をストップウォッチ表示用の`MM:SS`にする。
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// 秒数を統計表示用の`Xm Ys`にする。
pub fn format_minutes_seconds(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// 日付をパースする。
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}

/// 月をパースし、その月の初日を返す。
pub fn parse_month(s: &str) -> Result<NaiveDate> {
    let target_date = s.to_string() + "-01";
    NaiveDate::parse_from_str(&target_date, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse month: {}", s))
}

/// ローカル日時をUTCに変換する。
///
/// 夏時間の切り替えで重複する場合は早い方、存在しない場合は1時間後を採用する。
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(datetime) => datetime.with_timezone(&Utc),
        LocalResult::Ambiguous(first, second) => first.min(second).with_timezone(&Utc),
        LocalResult::None => match tz.from_local_datetime(&(naive + Duration::hours(1))) {
            LocalResult::Single(datetime) | LocalResult::Ambiguous(datetime, _) => {
                datetime.with_timezone(&Utc)
            }
            LocalResult::None => Utc.from_utc_datetime(&naive),
        },
    }
}
