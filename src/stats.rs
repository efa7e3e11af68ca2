use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};

use crate::category::{BristolType, Category, Feeling, StoolColor, Volume};
use crate::datetime::{month_range, week_range};
use crate::entry::Entry;

/// 統計の対象期間。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeWindow {
    #[default]
    Week,
    Month,
    AllTime,
}

impl TimeWindow {
    /// 基準日時から期間の範囲を返す。全期間の場合は`None`。
    ///
    /// 週と月は`now`のタイムゾーンの暦で計算する。
    pub fn bounds<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self {
            Self::Week => Some(week_range(now)),
            Self::Month => Some(month_range(now)),
            Self::AllTime => None,
        }
    }

    /// 期間内のエントリーだけを返す。
    pub fn filter<Tz: TimeZone>(&self, entries: &[Entry], now: &DateTime<Tz>) -> Vec<Entry> {
        match self.bounds(now) {
            Some((start, end)) => entries
                .iter()
                .filter(|entry| entry.date >= start && entry.date <= end)
                .cloned()
                .collect(),
            None => entries.to_vec(),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::AllTime),
            other => Err(format!(
                "unknown range: {} (expected week, month or all)",
                other
            )),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Week => "this week",
            Self::Month => "this month",
            Self::AllTime => "all time",
        };
        f.write_str(label)
    }
}

/// 平均の記録間隔。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frequency {
    /// エントリーが2件未満。
    NotApplicable,
    Hours(u64),
    Days(u64),
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => f.write_str("N/A"),
            Self::Hours(hours) => write!(f, "{} hours", hours),
            Self::Days(days) => write!(f, "{} days", days),
        }
    }
}

/// カテゴリごとの件数。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryCount<C> {
    pub category: C,
    pub count: usize,
}

/// 期間で絞り込んだエントリーの集計結果。
#[derive(Clone, Debug, PartialEq)]
pub struct Statistics {
    pub total: usize,
    pub types: Vec<CategoryCount<BristolType>>,
    pub volumes: Vec<CategoryCount<Volume>>,
    pub feelings: Vec<CategoryCount<Feeling>>,
    pub colors: Vec<CategoryCount<StoolColor>>,
    /// 秒数。
    pub average_duration: u64,
    pub frequency: Frequency,
}

impl Statistics {
    /// 絞り込み済みのエントリーから集計する。
    pub fn compute(entries: &[Entry]) -> Self {
        Self {
            total: entries.len(),
            types: count_by(entries, |entry| entry.kind),
            volumes: count_by(entries, |entry| entry.volume),
            feelings: count_by(entries, |entry| entry.feeling),
            colors: count_by(entries, |entry| entry.color),
            average_duration: average_duration(entries),
            frequency: frequency(entries),
        }
    }
}

/// カテゴリごとに件数を数え、件数の多い順に並べる。同数の場合は宣言順を保つ。
pub fn count_by<C, F>(entries: &[Entry], key: F) -> Vec<CategoryCount<C>>
where
    C: Category,
    F: Fn(&Entry) -> C,
{
    let mut counts: Vec<CategoryCount<C>> = C::ALL
        .iter()
        .map(|&category| CategoryCount {
            category,
            count: entries.iter().filter(|entry| key(entry) == category).count(),
        })
        .collect();
    counts.sort_by(|left, right| right.count.cmp(&left.count));
    counts
}

/// 所要時間の平均を秒単位で四捨五入して返す。空の場合は0。
pub fn average_duration(entries: &[Entry]) -> u64 {
    if entries.is_empty() {
        return 0;
    }

    let total: u128 = entries.iter().map(|entry| u128::from(entry.duration)).sum();
    let count = entries.len() as u128;
    ((total + count / 2) / count) as u64
}

/// 記録間隔の平均を返す。
///
/// 日付の昇順に並べた隣り合うエントリーの差（時間）を平均し、24時間未満なら時間、
/// それ以上なら日数で四捨五入する。
pub fn frequency(entries: &[Entry]) -> Frequency {
    if entries.len() < 2 {
        return Frequency::NotApplicable;
    }

    let mut dates: Vec<DateTime<Utc>> = entries.iter().map(|entry| entry.date).collect();
    dates.sort();

    let intervals: Vec<f64> = dates
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_milliseconds().abs() as f64 / 3_600_000.0)
        .collect();
    let average_hours = intervals.iter().sum::<f64>() / intervals.len() as f64;

    if average_hours < 24.0 {
        Frequency::Hours(average_hours.round() as u64)
    } else {
        Frequency::Days((average_hours / 24.0).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rstest::rstest;

    use super::{average_duration, count_by, frequency, Frequency, Statistics, TimeWindow};
    use crate::category::{BristolType, Feeling, StoolColor, Volume};
    use crate::entry::Entry;

    #[rstest]
    #[case::empty(&[], 0)]
    #[case::pair(&[60, 120], 90)]
    #[case::round_half_up(&[1, 2], 2)]
    #[case::round_down(&[10, 10, 11], 10)]
    #[case::large(&[u64::MAX / 2 + 1, u64::MAX / 2 + 1], u64::MAX / 2 + 1)]
    #[case::max(&[u64::MAX, u64::MAX, u64::MAX], u64::MAX)]
    fn test_average_duration(#[case] durations: &[u64], #[case] expected: u64) {
        let entries: Vec<Entry> = durations
            .iter()
            .enumerate()
            .map(|(index, &duration)| Entry {
                duration,
                ..dummy_entry(index as i64 * 24, BristolType::Type4)
            })
            .collect();

        assert_eq!(average_duration(&entries), expected);
    }

    #[rstest]
    #[case::single(&[0], Frequency::NotApplicable)]
    #[case::none(&[], Frequency::NotApplicable)]
    #[case::two_days(&[0, 48], Frequency::Days(2))]
    #[case::hours(&[0, 6, 12], Frequency::Hours(6))]
    #[case::unsorted(&[48, 0], Frequency::Days(2))]
    #[case::rounds_days(&[0, 36], Frequency::Days(2))]
    #[case::just_under_a_day(&[0, 23], Frequency::Hours(23))]
    fn test_frequency(#[case] hours: &[i64], #[case] expected: Frequency) {
        let entries: Vec<Entry> = hours
            .iter()
            .map(|&hour| dummy_entry(hour, BristolType::Type4))
            .collect();

        assert_eq!(frequency(&entries), expected);
    }

    #[test]
    fn test_frequency_display() {
        assert_eq!(Frequency::NotApplicable.to_string(), "N/A");
        assert_eq!(Frequency::Days(2).to_string(), "2 days");
        assert_eq!(Frequency::Hours(5).to_string(), "5 hours");
    }

    /// 件数の降順で、同数の場合は宣言順になることを確認する。
    #[test]
    fn test_count_by_is_stable() {
        let entries = vec![
            dummy_entry(0, BristolType::Type5),
            dummy_entry(1, BristolType::Type5),
            dummy_entry(2, BristolType::Type3),
            dummy_entry(3, BristolType::Type1),
        ];

        let counts = count_by(&entries, |entry| entry.kind);

        let order: Vec<(BristolType, usize)> = counts
            .iter()
            .map(|count| (count.category, count.count))
            .collect();
        assert_eq!(
            order,
            vec![
                (BristolType::Type5, 2),
                (BristolType::Type1, 1),
                (BristolType::Type3, 1),
                (BristolType::Type2, 0),
                (BristolType::Type4, 0),
                (BristolType::Type6, 0),
                (BristolType::Type7, 0),
            ]
        );
    }

    #[test]
    fn test_compute_covers_every_dimension() {
        let entries = vec![dummy_entry(0, BristolType::Type4)];

        let statistics = Statistics::compute(&entries);

        assert_eq!(statistics.total, 1);
        assert_eq!(statistics.types.len(), 7);
        assert_eq!(statistics.volumes[0].category, Volume::Medium);
        assert_eq!(statistics.feelings[0].category, Feeling::Easy);
        assert_eq!(statistics.colors[0].category, StoolColor::Brown);
        assert_eq!(statistics.frequency, Frequency::NotApplicable);
    }

    #[rstest]
    #[case::week(TimeWindow::Week, vec!["mon", "sun"])]
    #[case::month(TimeWindow::Month, vec!["first", "mon", "sun", "next_week"])]
    #[case::all(TimeWindow::AllTime, vec!["last_month", "first", "mon", "sun", "next_week"])]
    fn test_window_filter(#[case] window: TimeWindow, #[case] expected: Vec<&str>) {
        // 2024-01-10は水曜日
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let entries = vec![
            named("last_month", Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap()),
            named("first", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            named("mon", Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap()),
            named(
                "sun",
                Utc.with_ymd_and_hms(2024, 1, 14, 23, 59, 59).unwrap()
                    + Duration::milliseconds(999),
            ),
            named("next_week", Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()),
        ];

        let ids: Vec<String> = window
            .filter(&entries, &now)
            .into_iter()
            .map(|entry| entry.id)
            .collect();

        assert_eq!(ids, expected);
    }

    #[rstest]
    #[case("week", Ok(TimeWindow::Week))]
    #[case("month", Ok(TimeWindow::Month))]
    #[case("all", Ok(TimeWindow::AllTime))]
    fn test_parse_window(#[case] input: &str, #[case] expected: Result<TimeWindow, String>) {
        assert_eq!(input.parse::<TimeWindow>(), expected);
    }

    #[test]
    fn test_parse_window_unknown() {
        assert!("year".parse::<TimeWindow>().is_err());
    }

    /// テスト用にダミーのEntryを作成する。基準日時からの経過時間で日時を決める。
    fn dummy_entry(hours: i64, kind: BristolType) -> Entry {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Entry {
            kind,
            ..named(&hours.to_string(), base + Duration::hours(hours))
        }
    }

    fn named(id: &str, date: DateTime<Utc>) -> Entry {
        Entry {
            id: id.to_string(),
            date,
            name: None,
            kind: BristolType::Type4,
            volume: Volume::Medium,
            feeling: Feeling::Easy,
            color: StoolColor::Brown,
            duration: 0,
            notes: String::new(),
            image_uri: None,
            location: None,
        }
    }
}
