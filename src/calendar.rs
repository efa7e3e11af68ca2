use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, TimeZone};

use crate::datetime::{first_day_of_month, last_day_of_month};
use crate::entry::Entry;

/// 月表示のカレンダーのマス目。1日より前の曜日は空欄（`None`）になる。
///
/// 週は日曜始まりで並べる。
pub fn month_grid(year: i32, month: u32) -> Vec<Option<NaiveDate>> {
    let (first, last) = match (first_day_of_month(year, month), last_day_of_month(year, month)) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };

    let leading_blanks = first.weekday().num_days_from_sunday() as usize;
    let mut days: Vec<Option<NaiveDate>> = vec![None; leading_blanks];
    days.extend(first.iter_days().take_while(|day| *day <= last).map(Some));
    days
}

/// 指定したタイムゾーンの暦日に記録されたエントリーを返す。
pub fn entries_on<Tz: TimeZone>(entries: &[Entry], day: NaiveDate, tz: &Tz) -> Vec<Entry> {
    entries
        .iter()
        .filter(|entry| entry.date.with_timezone(tz).date_naive() == day)
        .cloned()
        .collect()
}

/// エントリーが記録されている暦日の集合を返す。
pub fn days_with_entries<Tz: TimeZone>(entries: &[Entry], tz: &Tz) -> BTreeSet<NaiveDate> {
    entries
        .iter()
        .map(|entry| entry.date.with_timezone(tz).date_naive())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

    use super::{days_with_entries, entries_on, month_grid};
    use crate::category::{BristolType, Feeling, StoolColor, Volume};
    use crate::entry::Entry;

    /// 2024年2月は木曜始まりなので4つの空欄の後に29日が並ぶ。
    #[test]
    fn test_month_grid_leading_blanks() {
        let grid = month_grid(2024, 2);

        assert_eq!(grid.len(), 4 + 29);
        assert!(grid[..4].iter().all(Option::is_none));
        assert_eq!(grid[4], NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(grid.last().copied().flatten(), NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    /// 日曜始まりの月には空欄がない。
    #[test]
    fn test_month_grid_starting_sunday() {
        let grid = month_grid(2023, 10);

        assert_eq!(grid.len(), 31);
        assert_eq!(grid[0], NaiveDate::from_ymd_opt(2023, 10, 1));
    }

    #[test]
    fn test_month_grid_invalid_month() {
        assert!(month_grid(2024, 13).is_empty());
    }

    #[test]
    fn test_entries_on_uses_timezone() {
        let entries = vec![
            entry("late", Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap()),
            entry("next", Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()),
        ];
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let jan2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        let in_utc: Vec<String> = entries_on(&entries, jan2, &Utc)
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        let in_tokyo: Vec<String> = entries_on(&entries, jan2, &tokyo)
            .into_iter()
            .map(|entry| entry.id)
            .collect();

        assert_eq!(in_utc, vec!["next"]);
        assert_eq!(in_tokyo, vec!["late", "next"]);
    }

    #[test]
    fn test_days_with_entries() {
        let entries = vec![
            entry("a", Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()),
            entry("b", Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap()),
            entry("c", Utc.with_ymd_and_hms(2024, 1, 3, 8, 0, 0).unwrap()),
        ];

        let days = days_with_entries(&entries, &Utc);

        assert_eq!(days.len(), 2);
        assert!(days.contains(&NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()));
    }

    fn entry(id: &str, date: chrono::DateTime<Utc>) -> Entry {
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
