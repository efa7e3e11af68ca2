use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate, TimeZone};
use log::info;

use crate::calendar::{days_with_entries, entries_on, month_grid};
use crate::datetime::{now, parse_day, parse_month, relative_day_label};
use crate::entry::Entry;
use crate::repository::EntryRepository;
use crate::storage::{BlobStore, LogStore};

/// 月のカレンダーを出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct CalendarArgs {
    #[clap(
        short = 'm',
        long = "month",
        help = "Sets a custom month in the format YYYY-MM",
        parse(try_from_str = parse_month),
    )]
    month: Option<NaiveDate>,
    #[clap(
        short = 'd',
        long = "day",
        help = "Lists the entries of a day in the format YYYY-MM-DD",
        parse(try_from_str = parse_day),
    )]
    day: Option<NaiveDate>,
}

/// カレンダーの表示に必要な値。
#[derive(Clone, Debug, PartialEq)]
pub struct CalendarView {
    pub title: String,
    pub grid: Vec<Option<NaiveDate>>,
    pub marked: BTreeSet<NaiveDate>,
    /// 日が指定された場合の見出しとエントリー。
    pub selected: Option<(String, Vec<Entry>)>,
}

pub struct CalendarCommand<'a, S: BlobStore> {
    log_store: &'a LogStore<S>,
}

impl<'a, S: BlobStore> CalendarCommand<'a, S> {
    /// 新しい`CalendarCommand`を返す。
    pub fn new(log_store: &'a LogStore<S>) -> Self {
        Self { log_store }
    }

    /// `calendar`サブコマンドの処理を行う。
    ///
    /// 月が指定されていない場合は、日が指定されていればその月、なければLocalタイムゾーンの今月を表示する。
    pub fn run(&self, args: CalendarArgs) -> Result<CalendarView> {
        let today = now().with_timezone(&Local).date_naive();
        self.run_in(args, &Local, today)
    }

    fn run_in<Tz: TimeZone>(&self, args: CalendarArgs, tz: &Tz, today: NaiveDate) -> Result<CalendarView> {
        let document = self
            .log_store
            .load_log()
            .context("Failed to load entry log")?;
        let repository = EntryRepository::from_state(document.repository);
        let entries = repository.all();

        let month = args.month.or(args.day).unwrap_or(today);
        info!("Showing calendar for {}", month.format("%Y-%m"));
        let marked = days_with_entries(&entries, tz)
            .into_iter()
            .filter(|day| day.year() == month.year() && day.month() == month.month())
            .collect();
        let selected = args.day.map(|day| {
            let mut day_entries = entries_on(&entries, day, tz);
            day_entries.sort_by(|left, right| right.date.cmp(&left.date));
            (relative_day_label(day, today), day_entries)
        });

        Ok(CalendarView {
            title: month.format("%B %Y").to_string(),
            grid: month_grid(month.year(), month.month()),
            marked,
            selected,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::{CalendarArgs, CalendarCommand};
    use crate::storage::testing::recording_store;
    use crate::storage::{LogStore, LOG_KEY};

    const LOG: &str = r#"{
        "entries": [
            {"id": "a", "date": "2024-01-31T08:00:00Z", "type": 4, "volume": 2, "feeling": 1, "color": 1},
            {"id": "b", "date": "2024-02-02T08:00:00Z", "type": 4, "volume": 2, "feeling": 1, "color": 1},
            {"id": "c", "date": "2024-02-02T18:00:00Z", "type": 5, "volume": 2, "feeling": 1, "color": 1}
        ]
    }"#;

    fn day(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    #[test]
    fn test_calendar_marks_only_shown_month() {
        let (store, _) = recording_store(&[(LOG_KEY, LOG)]);
        let log_store = LogStore::new(store);
        let args = CalendarArgs {
            month: Some(day(2, 1)),
            day: None,
        };

        let view = CalendarCommand::new(&log_store)
            .run_in(args, &Utc, day(3, 10))
            .unwrap();

        assert_eq!(view.title, "February 2024");
        assert_eq!(view.grid.len(), 4 + 29);
        assert_eq!(view.marked.into_iter().collect::<Vec<_>>(), vec![day(2, 2)]);
        assert!(view.selected.is_none());
    }

    #[test]
    fn test_calendar_selected_day() {
        let (store, _) = recording_store(&[(LOG_KEY, LOG)]);
        let log_store = LogStore::new(store);
        let args = CalendarArgs {
            month: None,
            day: Some(day(2, 2)),
        };

        let view = CalendarCommand::new(&log_store)
            .run_in(args, &Utc, day(2, 3))
            .unwrap();

        let (label, entries) = view.selected.unwrap();
        assert_eq!(view.title, "February 2024");
        assert_eq!(label, "Yesterday");
        let ids: Vec<String> = entries.into_iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_calendar_defaults_to_current_month() {
        let (store, _) = recording_store(&[]);
        let log_store = LogStore::new(store);
        let args = CalendarArgs {
            month: None,
            day: None,
        };

        let view = CalendarCommand::new(&log_store)
            .run_in(args, &Utc, day(1, 15))
            .unwrap();

        assert_eq!(view.title, "January 2024");
        assert!(view.marked.is_empty());
    }
}
