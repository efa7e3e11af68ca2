use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use log::info;

use crate::datetime::now;
use crate::repository::EntryRepository;
use crate::stats::{Statistics, TimeWindow};
use crate::storage::{BlobStore, LogStore};

/// 期間の統計を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct StatsArgs {
    #[clap(
        short = 'r',
        long = "range",
        default_value = "week",
        help = "Time range: week, month or all"
    )]
    range: TimeWindow,
}

/// 統計の表示に必要な値。
#[derive(Clone, Debug, PartialEq)]
pub struct StatsReport {
    pub window: TimeWindow,
    pub statistics: Statistics,
    pub longest_streak: u32,
}

pub struct StatsCommand<'a, S: BlobStore> {
    log_store: &'a LogStore<S>,
}

impl<'a, S: BlobStore> StatsCommand<'a, S> {
    /// 新しい`StatsCommand`を返す。
    pub fn new(log_store: &'a LogStore<S>) -> Self {
        Self { log_store }
    }

    /// `stats`サブコマンドの処理を行う。
    ///
    /// 週と月の範囲はLocalタイムゾーンの現在日時から決める。
    pub fn run(&self, args: StatsArgs) -> Result<StatsReport> {
        self.run_at(args, &now().with_timezone(&Local))
    }

    fn run_at<Tz: TimeZone>(&self, args: StatsArgs, reference: &DateTime<Tz>) -> Result<StatsReport> {
        let document = self
            .log_store
            .load_log()
            .context("Failed to load entry log")?;
        let repository = EntryRepository::from_state(document.repository);

        let entries = args.range.filter(&repository.all(), reference);
        info!(
            "Computing statistics for {} of {} entries in {}",
            entries.len(),
            repository.len(),
            args.range
        );

        Ok(StatsReport {
            window: args.range,
            statistics: Statistics::compute(&entries),
            longest_streak: repository.longest_streak(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::{StatsArgs, StatsCommand};
    use crate::category::{BristolType, Category};
    use crate::stats::{Frequency, TimeWindow};
    use crate::storage::testing::recording_store;
    use crate::storage::{LogStore, LOG_KEY};

    const LOG: &str = r#"{
        "entries": [
            {"id": "old", "date": "2023-12-20T08:00:00Z", "type": 1,
             "volume": 1, "feeling": 3, "color": 2, "duration": 600},
            {"id": "mon", "date": "2024-01-08T08:00:00Z", "type": 4,
             "volume": 2, "feeling": 1, "color": 1, "duration": 60},
            {"id": "evening", "date": "2024-01-08T20:00:00Z", "type": 4,
             "volume": 2, "feeling": 1, "color": 1, "duration": 121}
        ],
        "longestStreak": 2
    }"#;

    /// 2024-01-10（水）を基準に集計する。
    #[rstest]
    #[case::week(TimeWindow::Week, 2, Frequency::Hours(12), 91)]
    #[case::month(TimeWindow::Month, 2, Frequency::Hours(12), 91)]
    #[case::all_time(TimeWindow::AllTime, 3, Frequency::Days(10), 260)]
    fn test_stats_command(
        #[case] range: TimeWindow,
        #[case] total: usize,
        #[case] frequency: Frequency,
        #[case] average_duration: u64,
    ) {
        let (store, saved) = recording_store(&[(LOG_KEY, LOG)]);
        let log_store = LogStore::new(store);
        let reference = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();

        let report = StatsCommand::new(&log_store)
            .run_at(StatsArgs { range }, &reference)
            .unwrap();

        assert_eq!(report.window, range);
        assert_eq!(report.statistics.total, total);
        assert_eq!(report.statistics.frequency, frequency);
        assert_eq!(report.statistics.average_duration, average_duration);
        assert_eq!(report.statistics.types[0].category, BristolType::Type4);
        assert_eq!(report.longest_streak, 2);
        assert!(saved.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stats_command_empty_log() {
        let (store, _) = recording_store(&[]);
        let log_store = LogStore::new(store);

        let report = StatsCommand::new(&log_store)
            .run(StatsArgs {
                range: TimeWindow::AllTime,
            })
            .unwrap();

        assert_eq!(report.statistics.total, 0);
        assert_eq!(report.statistics.frequency, Frequency::NotApplicable);
        assert_eq!(report.statistics.types.len(), BristolType::ALL.len());
    }
}
