use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::datetime::format_clock;
use crate::stopwatch::{Stopwatch, StopwatchStatus, LONG_SESSION_SECS};
use crate::storage::{BlobStore, LogDocument, LogStore};

/// ストップウォッチを操作するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct TimerArgs {
    #[clap(subcommand)]
    action: TimerAction,
}

#[derive(Debug, clap::Subcommand)]
pub enum TimerAction {
    #[clap(about = "Starts timing a session")]
    Start,
    #[clap(about = "Stops the timer and keeps the elapsed seconds for the next entry")]
    Stop,
    #[clap(about = "Clears the timer")]
    Reset,
    #[clap(about = "Shows the timer")]
    Status,
    #[clap(about = "Shows the running timer every second until Ctrl-C")]
    Watch,
}

/// ストップウォッチの状態。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerReport {
    pub status: StopwatchStatus,
    pub elapsed: u64,
    pub long_session: bool,
}

impl From<&Stopwatch> for TimerReport {
    fn from(stopwatch: &Stopwatch) -> Self {
        Self {
            status: stopwatch.status(),
            elapsed: stopwatch.elapsed(),
            long_session: stopwatch.is_long_session(),
        }
    }
}

pub struct TimerCommand<'a, S: BlobStore> {
    log_store: &'a LogStore<S>,
}

impl<'a, S: BlobStore> TimerCommand<'a, S> {
    /// 新しい`TimerCommand`を返す。
    pub fn new(log_store: &'a LogStore<S>) -> Self {
        Self { log_store }
    }

    /// `timer`サブコマンドの処理を行う。
    ///
    /// # Arguments
    ///
    /// * `timer` - `timer`サブコマンドの引数
    /// * `writer` - `watch`で経過時間を書き出す先
    pub async fn run<W: Write>(&self, timer: TimerArgs, writer: &mut W) -> Result<TimerReport> {
        let mut document = self.load()?;

        match timer.action {
            TimerAction::Start => {
                document.stopwatch.start();
                self.save(&document)?;
                if let Some(started_at) = document.stopwatch.started_at() {
                    info!("Timer started at {}", started_at);
                }
            }
            TimerAction::Stop => {
                let elapsed = document.stopwatch.stop();
                self.save(&document)?;
                info!("Timer stopped at {}", format_clock(elapsed));
            }
            TimerAction::Reset => {
                document.stopwatch.reset();
                self.save(&document)?;
                info!("Timer reset");
            }
            TimerAction::Status => {}
            TimerAction::Watch => return self.watch(writer).await,
        }

        Ok(TimerReport::from(&document.stopwatch))
    }

    /// 計測中の経過時間を1秒ごとに書き出す。
    ///
    /// Ctrl-Cを受け取るか、別のプロセスで計測が止められた時点で終了する。
    async fn watch<W: Write>(&self, writer: &mut W) -> Result<TimerReport> {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut warned = false;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let stopwatch = self.load()?.stopwatch;
                    if !stopwatch.is_running() {
                        writeln!(writer)?;
                        return Ok(TimerReport::from(&stopwatch));
                    }

                    write!(writer, "\r{}", format_clock(stopwatch.elapsed()))?;
                    writer.flush()?;
                    if stopwatch.is_long_session() && !warned {
                        warned = true;
                        warn!(
                            "You have been sitting for more than {} minutes",
                            LONG_SESSION_SECS / 60
                        );
                    }
                }
                result = &mut ctrl_c => {
                    result.context("Failed to listen for Ctrl-C")?;
                    writeln!(writer)?;
                    break;
                }
            }
        }

        let stopwatch = self.load()?.stopwatch;
        Ok(TimerReport::from(&stopwatch))
    }

    fn load(&self) -> Result<LogDocument> {
        self.log_store
            .load_log()
            .context("Failed to load entry log")
    }

    fn save(&self, document: &LogDocument) -> Result<()> {
        self.log_store
            .save_log(document)
            .context("Failed to save entry log")
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::{TimerAction, TimerArgs, TimerCommand, TimerReport};
    use crate::datetime::mock_datetime;
    use crate::storage::testing::recording_store;
    use crate::storage::{LogDocument, LogStore, LOG_KEY};
    use crate::stopwatch::StopwatchStatus;

    const RUNNING_LOG: &str = r#"{
        "entries": [],
        "stopwatch": {"status": "running", "startedAt": "2024-01-01T08:00:00Z", "lastDuration": null}
    }"#;

    async fn run(initial: &[(&str, &str)], action: TimerAction) -> (TimerReport, Option<LogDocument>) {
        let (store, saved) = recording_store(initial);
        let log_store = LogStore::new(store);
        let mut writer = Vec::new();

        let report = TimerCommand::new(&log_store)
            .run(TimerArgs { action }, &mut writer)
            .await
            .unwrap();

        let document = saved
            .lock()
            .unwrap()
            .get(LOG_KEY)
            .map(|blob| serde_json::from_str(blob).unwrap());
        (report, document)
    }

    #[tokio::test]
    async fn test_start_persists_running_timer() {
        mock_datetime::set_mock_time(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());

        let (report, document) = run(&[], TimerAction::Start).await;

        assert_eq!(report.status, StopwatchStatus::Running);
        assert_eq!(report.elapsed, 0);
        let stopwatch = document.unwrap().stopwatch;
        assert_eq!(
            stopwatch.started_at(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap())
        );
        mock_datetime::clear_mock_time();
    }

    #[rstest]
    #[case::short(90, false)]
    #[case::long(301, true)]
    #[tokio::test]
    async fn test_stop_records_elapsed(#[case] seconds: i64, #[case] long_session: bool) {
        mock_datetime::set_mock_time(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());
        mock_datetime::advance_mock_time(seconds);

        let (report, document) = run(&[(LOG_KEY, RUNNING_LOG)], TimerAction::Stop).await;

        assert_eq!(report.status, StopwatchStatus::Stopped);
        assert_eq!(report.elapsed, seconds as u64);
        assert_eq!(report.long_session, long_session);
        assert_eq!(document.unwrap().stopwatch.last_duration(), Some(seconds as u64));
        mock_datetime::clear_mock_time();
    }

    #[tokio::test]
    async fn test_status_does_not_save() {
        mock_datetime::set_mock_time(Utc.with_ymd_and_hms(2024, 1, 1, 8, 1, 5).unwrap());

        let (report, document) = run(&[(LOG_KEY, RUNNING_LOG)], TimerAction::Status).await;

        assert_eq!(report.elapsed, 65);
        assert!(document.is_none());
        mock_datetime::clear_mock_time();
    }

    #[tokio::test]
    async fn test_reset() {
        let (report, document) = run(&[(LOG_KEY, RUNNING_LOG)], TimerAction::Reset).await;

        assert_eq!(report.status, StopwatchStatus::Idle);
        assert_eq!(report.elapsed, 0);
        assert!(document.unwrap().stopwatch.started_at().is_none());
    }

    /// 計測中でなければすぐに終了する。
    #[tokio::test]
    async fn test_watch_idle_timer_returns() {
        let (report, document) = run(&[], TimerAction::Watch).await;

        assert_eq!(report.status, StopwatchStatus::Idle);
        assert!(document.is_none());
    }
}
