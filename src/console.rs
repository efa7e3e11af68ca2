use std::collections::BTreeSet;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};

use crate::analysis::{AnalysisReport, AnalysisSource};
use crate::category::Category;
use crate::datetime::{format_clock, format_minutes_seconds};
use crate::entry::Entry;
use crate::profile::UserProfile;
use crate::stats::{CategoryCount, Statistics, TimeWindow};
use crate::stopwatch::StopwatchStatus;

/// Consoleにエントリーや統計を表示するためのtrait。
pub trait ConsolePresenter {
    /// エントリーを一覧表示する。
    ///
    /// # Arguments
    ///
    /// * `entries` - 表示するエントリー
    fn show_entries(&mut self, entries: &[Entry]) -> Result<()>;

    /// 1件のエントリーを詳細に表示する。
    fn show_entry(&mut self, entry: &Entry) -> Result<()>;

    /// 期間の統計を表示する。
    fn show_statistics(
        &mut self,
        window: TimeWindow,
        statistics: &Statistics,
        longest_streak: u32,
    ) -> Result<()>;

    /// 月のカレンダーを表示する。記録のある日には`*`を付ける。
    fn show_calendar(
        &mut self,
        title: &str,
        grid: &[Option<NaiveDate>],
        marked: &BTreeSet<NaiveDate>,
    ) -> Result<()>;

    /// 見出しを付けて1日分のエントリーを表示する。
    fn show_day(&mut self, label: &str, entries: &[Entry]) -> Result<()>;

    /// ストップウォッチの状態を表示する。
    fn show_timer(&mut self, status: StopwatchStatus, elapsed: u64, long_session: bool) -> Result<()>;

    fn show_analysis(&mut self, report: &AnalysisReport) -> Result<()>;

    fn show_profile(&mut self, profile: &UserProfile) -> Result<()>;
}

/// エントリーをMarkdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    fn write_counts<C: Category>(&mut self, title: &str, counts: &[CategoryCount<C>]) -> Result<()> {
        writeln!(self.writer, "\n## {}", title)?;
        for count in counts {
            writeln!(self.writer, "- {}: {}", count.category.name(), count.count)?;
        }
        Ok(())
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    // entryを新しい順にlist形式で表示する。
    fn show_entries(&mut self, entries: &[Entry]) -> Result<()> {
        let mut sorted_entries = entries.to_vec();
        sorted_entries.sort_by(|left, right| right.date.cmp(&left.date));

        for entry in sorted_entries {
            writeln!(self.writer, "{}", summary_line(&entry))
                .with_context(|| format!("Failed to write entry: {:?}", entry.id))?;
        }

        Ok(())
    }

    fn show_entry(&mut self, entry: &Entry) -> Result<()> {
        let date = entry.date.with_timezone(&Local);
        writeln!(self.writer, "# {}", entry.display_name())?;
        writeln!(self.writer, "- id: {}", entry.id)?;
        writeln!(self.writer, "- date: {}", date.format("%Y-%m-%d %H:%M"))?;
        writeln!(
            self.writer,
            "- type: {} ({})",
            entry.kind.name(),
            entry.kind.description()
        )?;
        writeln!(self.writer, "- volume: {}", entry.volume)?;
        writeln!(self.writer, "- feeling: {} {}", entry.feeling.icon(), entry.feeling)?;
        writeln!(self.writer, "- color: {} ({})", entry.color, entry.color.hex())?;
        if entry.duration > 0 {
            writeln!(self.writer, "- duration: {}", format_clock(entry.duration))?;
        }
        if let Some(image_uri) = &entry.image_uri {
            writeln!(self.writer, "- image: {}", image_uri)?;
        }
        if let Some(location) = &entry.location {
            writeln!(
                self.writer,
                "- location: {} ({:.5}, {:.5})",
                location.name.as_deref().unwrap_or("unnamed"),
                location.latitude,
                location.longitude
            )?;
        }
        if !entry.notes.trim().is_empty() {
            writeln!(self.writer, "\n{}", entry.notes.trim_end())?;
        }

        Ok(())
    }

    fn show_statistics(
        &mut self,
        window: TimeWindow,
        statistics: &Statistics,
        longest_streak: u32,
    ) -> Result<()> {
        writeln!(self.writer, "# Statistics for {}", window)?;
        writeln!(self.writer, "- entries: {}", statistics.total)?;
        writeln!(
            self.writer,
            "- average duration: {}",
            format_minutes_seconds(statistics.average_duration)
        )?;
        writeln!(self.writer, "- frequency: {}", statistics.frequency)?;
        writeln!(self.writer, "- longest streak: {}", longest_streak)?;

        self.write_counts("Type", &statistics.types)?;
        self.write_counts("Volume", &statistics.volumes)?;
        self.write_counts("Feeling", &statistics.feelings)?;
        self.write_counts("Color", &statistics.colors)?;

        Ok(())
    }

    fn show_calendar(
        &mut self,
        title: &str,
        grid: &[Option<NaiveDate>],
        marked: &BTreeSet<NaiveDate>,
    ) -> Result<()> {
        writeln!(self.writer, "{}", title)?;
        writeln!(self.writer, " Su  Mo  Tu  We  Th  Fr  Sa")?;
        for week in grid.chunks(7) {
            let line: String = week
                .iter()
                .map(|cell| match cell {
                    Some(day) => {
                        let mark = if marked.contains(day) { '*' } else { ' ' };
                        format!("{:>3}{}", day.day(), mark)
                    }
                    None => "    ".to_string(),
                })
                .collect();
            writeln!(self.writer, "{}", line.trim_end())?;
        }

        Ok(())
    }

    fn show_day(&mut self, label: &str, entries: &[Entry]) -> Result<()> {
        writeln!(self.writer, "\n## {}", label)?;
        if entries.is_empty() {
            writeln!(self.writer, "No entries")?;
            return Ok(());
        }
        self.show_entries(entries)
    }

    fn show_timer(&mut self, status: StopwatchStatus, elapsed: u64, long_session: bool) -> Result<()> {
        let label = match status {
            StopwatchStatus::Idle => "idle",
            StopwatchStatus::Running => "running",
            StopwatchStatus::Stopped => "stopped",
        };
        writeln!(self.writer, "{} {}", format_clock(elapsed), label)?;
        if long_session {
            writeln!(
                self.writer,
                "You have been sitting for a while. Long sessions can strain your body."
            )?;
        }

        Ok(())
    }

    fn show_analysis(&mut self, report: &AnalysisReport) -> Result<()> {
        let outcome = &report.outcome;
        writeln!(self.writer, "# Analysis")?;
        writeln!(
            self.writer,
            "- type: {} ({})",
            outcome.kind.name(),
            outcome.kind.description()
        )?;
        writeln!(self.writer, "- volume: {}", outcome.volume)?;
        writeln!(self.writer, "- color: {} ({})", outcome.color, outcome.color.hex())?;
        if let AnalysisSource::Fallback { reason } = &report.source {
            writeln!(self.writer, "- source: placeholder ({})", reason)?;
        }
        if !outcome.explanation.is_empty() {
            writeln!(self.writer, "\n{}", outcome.explanation)?;
        }

        Ok(())
    }

    fn show_profile(&mut self, profile: &UserProfile) -> Result<()> {
        writeln!(self.writer, "# {}", profile.display_name())?;
        let state = if profile.logged_in {
            "logged in"
        } else {
            "logged out"
        };
        writeln!(self.writer, "- status: {}", state)?;
        if let Some(email) = &profile.email {
            writeln!(self.writer, "- email: {}", email)?;
        }
        if let Some(picture) = &profile.profile_picture {
            writeln!(self.writer, "- picture: {}", picture)?;
        }

        Ok(())
    }
}

/// 一覧表示の1行を作成する。
fn summary_line(entry: &Entry) -> String {
    let date_str = entry
        .date
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string();
    let duration_str = if entry.duration > 0 {
        format!(" ({})", format_clock(entry.duration))
    } else {
        String::new()
    };
    format!(
        "- {} {}: {}, {}, {}, {}{} [{}]",
        date_str,
        entry.display_name(),
        entry.kind,
        entry.volume,
        entry.feeling,
        entry.color,
        duration_str,
        entry.id
    )
}
