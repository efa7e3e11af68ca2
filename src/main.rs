use std::env;
use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

mod analysis;
mod analyze_command;
mod calendar;
mod calendar_command;
mod category;
mod config;
mod console;
mod datetime;
mod entry;
mod entry_command;
mod error;
mod logger;
mod profile;
mod profile_command;
mod repository;
mod stats;
mod stats_command;
mod stopwatch;
mod storage;
mod streak;
mod timer_command;

use analysis::{AnalysisClient, StubAnalyzer};
use analyze_command::{AnalyzeArgs, AnalyzeCommand};
use calendar_command::{CalendarArgs, CalendarCommand};
use config::{Config, LOG_LEVEL_ENV};
use console::{ConsoleMarkdownList, ConsolePresenter};
use entry_command::{AddArgs, EntryCommand, ListArgs, RemoveArgs, ShowArgs, UpdateArgs};
use profile_command::{ProfileArgs, ProfileCommand};
use stats_command::{StatsArgs, StatsCommand};
use storage::{FileBlobStore, LogStore};
use timer_command::{TimerArgs, TimerCommand};

/// 排便の記録を管理するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- timer start
/// $ cargo run -- timer stop
/// $ cargo run -- add --type 4 --volume 2
/// $ cargo run -- stats --range month
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(
        short = 'v',
        long = "verbose",
        parse(from_occurrences),
        help = "Increases log output, may be repeated"
    )]
    verbose: u8,
    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    #[clap(about = "Records an entry")]
    Add(AddArgs),
    #[clap(about = "Removes an entry")]
    Remove(RemoveArgs),
    #[clap(about = "Updates fields of an entry")]
    Update(UpdateArgs),
    #[clap(about = "Shows an entry")]
    Show(ShowArgs),
    #[clap(about = "Lists entries, newest first")]
    List(ListArgs),
    #[clap(about = "Shows statistics and the longest streak")]
    Stats(StatsArgs),
    #[clap(about = "Shows a month calendar of recorded days")]
    Calendar(CalendarArgs),
    #[clap(about = "Controls the session timer")]
    Timer(TimerArgs),
    #[clap(about = "Estimates type, volume and color from a photo")]
    Analyze(AnalyzeArgs),
    #[clap(about = "Manages the local user profile")]
    Profile(ProfileArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_level = env::var(LOG_LEVEL_ENV).ok();
    logger::setup_logger(logger::level_from_verbosity(
        args.verbose,
        env_level.as_deref(),
    ))?;

    let config = Config::from_env()?;
    info!("Data directory: {}", config.data_dir.display());
    let log_store = LogStore::new(FileBlobStore::new(&config.data_dir));

    let mut stdout = io::stdout();
    match args.subcommand {
        SubCommands::Add(add) => {
            let id = EntryCommand::new(&log_store).add(add)?;
            let entry = EntryCommand::new(&log_store).show(ShowArgs::from(id))?;
            ConsoleMarkdownList::new(&mut stdout).show_entry(&entry)?;
        }
        SubCommands::Remove(remove) => {
            EntryCommand::new(&log_store).remove(remove)?;
        }
        SubCommands::Update(update) => {
            let entry = EntryCommand::new(&log_store).update(update)?;
            ConsoleMarkdownList::new(&mut stdout).show_entry(&entry)?;
        }
        SubCommands::Show(show) => {
            let entry = EntryCommand::new(&log_store).show(show)?;
            ConsoleMarkdownList::new(&mut stdout).show_entry(&entry)?;
        }
        SubCommands::List(list) => {
            let entries = EntryCommand::new(&log_store).list(list)?;
            ConsoleMarkdownList::new(&mut stdout).show_entries(&entries)?;
        }
        SubCommands::Stats(stats) => {
            let report = StatsCommand::new(&log_store).run(stats)?;
            ConsoleMarkdownList::new(&mut stdout).show_statistics(
                report.window,
                &report.statistics,
                report.longest_streak,
            )?;
        }
        SubCommands::Calendar(calendar) => {
            let view = CalendarCommand::new(&log_store).run(calendar)?;
            let mut presenter = ConsoleMarkdownList::new(&mut stdout);
            presenter.show_calendar(&view.title, &view.grid, &view.marked)?;
            if let Some((label, entries)) = &view.selected {
                presenter.show_day(label, entries)?;
            }
        }
        SubCommands::Timer(timer) => {
            let report = TimerCommand::new(&log_store)
                .run(timer, &mut io::stdout())
                .await?;
            ConsoleMarkdownList::new(&mut stdout).show_timer(
                report.status,
                report.elapsed,
                report.long_session,
            )?;
        }
        SubCommands::Analyze(analyze) => {
            let result = if analyze.offline() {
                AnalyzeCommand::new(&log_store, &StubAnalyzer)
                    .run(analyze)
                    .await?
            } else {
                let client = AnalysisClient::new(config.analysis_url.as_str());
                AnalyzeCommand::new(&log_store, &client).run(analyze).await?
            };
            let mut presenter = ConsoleMarkdownList::new(&mut stdout);
            presenter.show_analysis(&result.report)?;
            if let Some(id) = result.saved_id {
                let entry = EntryCommand::new(&log_store).show(ShowArgs::from(id))?;
                presenter.show_entry(&entry)?;
            }
        }
        SubCommands::Profile(profile) => {
            let user = ProfileCommand::new(&log_store).run(profile)?;
            ConsoleMarkdownList::new(&mut stdout).show_profile(&user)?;
        }
    }

    Ok(())
}
