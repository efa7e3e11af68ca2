use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use log::{info, warn};

use crate::datetime::{end_of_day, parse_day, start_of_day};
use crate::entry::{
    Entry, EntryDraft, EntryPatch, Location, DEFAULT_COLOR, DEFAULT_FEELING, DEFAULT_TYPE,
    DEFAULT_VOLUME,
};
use crate::error::EntryError;
use crate::repository::EntryRepository;
use crate::storage::{BlobStore, LogDocument, LogStore};
use crate::stopwatch::Stopwatch;

/// エントリーを記録するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct AddArgs {
    #[clap(long, help = "Display name, defaults to the time of day")]
    name: Option<String>,
    #[clap(
        short = 't',
        long = "type",
        default_value_t = DEFAULT_TYPE,
        help = "Bristol stool type (1-7)"
    )]
    kind: u8,
    #[clap(long, default_value_t = DEFAULT_VOLUME, help = "Volume (1 small, 2 medium, 3 large)")]
    volume: u8,
    #[clap(
        long,
        default_value_t = DEFAULT_FEELING,
        help = "Feeling (1 easy, 2 moderate, 3 difficult, 4 incomplete)"
    )]
    feeling: u8,
    #[clap(long, default_value_t = DEFAULT_COLOR, help = "Color (1-7)")]
    color: u8,
    #[clap(
        short = 'd',
        long,
        help = "Duration in seconds, defaults to the last stopped timer"
    )]
    duration: Option<u64>,
    #[clap(short = 'n', long, default_value = "", help = "Free text notes")]
    notes: String,
    #[clap(long, help = "Path or URI of an attached photo")]
    image: Option<String>,
    #[clap(long, requires = "longitude", allow_hyphen_values = true)]
    latitude: Option<f64>,
    #[clap(long, requires = "latitude", allow_hyphen_values = true)]
    longitude: Option<f64>,
    #[clap(long, requires = "latitude", help = "Name of the place")]
    place: Option<String>,
}

/// エントリーを削除するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct RemoveArgs {
    #[clap(help = "Id of the entry")]
    id: String,
}

/// エントリーを部分的に更新するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct UpdateArgs {
    #[clap(help = "Id of the entry")]
    id: String,
    #[clap(long)]
    name: Option<String>,
    #[clap(short = 't', long = "type", help = "Bristol stool type (1-7)")]
    kind: Option<u8>,
    #[clap(long)]
    volume: Option<u8>,
    #[clap(long)]
    feeling: Option<u8>,
    #[clap(long)]
    color: Option<u8>,
    #[clap(short = 'd', long, help = "Duration in seconds")]
    duration: Option<u64>,
    #[clap(short = 'n', long)]
    notes: Option<String>,
    #[clap(long)]
    image: Option<String>,
    #[clap(long, requires = "longitude", allow_hyphen_values = true)]
    latitude: Option<f64>,
    #[clap(long, requires = "latitude", allow_hyphen_values = true)]
    longitude: Option<f64>,
    #[clap(long, requires = "latitude")]
    place: Option<String>,
}

/// 1件のエントリーを表示するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ShowArgs {
    #[clap(help = "Id of the entry")]
    id: String,
}

impl From<String> for ShowArgs {
    fn from(id: String) -> Self {
        Self { id }
    }
}

/// エントリーを一覧表示するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ListArgs {
    #[clap(
        long,
        help = "First day in the format YYYY-MM-DD",
        parse(try_from_str = parse_day),
    )]
    from: Option<NaiveDate>,
    #[clap(
        long,
        help = "Last day in the format YYYY-MM-DD",
        parse(try_from_str = parse_day),
    )]
    to: Option<NaiveDate>,
}

pub struct EntryCommand<'a, S: BlobStore> {
    log_store: &'a LogStore<S>,
}

impl<'a, S: BlobStore> EntryCommand<'a, S> {
    /// 新しい`EntryCommand`を返す。
    ///
    /// # Arguments
    /// * `log_store` - エントリーを読み書きするストア
    pub fn new(log_store: &'a LogStore<S>) -> Self {
        Self { log_store }
    }

    /// `add`サブコマンドの処理を行い、作成したエントリーのidを返す。
    ///
    /// 所要時間が指定されていない場合は、停止済みのストップウォッチの値を使う。
    /// 記録後はストップウォッチをリセットする。計測中の場合はそのまま残す。
    pub fn add(&self, args: AddArgs) -> Result<String> {
        let mut document = self.load()?;
        let mut repository = EntryRepository::from_state(document.repository);

        let duration = args
            .duration
            .or_else(|| document.stopwatch.committed_duration())
            .unwrap_or(0);
        let draft = EntryDraft {
            name: args.name,
            kind: args.kind,
            volume: args.volume,
            feeling: args.feeling,
            color: args.color,
            duration,
            notes: args.notes,
            image_uri: args.image,
            location: location(args.latitude, args.longitude, args.place),
            ..EntryDraft::default()
        };
        let id = repository.add(draft).context("Failed to add entry")?;
        if document.stopwatch.is_running() {
            info!("Timer is still running and was left as is");
        } else {
            document.stopwatch.reset();
        }

        self.save(repository, document.stopwatch)?;
        info!("Added entry {}", id);

        Ok(id)
    }

    /// `remove`サブコマンドの処理を行う。削除した場合は`true`を返す。
    pub fn remove(&self, args: RemoveArgs) -> Result<bool> {
        let document = self.load()?;
        let mut repository = EntryRepository::from_state(document.repository);
        if repository.by_id(&args.id).is_none() {
            warn!("No entry found for id {}", args.id);
            return Ok(false);
        }

        repository.remove(&args.id);
        self.save(repository, document.stopwatch)?;
        info!("Removed entry {}", args.id);

        Ok(true)
    }

    /// `update`サブコマンドの処理を行い、更新後のエントリーを返す。
    pub fn update(&self, args: UpdateArgs) -> Result<Entry> {
        let patch = EntryPatch {
            name: args.name,
            kind: args.kind,
            volume: args.volume,
            feeling: args.feeling,
            color: args.color,
            duration: args.duration,
            notes: args.notes,
            image_uri: args.image,
            location: location(args.latitude, args.longitude, args.place),
        };
        if patch.is_empty() {
            bail!("Nothing to update for entry {}", args.id);
        }

        let document = self.load()?;
        let mut repository = EntryRepository::from_state(document.repository);
        repository
            .update(&args.id, &patch)
            .with_context(|| format!("Failed to update entry {}", args.id))?;
        let entry = find(&repository, &args.id)?;

        self.save(repository, document.stopwatch)?;
        info!("Updated entry {}", args.id);

        Ok(entry)
    }

    /// `show`サブコマンドの処理を行う。
    pub fn show(&self, args: ShowArgs) -> Result<Entry> {
        let document = self.load()?;
        let repository = EntryRepository::from_state(document.repository);

        find(&repository, &args.id)
    }

    /// `list`サブコマンドの処理を行う。
    ///
    /// 期間はLocalタイムゾーンの暦日で指定し、両端の日を含む。
    /// 期間が指定されていない場合は全てのエントリーを新しい順に返す。
    pub fn list(&self, args: ListArgs) -> Result<Vec<Entry>> {
        let document = self.load()?;
        let repository = EntryRepository::from_state(document.repository);
        if repository.is_empty() {
            info!("No entries recorded yet");
        }

        if args.from.is_none() && args.to.is_none() {
            return Ok(repository.sorted_newest_first());
        }

        let start_at = args
            .from
            .map_or(DateTime::<Utc>::MIN_UTC, |day| start_of_day(&Local, day));
        let end_at = args
            .to
            .map_or(DateTime::<Utc>::MAX_UTC, |day| end_of_day(&Local, day));
        if start_at > end_at {
            bail!("The first day must not be after the last day");
        }
        info!("Start at: {}, End at: {}", start_at, end_at);

        Ok(repository.by_date_range(start_at, end_at))
    }

    fn load(&self) -> Result<LogDocument> {
        self.log_store
            .load_log()
            .context("Failed to load entry log")
    }

    fn save(&self, repository: EntryRepository, stopwatch: Stopwatch) -> Result<()> {
        let document = LogDocument {
            repository: repository.to_state(),
            stopwatch,
        };
        self.log_store
            .save_log(&document)
            .context("Failed to save entry log")
    }
}

fn find(repository: &EntryRepository, id: &str) -> Result<Entry> {
    let entry = repository
        .by_id(id)
        .cloned()
        .ok_or_else(|| EntryError::NotFound(id.to_string()))?;
    Ok(entry)
}

/// 緯度と経度が揃っている場合だけ場所を作成する。
fn location(latitude: Option<f64>, longitude: Option<f64>, name: Option<String>) -> Option<Location> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Location {
            latitude,
            longitude,
            name,
        }),
        _ => None,
    }
}
