use chrono::{DateTime, Local, Timelike, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};

use crate::category::{BristolType, Category, Feeling, StoolColor, Volume};
use crate::datetime::default_entry_name;
use crate::error::EntryError;

const ID_SUFFIX_LEN: usize = 6;

/// 入力フォームの既定値。
pub const DEFAULT_TYPE: u8 = 4;
pub const DEFAULT_VOLUME: u8 = 2;
pub const DEFAULT_FEELING: u8 = 1;
pub const DEFAULT_COLOR: u8 = 1;

/// エントリーに紐づく場所。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// 記録された1回分のエントリー。
///
/// `id`と`date`は作成後に変更しない。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: BristolType,
    pub volume: Volume,
    pub feeling: Feeling,
    pub color: StoolColor,
    /// 秒数。0は未計測。
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Entry {
    /// 表示名を返す。名前がない場合は記録時刻の時間帯から作成する。
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => default_entry_name(self.date.with_timezone(&Local).hour()),
        }
    }
}

/// 入力フォームから作成される、検証前のエントリー。
///
/// カテゴリは整数コードのまま保持し、`into_entry`で範囲を検証する。
#[derive(Clone, Debug, PartialEq)]
pub struct EntryDraft {
    pub id: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub kind: u8,
    pub volume: u8,
    pub feeling: u8,
    pub color: u8,
    pub duration: u64,
    pub notes: String,
    pub image_uri: Option<String>,
    pub location: Option<Location>,
}

impl Default for EntryDraft {
    fn default() -> Self {
        Self {
            id: None,
            date: None,
            name: None,
            kind: DEFAULT_TYPE,
            volume: DEFAULT_VOLUME,
            feeling: DEFAULT_FEELING,
            color: DEFAULT_COLOR,
            duration: 0,
            notes: String::new(),
            image_uri: None,
            location: None,
        }
    }
}

impl EntryDraft {
    /// 画像解析の説明をメモの先頭に追加する。
    pub fn prepend_analysis(&mut self, explanation: &str) {
        if explanation.trim().is_empty() {
            return;
        }
        self.notes = format!("AI Analysis: {}\n\n{}", explanation, self.notes);
    }

    /// カテゴリを検証し、エントリーに変換する。
    ///
    /// idと日時が指定されていない場合は`now`から作成する。
    ///
    /// # Arguments
    ///
    /// * `now` - 作成日時として利用する現在時刻
    pub fn into_entry(self, now: DateTime<Utc>) -> Result<Entry, EntryError> {
        let kind = BristolType::parse_code(self.kind)?;
        let volume = Volume::parse_code(self.volume)?;
        let feeling = Feeling::parse_code(self.feeling)?;
        let color = StoolColor::parse_code(self.color)?;
        let date = self.date.unwrap_or(now);

        Ok(Entry {
            id: self.id.unwrap_or_else(|| generate_id(now)),
            date,
            name: Some(
                self.name
                    .unwrap_or_else(|| default_entry_name(date.with_timezone(&Local).hour())),
            ),
            kind,
            volume,
            feeling,
            color,
            duration: self.duration,
            notes: self.notes,
            image_uri: self.image_uri,
            location: self.location,
        })
    }
}

/// エントリーの部分更新。`id`と`date`は更新できない。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryPatch {
    pub name: Option<String>,
    pub kind: Option<u8>,
    pub volume: Option<u8>,
    pub feeling: Option<u8>,
    pub color: Option<u8>,
    pub duration: Option<u64>,
    pub notes: Option<String>,
    pub image_uri: Option<String>,
    pub location: Option<Location>,
}

impl EntryPatch {
    /// 変更内容が含まれていない場合に`true`を返す。
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// カテゴリの範囲を検証し、`entry`に適用する。
    ///
    /// 検証に失敗した場合、`entry`は変更されない。
    pub fn merge_into(&self, entry: &mut Entry) -> Result<(), EntryError> {
        let kind = self.kind.map(BristolType::parse_code).transpose()?;
        let volume = self.volume.map(Volume::parse_code).transpose()?;
        let feeling = self.feeling.map(Feeling::parse_code).transpose()?;
        let color = self.color.map(StoolColor::parse_code).transpose()?;

        if let Some(name) = &self.name {
            entry.name = Some(name.clone());
        }
        if let Some(kind) = kind {
            entry.kind = kind;
        }
        if let Some(volume) = volume {
            entry.volume = volume;
        }
        if let Some(feeling) = feeling {
            entry.feeling = feeling;
        }
        if let Some(color) = color {
            entry.color = color;
        }
        if let Some(duration) = self.duration {
            entry.duration = duration;
        }
        if let Some(notes) = &self.notes {
            entry.notes = notes.clone();
        }
        if let Some(image_uri) = &self.image_uri {
            entry.image_uri = Some(image_uri.clone());
        }
        if let Some(location) = &self.location {
            entry.location = Some(location.clone());
        }

        Ok(())
    }
}

/// エントリーのidを作成する。
///
/// ミリ秒単位の時刻にランダムな英数字を付けたもので、一意であることだけを保証する。
pub fn generate_id(now: DateTime<Utc>) -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}-{}", now.timestamp_millis(), suffix)
}
