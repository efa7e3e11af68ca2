use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::datetime::now;
use crate::entry::{Entry, EntryDraft, EntryPatch};
use crate::error::EntryError;
use crate::streak::updated_longest;

/// 永続化されるリポジトリの状態。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryState {
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub longest_streak: u32,
}

/// エントリーの集合と最長連続日数を管理するリポジトリ。
///
/// 全ての変更はメソッドを経由して行う。挿入順に意味はなく、表示側で日付順に並べ替える。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryRepository {
    entries: Vec<Entry>,
    longest_streak: u32,
}

impl EntryRepository {
    /// 永続化された状態から`EntryRepository`を復元する。
    pub fn from_state(state: RepositoryState) -> Self {
        Self {
            entries: state.entries,
            longest_streak: state.longest_streak,
        }
    }

    /// 永続化するための状態を返す。
    pub fn to_state(&self) -> RepositoryState {
        RepositoryState {
            entries: self.entries.clone(),
            longest_streak: self.longest_streak,
        }
    }

    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// エントリーを検証して追加し、作成されたidを返す。
    ///
    /// カテゴリが範囲外の場合やidが重複している場合はエラーを返し、集合は変更しない。
    /// 追加に成功した場合は最長連続日数を更新する。
    ///
    /// # Arguments
    ///
    /// * `draft` - 入力フォームから作成されたエントリー
    pub fn add(&mut self, draft: EntryDraft) -> Result<String, EntryError> {
        let entry = draft.into_entry(now())?;
        if self.by_id(&entry.id).is_some() {
            return Err(EntryError::Validation(format!(
                "duplicate entry id: {}",
                entry.id
            )));
        }

        let id = entry.id.clone();
        self.entries.push(entry);
        self.longest_streak = updated_longest(self.longest_streak, &self.entries);
        debug!(
            "Added entry {}, longest streak is {}",
            id, self.longest_streak
        );

        Ok(id)
    }

    /// 指定されたidのエントリーを削除する。存在しない場合は何もしない。
    ///
    /// 最長連続日数は再計算しない。
    pub fn remove(&mut self, id: &str) {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            debug!("No entry to remove for id {}", id);
        }
    }

    /// 指定されたidのエントリーに部分更新を適用する。
    ///
    /// 最長連続日数は再計算しない。
    pub fn update(&mut self, id: &str, patch: &EntryPatch) -> Result<(), EntryError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| EntryError::NotFound(id.to_string()))?;

        patch.merge_into(entry)
    }

    pub fn by_id(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// `start`から`end`まで（両端を含む）に記録されたエントリーを返す。順序は保証しない。
    pub fn by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Entry> {
        self.entries
            .iter()
            .filter(|entry| entry.date >= start && entry.date <= end)
            .cloned()
            .collect()
    }

    /// 全エントリーのコピーを返す。
    pub fn all(&self) -> Vec<Entry> {
        self.entries.clone()
    }

    /// 全エントリーを新しい順に並べて返す。
    pub fn sorted_newest_first(&self) -> Vec<Entry> {
        let mut entries = self.all();
        entries.sort_by(|left, right| right.date.cmp(&left.date));
        entries
    }
}
