use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::profile::UserProfile;
use crate::repository::RepositoryState;
use crate::stopwatch::Stopwatch;

/// エントリーとストップウォッチを保存するキー。
pub const LOG_KEY: &str = "entry-log";
/// 利用者情報を保存するキー。
pub const PROFILE_KEY: &str = "user-profile";

/// キーごとに文字列を丸ごと読み書きする永続化領域。
#[cfg_attr(test, mockall::automock)]
pub trait BlobStore {
    /// キーに対応する内容を返す。未保存の場合は`None`。
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// キーに対応する内容を丸ごと置き換える。
    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError>;
}

/// ディレクトリ内の`<key>.json`に保存する`BlobStore`。
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// 新しい`FileBlobStore`を返す。ディレクトリは最初の保存時に作成する。
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // 書き込み途中の内容が読まれないよう、一時ファイルに書いてから置き換える
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, blob).map_err(|source| StorageError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Saved {} bytes to {}", blob.len(), path.display());

        Ok(())
    }
}

/// エントリーのキーに保存される内容。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDocument {
    #[serde(flatten)]
    pub repository: RepositoryState,
    #[serde(default)]
    pub stopwatch: Stopwatch,
}

/// 固定のキーでエントリーと利用者情報を読み書きする。
///
/// 読み込みは起動時に1回、保存は変更のたびに全体を書き直す。
pub struct LogStore<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> LogStore<S> {
    /// 新しい`LogStore`を返す。
    ///
    /// # Arguments
    ///
    /// * `store` - 実際に読み書きを行う永続化領域
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn load_log(&self) -> Result<LogDocument, StorageError> {
        self.load_json(LOG_KEY)
    }

    pub fn save_log(&self, document: &LogDocument) -> Result<(), StorageError> {
        self.save_json(LOG_KEY, document)
    }

    pub fn load_profile(&self) -> Result<UserProfile, StorageError> {
        self.load_json(PROFILE_KEY)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        self.save_json(PROFILE_KEY, profile)
    }

    /// キーの内容を読み込む。未保存、または空の場合は既定値を返す。
    fn load_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, StorageError> {
        match self.store.load(key)? {
            Some(blob) if !blob.trim().is_empty() => {
                serde_json::from_str(&blob).map_err(|source| StorageError::Decode {
                    key: key.to_string(),
                    source,
                })
            }
            _ => {
                debug!("Nothing stored for {}, starting empty", key);
                Ok(T::default())
            }
        }
    }

    fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let blob = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.save(key, &blob)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;

    use super::{BlobStore, FileBlobStore, LogDocument, LogStore, MockBlobStore, LOG_KEY, PROFILE_KEY};
    use crate::entry::EntryDraft;
    use crate::error::StorageError;
    use crate::profile::UserProfile;
    use crate::repository::EntryRepository;

    #[test]
    fn test_file_store_round_trip() {
        let dir = temp_dir("file_store_round_trip");
        let store = FileBlobStore::new(&dir);

        assert!(store.load("missing").unwrap().is_none());
        store.save("key", "{\"a\":1}").unwrap();
        store.save("key", "{\"a\":2}").unwrap();

        assert_eq!(store.load("key").unwrap().as_deref(), Some("{\"a\":2}"));
        let _ = fs::remove_dir_all(dir);
    }

    /// 保存した状態を読み込むと、同じエントリーと最長記録が復元される。
    #[test]
    fn test_log_round_trip() {
        let dir = temp_dir("log_round_trip");
        let log_store = LogStore::new(FileBlobStore::new(&dir));
        let mut repository = EntryRepository::default();
        for day in 1..=3 {
            repository
                .add(EntryDraft {
                    id: Some(day.to_string()),
                    date: Some(Utc.with_ymd_and_hms(2024, 1, day, 8, 0, 0).unwrap()),
                    notes: format!("day {}", day),
                    ..EntryDraft::default()
                })
                .unwrap();
        }
        let document = LogDocument {
            repository: repository.to_state(),
            ..LogDocument::default()
        };

        log_store.save_log(&document).unwrap();
        let loaded = log_store.load_log().unwrap();

        let restored = EntryRepository::from_state(loaded.repository);
        assert_eq!(restored, repository);
        assert_eq!(restored.longest_streak(), 3);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_load_defaults_when_missing_or_empty() {
        let mut store = MockBlobStore::new();
        store
            .expect_load()
            .with(eq(LOG_KEY))
            .times(1)
            .returning(|_| Ok(None));
        store
            .expect_load()
            .with(eq(PROFILE_KEY))
            .times(1)
            .returning(|_| Ok(Some("  ".to_string())));
        let log_store = LogStore::new(store);

        assert_eq!(log_store.load_log().unwrap(), LogDocument::default());
        assert_eq!(log_store.load_profile().unwrap(), UserProfile::default());
    }

    /// 欠けている項目は既定値として扱う。
    #[test]
    fn test_load_partial_document() {
        let mut store = MockBlobStore::new();
        store
            .expect_load()
            .returning(|_| Ok(Some(r#"{"longestStreak":3}"#.to_string())));
        let log_store = LogStore::new(store);

        let document = log_store.load_log().unwrap();

        assert!(document.repository.entries.is_empty());
        assert_eq!(document.repository.longest_streak, 3);
    }

    #[test]
    fn test_load_corrupted_blob() {
        let mut store = MockBlobStore::new();
        store
            .expect_load()
            .returning(|_| Ok(Some("{not json".to_string())));
        let log_store = LogStore::new(store);

        let result = log_store.load_log();

        assert!(matches!(result, Err(StorageError::Decode { .. })));
    }

    #[test]
    fn test_save_failure_is_surfaced() {
        let mut store = MockBlobStore::new();
        store.expect_save().times(1).returning(|_, _| {
            Err(StorageError::Io {
                path: PathBuf::from("/readonly/user-profile.json"),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        });
        let log_store = LogStore::new(store);

        let result = log_store.save_profile(&UserProfile::default());

        assert!(matches!(result, Err(StorageError::Io { .. })));
    }

    #[test]
    fn test_save_writes_camel_case() {
        let saved = Arc::new(Mutex::new(String::new()));
        let captured = Arc::clone(&saved);
        let mut store = MockBlobStore::new();
        store
            .expect_save()
            .with(eq(PROFILE_KEY), mockall::predicate::always())
            .times(1)
            .returning(move |_, blob| {
                *captured.lock().unwrap() = blob.to_string();
                Ok(())
            });
        let log_store = LogStore::new(store);
        let mut profile = UserProfile::default();
        profile.set_logged_in(true);

        log_store.save_profile(&profile).unwrap();

        assert!(saved.lock().unwrap().contains("\"loggedIn\":true"));
    }

    fn temp_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("stool_log_{}_{}", name, std::process::id()));
        path
    }
}
