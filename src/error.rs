use std::path::PathBuf;

use thiserror::Error;

/// エントリーの検証や検索で発生するエラー。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    /// カテゴリの値が範囲外、またはidが重複している。
    #[error("validation failed: {0}")]
    Validation(String),

    /// 指定されたidのエントリーが存在しない。
    #[error("entry not found: {0}")]
    NotFound(String),
}

/// 永続化ストレージの読み書きで発生するエラー。
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode stored blob for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode blob for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 画像解析で発生するエラー。
///
/// 呼び出し側で必ずフォールバック結果に解決され、エントリーのリポジトリには伝播しない。
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to reach analysis service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("analysis service returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("could not understand the analysis response: {0}")]
    Parse(String),

    #[error("analysis returned an out of range value: {0}")]
    OutOfRange(#[from] EntryError),
}
