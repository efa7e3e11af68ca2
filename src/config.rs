use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::analysis::DEFAULT_ANALYSIS_URL;

/// 保存先ディレクトリを指定する環境変数。
pub const DATA_DIR_ENV: &str = "STOOL_LOG_DATA_DIR";
/// 画像解析のURLを指定する環境変数。
pub const ANALYSIS_URL_ENV: &str = "STOOL_LOG_ANALYSIS_URL";
/// ログレベルを指定する環境変数。
pub const LOG_LEVEL_ENV: &str = "STOOL_LOG_LEVEL";

const APP_DIR_NAME: &str = "stool-log";

/// 実行時の設定。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub analysis_url: String,
}

impl Config {
    /// 環境変数から設定を読み込む。
    ///
    /// 保存先が指定されていない場合は、OSのデータディレクトリ配下を利用する。
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok(), dirs::data_dir())
    }

    /// 任意の参照関数から設定を作成する。
    ///
    /// # Arguments
    ///
    /// * `lookup` - 環境変数名から値を返す関数
    /// * `default_base` - 保存先の既定の親ディレクトリ
    pub fn from_lookup<F>(lookup: F, default_base: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup(DATA_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_base
                .with_context(|| {
                    format!("Could not find a data directory, set {}", DATA_DIR_ENV)
                })?
                .join(APP_DIR_NAME),
        };
        let analysis_url = lookup(ANALYSIS_URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ANALYSIS_URL.to_string());

        Ok(Self {
            data_dir,
            analysis_url,
        })
    }
}
