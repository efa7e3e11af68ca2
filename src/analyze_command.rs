use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use crate::analysis::{analyze_with_fallback, read_image, AnalysisReport, ImageAnalyzer};
use crate::category::Category;
use crate::entry::{EntryDraft, DEFAULT_FEELING};
use crate::repository::EntryRepository;
use crate::storage::{BlobStore, LogDocument, LogStore};

/// 写真からカテゴリを推定するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct AnalyzeArgs {
    #[clap(help = "Path to a JPEG photo")]
    image: PathBuf,
    #[clap(long, help = "Uses the local placeholder analyzer instead of the remote service")]
    offline: bool,
    #[clap(short = 's', long, help = "Records an entry from the analysis")]
    save: bool,
    #[clap(
        long,
        default_value_t = DEFAULT_FEELING,
        help = "Feeling of the recorded entry (1-4)"
    )]
    feeling: u8,
    #[clap(short = 'n', long, default_value = "", help = "Notes of the recorded entry")]
    notes: String,
}

impl AnalyzeArgs {
    pub fn offline(&self) -> bool {
        self.offline
    }
}

/// 解析結果と、記録した場合はそのid。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalyzeResult {
    pub report: AnalysisReport,
    pub saved_id: Option<String>,
}

pub struct AnalyzeCommand<'a, S: BlobStore, A: ImageAnalyzer> {
    log_store: &'a LogStore<S>,
    analyzer: &'a A,
}

impl<'a, S: BlobStore, A: ImageAnalyzer> AnalyzeCommand<'a, S, A> {
    /// 新しい`AnalyzeCommand`を返す。
    ///
    /// # Arguments
    /// * `log_store` - エントリーを読み書きするストア
    /// * `analyzer` - 画像を解析する実装
    pub fn new(log_store: &'a LogStore<S>, analyzer: &'a A) -> Self {
        Self {
            log_store,
            analyzer,
        }
    }

    /// `analyze`サブコマンドの処理を行う。
    ///
    /// 画像が読めない場合はエラーを返す。解析に失敗した場合は仮の結果を使う。
    pub async fn run(&self, analyze: AnalyzeArgs) -> Result<AnalyzeResult> {
        let image = read_image(&analyze.image)
            .await
            .context("Could not read image file")?;
        info!("Analyzing {} ({} bytes)", analyze.image.display(), image.len());

        let report = analyze_with_fallback(self.analyzer, &image).await;
        let saved_id = if analyze.save {
            Some(self.save_entry(&analyze, &report)?)
        } else {
            None
        };

        Ok(AnalyzeResult { report, saved_id })
    }

    /// 解析結果からエントリーを記録する。所要時間は停止済みのストップウォッチから取る。
    /// 計測中のストップウォッチはリセットしない。
    fn save_entry(&self, analyze: &AnalyzeArgs, report: &AnalysisReport) -> Result<String> {
        let mut document = self
            .log_store
            .load_log()
            .context("Failed to load entry log")?;
        let mut repository = EntryRepository::from_state(document.repository);

        let mut draft = EntryDraft {
            kind: report.outcome.kind.code(),
            volume: report.outcome.volume.code(),
            color: report.outcome.color.code(),
            feeling: analyze.feeling,
            duration: document.stopwatch.committed_duration().unwrap_or(0),
            notes: analyze.notes.clone(),
            image_uri: Some(analyze.image.display().to_string()),
            ..EntryDraft::default()
        };
        draft.prepend_analysis(&report.outcome.explanation);
        let id = repository.add(draft).context("Failed to add entry")?;
        if !document.stopwatch.is_running() {
            document.stopwatch.reset();
        }

        self.log_store
            .save_log(&LogDocument {
                repository: repository.to_state(),
                stopwatch: document.stopwatch,
            })
            .context("Failed to save entry log")?;
        info!("Added entry {} from analysis", id);

        Ok(id)
    }
}
