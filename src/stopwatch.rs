use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::datetime::now;

/// この秒数を超えて計測を続けると長時間の警告を出す。
pub const LONG_SESSION_SECS: u64 = 300;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopwatchStatus {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// 1回分の所要時間を計測するストップウォッチ。
///
/// `Idle` → `Running`（start）→ `Stopped`（stop）→ `Idle`（reset）と遷移する。
/// 計測値はエントリーの追加時に呼び出し側が読み出して`duration`に使う。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stopwatch {
    #[serde(default)]
    status: StopwatchStatus,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_duration: Option<u64>,
}

impl Stopwatch {
    pub fn status(&self) -> StopwatchStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == StopwatchStatus::Running
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// 直前の計測で確定した秒数。
    pub fn last_duration(&self) -> Option<u64> {
        self.last_duration
    }

    /// 停止済みの場合だけ、記録に使う確定秒数を返す。
    pub fn committed_duration(&self) -> Option<u64> {
        match self.status {
            StopwatchStatus::Stopped => self.last_duration,
            _ => None,
        }
    }

    /// 計測を開始する。前回の確定値は破棄する。
    ///
    /// 計測中に呼ばれた場合も開始時刻を現在時刻で上書きする。
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("Stopwatch restarted while running");
        }
        self.status = StopwatchStatus::Running;
        self.started_at = Some(now());
        self.last_duration = None;
    }

    /// 計測を止め、経過秒数を返す。
    ///
    /// 計測中でない場合は0を返し、状態は変えない。
    pub fn stop(&mut self) -> u64 {
        if !self.is_running() {
            return 0;
        }

        let elapsed = self.elapsed();
        self.status = StopwatchStatus::Stopped;
        self.last_duration = Some(elapsed);
        elapsed
    }

    /// 初期状態に戻す。
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 表示用の経過秒数を返す。
    ///
    /// 計測中は現在時刻との差、停止後は確定した秒数、初期状態では0。
    pub fn elapsed(&self) -> u64 {
        match (self.status, self.started_at) {
            (StopwatchStatus::Running, Some(started_at)) => {
                (now() - started_at).num_seconds().max(0) as u64
            }
            (StopwatchStatus::Stopped, _) => self.last_duration.unwrap_or(0),
            _ => 0,
        }
    }

    /// 長時間座り続けているかを返す。
    pub fn is_long_session(&self) -> bool {
        self.elapsed() > LONG_SESSION_SECS
    }
}
