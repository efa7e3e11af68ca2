use chrono::{DateTime, Utc};

use crate::entry::Entry;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// 2つの日時の差を日数に切り上げて返す。
///
/// 経過時間が1ミリ秒でもあれば1日として数えるため、同じ日の2件も1日差になる。
pub fn day_gap(newer: DateTime<Utc>, older: DateTime<Utc>) -> i64 {
    let elapsed = (newer - older).num_milliseconds().abs();
    (elapsed + DAY_MILLIS - 1) / DAY_MILLIS
}

/// 最新のエントリーから遡った連続日数を返す。
///
/// 日付の降順に並べ、隣り合うエントリーの差がちょうど1日の間だけ数え続ける。
/// 最初に1日以外の差が見つかった時点で打ち切るため、過去の最長記録は探さない。
pub fn anchored_streak(entries: &[Entry]) -> u32 {
    if entries.is_empty() {
        return 0;
    }

    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by(|left, right| right.date.cmp(&left.date));

    let mut current_streak = 1;
    for pair in sorted.windows(2) {
        if day_gap(pair[0].date, pair[1].date) == 1 {
            current_streak += 1;
        } else {
            break;
        }
    }

    current_streak
}

/// 追加後のエントリー全体から最長記録を更新する。記録が下がることはない。
pub fn updated_longest(previous: u32, entries: &[Entry]) -> u32 {
    previous.max(anchored_streak(entries))
}
