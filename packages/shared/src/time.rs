//! Time helpers.
//!
//! All timestamps are Unix milliseconds in UTC.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};

static LAST_ISSUED: AtomicI64 = AtomicI64::new(i64::MIN);

/// Current wall-clock time in milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Wall-clock time in milliseconds, strictly increasing across calls within
/// this process.
///
/// If the clock stalls or steps backwards the previous value plus one is
/// returned instead.
pub fn monotonic_millis() -> i64 {
    let now = now_millis();
    let mut last = LAST_ISSUED.load(Ordering::Relaxed);
    loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_ISSUED.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Render a millisecond timestamp as RFC 3339 (UTC, millisecond precision).
///
/// Out-of-range values fall back to the Unix epoch.
pub fn timestamp_to_rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_millis_strictly_increases() {
        // テスト項目: 連続して呼び出しても値が必ず増加する
        // when (操作):
        let values: Vec<i64> = (0..1000).map(|_| monotonic_millis()).collect();

        // then (期待する結果):
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_monotonic_millis_tracks_wall_clock() {
        // テスト項目: 壁時計から大きく離れない
        // given (前提条件):
        let before = now_millis();

        // when (操作):
        let value = monotonic_millis();

        // then (期待する結果):
        assert!(value >= before);
    }

    #[test]
    fn test_timestamp_to_rfc3339() {
        // テスト項目: ミリ秒タイムスタンプを RFC 3339 形式に変換できる
        // when (操作):
        let rendered = timestamp_to_rfc3339(1_672_531_200_123);

        // then (期待する結果):
        assert_eq!(rendered, "2023-01-01T00:00:00.123Z");
    }
}
