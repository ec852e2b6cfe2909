//! ウィンドウのマージ規則
//!
//! 受信したバッチを現在のウィンドウにつなげるか、捨てるか、置き換えるかを
//! sequence_id の循環距離だけで決める。到着順には依存しない。
//!
//! ```text
//! diff = distance(incoming.sequence_id, prev.sequence_id)
//!
//! diff <= 0            → prev をそのまま返す（重複・遅延到着を捨てる）
//! diff >= 2            → incoming をそのまま返す（欠落があるので履歴を捨てる）
//! diff == 1, len >= R  → incoming をそのまま返す（それだけで上限に達する）
//! diff == 1, len <  R  → prev の末尾 (R - len) 件 + incoming
//! ```
//!
//! 欠落をまたいで補間したり、時間軸をでっち上げたりはしない。

use alloc::vec::Vec;

use webscope_frame::{SampleBatch, Window};
use webscope_seq::distance;

/// マージでどの分岐を通ったか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// 最初のバッチ（比較対象のウィンドウがない）
    Started,
    /// 連続したバッチを末尾に追加した
    Extended,
    /// 連続しているが、incoming だけで上限に達したので置き換えた
    Saturated,
    /// 欠落を検出して履歴を捨てた
    Resynced {
        /// 前のウィンドウからの距離（2 以上）
        gap: i32,
    },
    /// 重複・遅延到着なので incoming を捨てた
    Dropped {
        /// 前のウィンドウからの距離（0 以下）
        distance: i32,
    },
}

impl MergeOutcome {
    /// ウィンドウが変化したか
    pub fn changed_window(&self) -> bool {
        !matches!(self, MergeOutcome::Dropped { .. })
    }
}

/// どの分岐を通るかだけを判定する（サンプルには触れない）
///
/// # 引数
/// - `prev_id`: 現在のウィンドウの sequence_id
/// - `incoming_id`: 受信したバッチの sequence_id
/// - `incoming_len`: 受信したバッチのサンプル数
/// - `retention_bound`: ウィンドウの上限サンプル数
pub fn classify(prev_id: u16, incoming_id: u16, incoming_len: usize, retention_bound: usize) -> MergeOutcome {
    let diff = distance(incoming_id, prev_id);
    if diff != 1 {
        if diff > 0 {
            MergeOutcome::Resynced { gap: diff }
        } else {
            MergeOutcome::Dropped { distance: diff }
        }
    } else if incoming_len >= retention_bound {
        MergeOutcome::Saturated
    } else {
        MergeOutcome::Extended
    }
}

/// 現在のウィンドウと受信したバッチから次のウィンドウを作る
///
/// 引数は消費され、戻り値は常に新しい値になる（古いウィンドウを書き換えない）。
///
/// # 引数
/// - `prev`: 現在のウィンドウ
/// - `incoming`: 受信・デコード済みのバッチ
/// - `retention_bound`: ウィンドウの上限サンプル数
///
/// # 戻り値
/// 次のウィンドウ。`sequence_id` は採用したバッチの番号になる。
pub fn merge(prev: Window, incoming: SampleBatch, retention_bound: usize) -> Window {
    merge_with_outcome(prev, incoming, retention_bound).0
}

/// [`merge`] と同じ。通った分岐も返す。
pub fn merge_with_outcome(prev: Window, incoming: SampleBatch, retention_bound: usize) -> (Window, MergeOutcome) {
    let outcome = classify(prev.sequence_id, incoming.sequence_id, incoming.len(), retention_bound);

    let window = match outcome {
        MergeOutcome::Dropped { .. } => prev,
        MergeOutcome::Resynced { .. } | MergeOutcome::Saturated | MergeOutcome::Started => incoming,
        MergeOutcome::Extended => {
            let keep = retention_bound - incoming.len();
            let start = prev.samples.len().saturating_sub(keep);

            let mut samples = Vec::with_capacity(prev.samples.len() - start + incoming.len());
            samples.extend_from_slice(&prev.samples[start..]);
            samples.extend(incoming.samples);

            Window {
                sequence_id: incoming.sequence_id,
                samples,
            }
        }
    };

    (window, outcome)
}
