//! 受信側のウィンドウ再構成
//!
//! フレームのバイト列を受け取り、デコード → マージ → 現在のウィンドウ更新 までを行う。
//! 描画側は [`Reconstructor::window`] を読み取り専用で参照する。

use alloc::rc::Rc;
use core::cell::RefCell;

use log::{debug, warn};
use serde::Serialize;

use webscope_channel::{ChannelError, DataChannel, Transport};
use webscope_frame::{decode, FrameError, SampleBatch, Window};
use webscope_seq::distance;

use crate::merge::{merge_with_outcome, MergeOutcome};

/// 受信統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconstructorStats {
    /// 受け取ったフレーム数（不正なものを含む）
    pub frames: u64,
    /// 連続して追加した数
    pub extended: u64,
    /// 単独で上限に達して置き換えた数
    pub saturated: u64,
    /// 欠落を検出して履歴を捨てた数
    pub resynced: u64,
    /// 重複・遅延到着で捨てた数
    pub dropped: u64,
    /// デコードに失敗した数
    pub malformed: u64,
    /// これまでに見た最も新しい sequence_id（外部の生存監視用）
    pub highest_sequence_id: Option<u16>,
}

/// ローリングウィンドウの再構成器
///
/// 1 チャンネルにつき 1 つ。受信メッセージは 1 つずつ最後まで処理される前提。
#[derive(Debug, Clone)]
pub struct Reconstructor {
    /// 現在のウィンドウ（最初のバッチを受けるまでは None）
    window: Option<Window>,
    /// ウィンドウの上限サンプル数
    retention_bound: usize,
    stats: ReconstructorStats,
}

impl Reconstructor {
    /// 新しい Reconstructor を生成する
    ///
    /// # 引数
    /// - `retention_bound`: ウィンドウに保持する最大サンプル数
    pub fn new(retention_bound: usize) -> Self {
        Reconstructor {
            window: None,
            retention_bound,
            stats: ReconstructorStats::default(),
        }
    }

    /// 受信したフレームのバイト列を処理する
    ///
    /// # エラー
    /// - `FrameError::MalformedFrame`: フレーム長が不正。ウィンドウは変わらない。
    pub fn on_frame(&mut self, bytes: &[u8]) -> Result<MergeOutcome, FrameError> {
        self.stats.frames += 1;
        match decode(bytes) {
            Ok(batch) => Ok(self.merge_batch(batch)),
            Err(e) => {
                self.stats.malformed += 1;
                warn!("rejecting frame: {}", e);
                Err(e)
            }
        }
    }

    /// デコード済みのバッチをマージする
    pub fn on_batch(&mut self, batch: SampleBatch) -> MergeOutcome {
        self.stats.frames += 1;
        self.merge_batch(batch)
    }

    /// 現在のウィンドウ
    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    /// 現在のウィンドウの sequence_id
    pub fn sequence_id(&self) -> Option<u16> {
        self.window.as_ref().map(|w| w.sequence_id)
    }

    pub fn retention_bound(&self) -> usize {
        self.retention_bound
    }

    /// 上限を変更する。次に連続したバッチを受けたときから効く。
    pub fn set_retention_bound(&mut self, retention_bound: usize) {
        self.retention_bound = retention_bound;
    }

    pub fn stats(&self) -> ReconstructorStats {
        self.stats
    }

    /// ウィンドウを捨てて初期状態に戻す（統計は残す）
    pub fn reset(&mut self) {
        self.window = None;
    }

    fn merge_batch(&mut self, batch: SampleBatch) -> MergeOutcome {
        self.note_sequence(batch.sequence_id);

        let (window, outcome) = match self.window.take() {
            None => (batch, MergeOutcome::Started),
            Some(prev) => merge_with_outcome(prev, batch, self.retention_bound),
        };
        self.window = Some(window);

        match outcome {
            MergeOutcome::Started => debug!("stream started at #{}", self.sequence_id().unwrap_or_default()),
            MergeOutcome::Extended => self.stats.extended += 1,
            MergeOutcome::Saturated => self.stats.saturated += 1,
            MergeOutcome::Resynced { gap } => {
                self.stats.resynced += 1;
                debug!("gap of {} frames, resynced at #{}", gap - 1, self.sequence_id().unwrap_or_default());
            }
            MergeOutcome::Dropped { .. } => self.stats.dropped += 1,
        }
        outcome
    }

    fn note_sequence(&mut self, id: u16) {
        let ahead = match self.stats.highest_sequence_id {
            None => true,
            Some(highest) => distance(id, highest) > 0,
        };
        if ahead {
            self.stats.highest_sequence_id = Some(id);
        }
    }
}

/// 受信ハンドラとイベントループで共有する Reconstructor
pub type SharedReconstructor = Rc<RefCell<Reconstructor>>;

/// `channel` の受信ハンドラに `reconstructor` をつなぐ
///
/// 既存の受信ハンドラは置き換えられる。不正なフレームはログに残して読み捨てる。
///
/// # エラー
/// - `ChannelError::NotOpen` / `ChannelError::Closed`: チャンネルが open でない
pub fn attach<T: Transport>(channel: &mut DataChannel<T>, reconstructor: SharedReconstructor) -> Result<(), ChannelError> {
    let mut handle = channel.try_handle()?;
    handle.register_receive_handler(move |bytes| {
        // on_frame 内でログと統計を済ませている
        let _ = reconstructor.borrow_mut().on_frame(bytes);
    });
    Ok(())
}
