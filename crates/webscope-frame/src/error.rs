//! webscope-frame エラー型

/// フレームのデコードエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// フレーム長が不正（2 バイト未満、またはヘッダー以降が 16 の倍数でない）
    #[error("Malformed frame: {len} bytes is not a 2-byte header followed by 16-byte records")]
    MalformedFrame {
        /// 受信したバイト数
        len: usize,
    },
}
