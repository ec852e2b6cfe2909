//! webscope-channel エラー型

use alloc::string::String;

/// チャンネル/リンク操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// チャンネルがまだ open になっていない
    #[error("Channel is not open")]
    NotOpen,
    /// チャンネルが既に閉じている（close 後の send など）
    #[error("Channel is closed")]
    Closed,
    /// リンクが connected 状態ではない
    #[error("Link is not connected")]
    NotConnected,
    /// 現在の状態では受け付けられないイベント
    #[error("Invalid transition: {event} while {from}")]
    InvalidTransition {
        /// 遷移前の状態名
        from: &'static str,
        /// 受け取ったイベント名
        event: &'static str,
    },
    /// トランスポートが error 状態に入った（このインスタンスは再利用不可）
    #[error("Transport error: {0}")]
    Transport(String),
}
