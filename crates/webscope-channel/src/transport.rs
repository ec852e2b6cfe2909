//! トランスポート協調者との境界
//!
//! 実際のメッセージ送受信（WebRTC DataChannel など）はこのクレートの外にある。
//! 外部実装はこのトレイトを満たし、受信メッセージと状態変化の通知を
//! [`DataChannel::deliver`](crate::DataChannel::deliver) /
//! [`DataChannel::apply`](crate::DataChannel::apply) で流し込む。

use crate::error::ChannelError;
use crate::label::ChannelLabel;

/// メッセージ単位の双方向トランスポート
///
/// 1 回の `send` が相手側で 1 回の受信になること（バイトストリームではない）が前提。
/// 配送の保証（到達・順序）はしない。
pub trait Transport {
    /// 1 メッセージを送信する
    ///
    /// # エラー
    /// - `ChannelError::Closed`: `close` 後、または下位層が既に閉じている
    /// - `ChannelError::Transport`: 下位層のエラー
    fn send(&mut self, bytes: &[u8]) -> Result<(), ChannelError>;

    /// チャンネルを閉じる。2 回目以降の呼び出しは何もしない。
    fn close(&mut self);
}

/// リンク（ピア接続）上にチャンネルを作るファクトリ
pub trait Connector {
    /// このリンクが作るチャンネルのトランスポート
    type Channel: Transport;

    /// ラベル付きのチャンネルを作る
    ///
    /// 作られたチャンネルは opening 状態から始まる。
    fn create_channel(&mut self, label: &ChannelLabel) -> Result<Self::Channel, ChannelError>;

    /// リンクを閉じる。2 回目以降の呼び出しは何もしない。
    fn close(&mut self);
}
