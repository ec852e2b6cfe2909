//! エコーチャンネル
//!
//! `"echo"` ラベルのチャンネルは受信したメッセージをそのまま送り返す。
//! クライアント側の往復遅延計測に使う。

use crate::channel::DataChannel;
use crate::error::ChannelError;
use crate::label::ChannelLabel;
use crate::transport::Transport;

/// 受信した `message` を同じチャンネルで送り返す
///
/// # エラー
/// - `ChannelError::NotOpen` / `ChannelError::Closed`: チャンネルが open でない
/// - トランスポートの送信エラー
pub fn serve_echo<T: Transport>(channel: &mut DataChannel<T>, message: &[u8]) -> Result<(), ChannelError> {
    channel.try_handle()?.send(message)
}

/// トランスポートから受け取ったメッセージをラベルに応じて振り分ける
///
/// エコーチャンネルなら送り返し、それ以外は登録済みの受信ハンドラに渡す。
///
/// # 戻り値
/// 処理した（送り返した、またはハンドラに渡した）なら `true`
pub fn dispatch<T: Transport>(channel: &mut DataChannel<T>, message: &[u8]) -> Result<bool, ChannelError> {
    if *channel.label() == ChannelLabel::Echo {
        serve_echo(channel, message).map(|()| true)
    } else {
        Ok(channel.deliver(message))
    }
}
