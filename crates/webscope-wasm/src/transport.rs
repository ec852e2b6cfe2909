//! ブラウザの `RTCDataChannel` を [`Transport`] として扱う

use wasm_bindgen::JsValue;
use web_sys::{RtcDataChannel, RtcDataChannelState};

use webscope_channel::{ChannelError, Transport};

/// `RTCDataChannel` のラッパー
pub struct RtcTransport {
    inner: RtcDataChannel,
}

impl RtcTransport {
    pub fn new(inner: RtcDataChannel) -> Self {
        RtcTransport { inner }
    }

    /// ネゴシエーション時のラベル
    pub fn label(&self) -> String {
        self.inner.label()
    }

    /// 下位層が既に open か（イベントを登録する前に開いていた場合の判定用）
    pub fn is_open(&self) -> bool {
        self.inner.ready_state() == RtcDataChannelState::Open
    }
}

impl Transport for RtcTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        self.inner
            .send_with_u8_array(bytes)
            .map_err(|e| send_failure(self.is_open(), || describe(&e)))
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

/// 送信失敗をエラーに変換する
///
/// 下位層が open でなければ（closing / closed で `InvalidStateError` が投げられた場合）
/// `ChannelError::Closed`、それ以外は下位層のエラーとして扱う。
fn send_failure(still_open: bool, reason: impl FnOnce() -> String) -> ChannelError {
    if still_open {
        ChannelError::Transport(reason())
    } else {
        ChannelError::Closed
    }
}
