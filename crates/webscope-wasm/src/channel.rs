//! ScopeChannel wasm-bindgen エクスポート
//!
//! ブラウザの `RTCDataChannel` を [`DataChannel`] の状態機械に載せる。
//! JS 側はイベントを転送するだけでよい。
//!
//! ```typescript
//! const scope = new ScopeChannel(rtcChannel);
//! rtcChannel.binaryType = "arraybuffer";
//! rtcChannel.onopen = () => scope.onOpen();
//! rtcChannel.onclose = () => scope.onClose();
//! rtcChannel.onmessage = (ev) => scope.onMessage(new Uint8Array(ev.data));
//! ```

use alloc::rc::Rc;
use core::cell::RefCell;

use js_sys::Float64Array;
use wasm_bindgen::prelude::*;
use web_sys::RtcDataChannel;

use webscope_channel::{dispatch, ChannelEvent, ChannelLabel, DataChannel};
use webscope_stream::{attach, Publisher, Reconstructor, SharedReconstructor};

use crate::config::retention_bound_or_default;
use crate::receiver::{window_dts, window_values};
use crate::report::{ChannelReport, ReceiverReport, ScopeChannelReport};
use crate::sender::zip_samples;
use crate::transport::RtcTransport;

/// `RTCDataChannel` 1 本分のセッション
///
/// - データチャンネル: 受信フレームを内部の Reconstructor に流す。`publish` で送信もできる。
/// - エコーチャンネル（ラベル `"echo"`）: 受信したメッセージをそのまま送り返す。
#[wasm_bindgen]
pub struct ScopeChannel {
    channel: DataChannel<RtcTransport>,
    reconstructor: SharedReconstructor,
    publisher: Publisher,
}

#[wasm_bindgen]
impl ScopeChannel {
    /// # 引数
    /// - `channel`: ネゴシエーション済みの `RTCDataChannel`（open 前でもよい）
    /// - `retention_bound`: ウィンドウに保持する最大サンプル数。省略時は 4000。
    ///
    /// # エラー
    /// - `retention_bound` が 0
    /// - 既に open だったチャンネルへの受信ハンドラ登録に失敗
    #[wasm_bindgen(constructor)]
    pub fn new(channel: RtcDataChannel, retention_bound: Option<u32>) -> Result<ScopeChannel, JsError> {
        let transport = RtcTransport::new(channel);
        let label = ChannelLabel::parse(&transport.label());
        let already_open = transport.is_open();

        let bound = retention_bound_or_default(retention_bound)
            .map_err(|e| JsError::new(&format!("Invalid retention bound: {}", e)))?;
        let mut scope = ScopeChannel {
            channel: DataChannel::opening(label, transport),
            reconstructor: Rc::new(RefCell::new(Reconstructor::new(bound))),
            publisher: Publisher::new(),
        };
        if already_open {
            scope.on_open()?;
        }
        Ok(scope)
    }

    /// `RTCDataChannel.onopen` から呼ぶ
    ///
    /// # エラー
    /// - 既に open / closed（状態は変わらない）
    #[wasm_bindgen(js_name = "onOpen")]
    pub fn on_open(&mut self) -> Result<(), JsError> {
        self.channel
            .apply(ChannelEvent::Ready)
            .map_err(|e| JsError::new(&format!("Channel event rejected: {}", e)))?;
        if *self.channel.label() != ChannelLabel::Echo {
            attach(&mut self.channel, self.reconstructor.clone())
                .map_err(|e| JsError::new(&format!("Attach failed: {}", e)))?;
        }
        Ok(())
    }

    /// `RTCDataChannel.onclose` から呼ぶ（何度呼んでもよい）
    #[wasm_bindgen(js_name = "onClose")]
    pub fn on_close(&mut self) -> Result<(), JsError> {
        self.channel
            .apply(ChannelEvent::Closed)
            .map_err(|e| JsError::new(&format!("Channel event rejected: {}", e)))
    }

    /// `RTCDataChannel.onmessage` から呼ぶ
    ///
    /// # 戻り値
    /// 処理した（送り返した、または受信ハンドラに渡した）なら `true`
    ///
    /// # エラー
    /// - エコーの送り返しに失敗
    #[wasm_bindgen(js_name = "onMessage")]
    pub fn on_message(&mut self, bytes: &[u8]) -> Result<bool, JsError> {
        dispatch(&mut self.channel, bytes).map_err(|e| JsError::new(&format!("Echo failed: {}", e)))
    }

    /// サンプル列を次の番号で送る
    ///
    /// # 戻り値
    /// 送ったフレームの sequence_id
    ///
    /// # エラー
    /// - `values` と `dts` の長さが違う（番号は進まない）
    /// - チャンネルが open でない、または送信失敗（番号は進む）
    pub fn publish(&mut self, values: &[f64], dts: &[f64]) -> Result<u16, JsError> {
        let samples = zip_samples(values, dts).map_err(|e| JsError::new(&e))?;
        self.publisher
            .publish(&mut self.channel, samples)
            .map_err(|e| JsError::new(&format!("Send failed: {}", e)))
    }

    /// ローカルから閉じる。以後の送信・受信はできない。
    pub fn close(&mut self) {
        self.channel.close();
    }

    /// `"opening"` / `"open"` / `"closed"`
    pub fn phase(&self) -> String {
        self.channel.phase().as_str().to_string()
    }

    pub fn label(&self) -> String {
        self.channel.label().as_str().to_string()
    }

    /// 現在のウィンドウの値列（古い順）
    pub fn values(&self) -> Float64Array {
        Float64Array::from(window_values(self.reconstructor.borrow().window()).as_slice())
    }

    /// 現在のウィンドウのサンプル間隔列（古い順）
    pub fn dts(&self) -> Float64Array {
        Float64Array::from(window_dts(self.reconstructor.borrow().window()).as_slice())
    }

    #[wasm_bindgen(js_name = "sequenceId")]
    pub fn sequence_id(&self) -> Option<u16> {
        self.reconstructor.borrow().sequence_id()
    }

    /// チャンネルと受信側の統計を JSON 文字列で返す
    ///
    /// ```json
    /// { "channel": { "label": "webscope_data", "phase": "open", ... }, "receiver": { ... } }
    /// ```
    #[wasm_bindgen(js_name = "getStats")]
    pub fn get_stats(&self) -> Result<String, JsError> {
        let report = ScopeChannelReport {
            channel: ChannelReport::new(
                self.channel.label().as_str(),
                self.channel.phase().as_str(),
                self.channel.stats(),
                self.publisher.sent(),
                self.publisher.failed(),
            ),
            receiver: ReceiverReport::of(&self.reconstructor.borrow()),
        };
        serde_json::to_string(&report).map_err(|e| JsError::new(&format!("Stats encode failed: {}", e)))
    }
}
