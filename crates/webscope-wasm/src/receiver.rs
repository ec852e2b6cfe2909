//! ScopeReceiver wasm-bindgen エクスポート
//!
//! トランスポートに依存しない受信側。JS が任意の経路（RTCDataChannel, WebSocket など）で
//! 受け取ったフレームを `recvFrame` に渡し、描画時に `values()` / `dts()` を読む。

use js_sys::Float64Array;
use wasm_bindgen::prelude::*;

use webscope_channel::ChannelLabel;
use webscope_frame::{FrameError, Window};
use webscope_stream::{MergeOutcome, Reconstructor};

use crate::config::{retention_bound_or_default, ConfigError, ScopeConfig};
use crate::logger;
use crate::report::ReceiverReport;

/// 波形ウィンドウの受信側
#[wasm_bindgen]
pub struct ScopeReceiver {
    reconstructor: Reconstructor,
    /// 購読するチャンネルのラベル
    label: ChannelLabel,
}

#[wasm_bindgen]
impl ScopeReceiver {
    /// デフォルト設定で初期化する
    ///
    /// # 引数
    /// - `retention_bound`: ウィンドウに保持する最大サンプル数。省略時は 4000。
    ///
    /// # エラー
    /// - `retention_bound` が 0
    ///
    /// # 例（TypeScript）
    /// ```typescript
    /// const scope = new ScopeReceiver();
    /// const wide = new ScopeReceiver(20000);
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(retention_bound: Option<u32>) -> Result<ScopeReceiver, JsError> {
        Self::try_new(retention_bound).map_err(|e| JsError::new(&format!("Invalid retention bound: {}", e)))
    }

    /// JSON 設定から初期化する。ログレベルもここで設定される。
    ///
    /// # エラー
    /// - JSON が不正、または値が範囲外
    #[wasm_bindgen(js_name = "fromConfig")]
    pub fn from_config(json: &str) -> Result<ScopeReceiver, JsError> {
        let config = ScopeConfig::from_json(json).map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?;
        let level = config.level_filter().map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?;
        logger::install(level);

        Ok(ScopeReceiver {
            reconstructor: Reconstructor::new(config.retention_bound),
            label: config.label(),
        })
    }

    /// 受信したフレームを処理する
    ///
    /// # 戻り値
    /// ウィンドウが変化したら `true`（重複・遅延到着で捨てたときは `false`）
    ///
    /// # エラー
    /// - フレーム長が不正。ウィンドウは変わらないので、呼び出し側は読み捨ててよい。
    #[wasm_bindgen(js_name = "recvFrame")]
    pub fn recv_frame(&mut self, bytes: &[u8]) -> Result<bool, JsError> {
        let outcome = self
            .ingest(bytes)
            .map_err(|e| JsError::new(&format!("Frame decode failed: {}", e)))?;
        Ok(outcome.changed_window())
    }

    /// 現在のウィンドウの値列（古い順）
    pub fn values(&self) -> Float64Array {
        Float64Array::from(window_values(self.reconstructor.window()).as_slice())
    }

    /// 現在のウィンドウのサンプル間隔列（古い順）
    pub fn dts(&self) -> Float64Array {
        Float64Array::from(window_dts(self.reconstructor.window()).as_slice())
    }

    /// 現在のウィンドウの sequence_id（まだ何も受けていなければ undefined）
    #[wasm_bindgen(js_name = "sequenceId")]
    pub fn sequence_id(&self) -> Option<u16> {
        self.reconstructor.sequence_id()
    }

    /// 現在のウィンドウのサンプル数
    pub fn len(&self) -> usize {
        self.reconstructor.window().map_or(0, |w| w.len())
    }

    #[wasm_bindgen(js_name = "isEmpty")]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 購読するチャンネルのラベル
    #[wasm_bindgen(js_name = "channelLabel")]
    pub fn channel_label(&self) -> String {
        self.label.as_str().to_string()
    }

    /// 受信統計を JSON 文字列で返す（形は [`ReceiverReport`]）
    ///
    /// # エラー
    /// - シリアライズ失敗
    #[wasm_bindgen(js_name = "getStats")]
    pub fn get_stats(&self) -> Result<String, JsError> {
        serde_json::to_string(&ReceiverReport::of(&self.reconstructor))
            .map_err(|e| JsError::new(&format!("Stats encode failed: {}", e)))
    }

    /// 上限を変更する。次に連続したフレームを受けたときから効く。
    ///
    /// # エラー
    /// - `retention_bound` が 0（上限は変わらない）
    #[wasm_bindgen(js_name = "setRetentionBound")]
    pub fn set_retention_bound(&mut self, retention_bound: u32) -> Result<(), JsError> {
        self.try_set_retention_bound(retention_bound)
            .map_err(|e| JsError::new(&format!("Invalid retention bound: {}", e)))
    }

    /// ウィンドウを捨てる。次に届いたフレームから新しいストリームとして扱う。
    pub fn reset(&mut self) {
        self.reconstructor.reset();
    }
}

impl ScopeReceiver {
    /// [`new`](Self::new) の本体（JS 値を介さない）
    pub fn try_new(retention_bound: Option<u32>) -> Result<Self, ConfigError> {
        Ok(ScopeReceiver {
            reconstructor: Reconstructor::new(retention_bound_or_default(retention_bound)?),
            label: ChannelLabel::Data,
        })
    }

    pub fn try_set_retention_bound(&mut self, retention_bound: u32) -> Result<(), ConfigError> {
        let bound = retention_bound_or_default(Some(retention_bound))?;
        self.reconstructor.set_retention_bound(bound);
        Ok(())
    }

    /// JS を介さずにフレームを処理する（native テスト用にも使う）
    pub fn ingest(&mut self, bytes: &[u8]) -> Result<MergeOutcome, FrameError> {
        self.reconstructor.on_frame(bytes)
    }

    pub fn reconstructor(&self) -> &Reconstructor {
        &self.reconstructor
    }
}

pub(crate) fn window_values(window: Option<&Window>) -> Vec<f64> {
    window.map(|w| w.values()).unwrap_or_default()
}

pub(crate) fn window_dts(window: Option<&Window>) -> Vec<f64> {
    window.map(|w| w.dts()).unwrap_or_default()
}
