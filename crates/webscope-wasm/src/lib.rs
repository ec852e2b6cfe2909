//! # webscope-wasm
//!
//! wasm-bindgen エクスポート：ブラウザの波形描画クライアントから呼び出す公開 API。
//!
//! ## 使用方法（TypeScript）
//!
//! ```typescript
//! import { ScopeChannel, ScopeReceiver, init_panic_hook, init_logging } from './webscope-wasm-pkg/webscope_wasm';
//!
//! // パニック時のスタックトレースを有効化（開発時）
//! init_panic_hook();
//! init_logging("debug");
//!
//! // RTCDataChannel に直接つなぐ
//! pc.ondatachannel = ({ channel }) => {
//!     const scope = new ScopeChannel(channel, 4000);
//!     channel.binaryType = "arraybuffer";
//!     channel.onopen = () => scope.onOpen();
//!     channel.onclose = () => scope.onClose();
//!     channel.onmessage = (ev) => scope.onMessage(new Uint8Array(ev.data));
//! };
//!
//! // 経路を問わない受信側
//! const receiver = ScopeReceiver.fromConfig('{"retention_bound": 4000}');
//! socket.onmessage = (ev) => {
//!     if (receiver.recvFrame(new Uint8Array(ev.data))) {
//!         chart.update(receiver.dts(), receiver.values());
//!     }
//! };
//! ```

extern crate alloc;

use js_sys::{Float64Array, Uint8Array};
use wasm_bindgen::prelude::*;

pub mod channel;
pub mod config;
pub mod logger;
pub mod receiver;
pub mod report;
pub mod sender;
pub mod transport;

pub use channel::ScopeChannel;
pub use config::{ConfigError, ScopeConfig};
pub use receiver::ScopeReceiver;
pub use sender::ScopeSender;

use webscope_frame::{decode, encode, SampleBatch};

/// パニック時にブラウザコンソールにスタックトレースを出力する
///
/// 開発時に必ず呼び出すこと。本番ビルドでは feature flag で無効化可能。
#[wasm_bindgen]
pub fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// コアクレートのログをブラウザコンソールに出す
///
/// # 引数
/// - `level`: "off" / "error" / "warn" / "info" / "debug" / "trace"
///
/// # エラー
/// - 解釈できないレベル
#[wasm_bindgen]
pub fn init_logging(level: &str) -> Result<(), JsError> {
    let filter = level
        .parse::<log::LevelFilter>()
        .map_err(|_| JsError::new(&format!("Unknown log level: {}", level)))?;
    logger::install(filter);
    Ok(())
}

/// デコード済みのフレーム
#[wasm_bindgen]
pub struct DecodedFrame {
    batch: SampleBatch,
}

#[wasm_bindgen]
impl DecodedFrame {
    #[wasm_bindgen(getter, js_name = "sequenceId")]
    pub fn sequence_id(&self) -> u16 {
        self.batch.sequence_id
    }

    #[wasm_bindgen(getter)]
    pub fn values(&self) -> Float64Array {
        Float64Array::from(self.batch.values().as_slice())
    }

    #[wasm_bindgen(getter)]
    pub fn dts(&self) -> Float64Array {
        Float64Array::from(self.batch.dts().as_slice())
    }
}

/// フレームのバイト列をデコードする
///
/// # エラー
/// - フレーム長が不正（2 + 16 × N バイトでない）
#[wasm_bindgen(js_name = "decodeFrame")]
pub fn decode_frame(bytes: &[u8]) -> Result<DecodedFrame, JsError> {
    let batch = decode(bytes).map_err(|e| JsError::new(&format!("Frame decode failed: {}", e)))?;
    Ok(DecodedFrame { batch })
}

/// 番号を指定してフレームのバイト列を組み立てる
///
/// 連番を自動で振るなら [`ScopeSender`] を使う。
///
/// # エラー
/// - `values` と `dts` の長さが違う
#[wasm_bindgen(js_name = "encodeFrame")]
pub fn encode_frame(sequence_id: u16, values: &[f64], dts: &[f64]) -> Result<Uint8Array, JsError> {
    let samples = sender::zip_samples(values, dts).map_err(|e| JsError::new(&e))?;
    let bytes = encode(&SampleBatch::new(sequence_id, samples));
    Ok(Uint8Array::from(bytes.as_slice()))
}
