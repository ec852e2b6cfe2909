//! ScopeSender wasm-bindgen エクスポート
//!
//! 送信側。サンプル列に連番を振ってフレームのバイト列にする。
//! 送信そのものは JS 側（または [`ScopeChannel`](crate::ScopeChannel)）が行う。

use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;

use webscope_frame::{encode, Sample};
use webscope_stream::Publisher;

/// フレームの組み立て器
#[wasm_bindgen]
pub struct ScopeSender {
    publisher: Publisher,
}

#[wasm_bindgen]
impl ScopeSender {
    /// # 引数
    /// - `start`: 最初のフレームの sequence_id。省略時は 0。
    #[wasm_bindgen(constructor)]
    pub fn new(start: Option<u16>) -> ScopeSender {
        ScopeSender {
            publisher: start.map_or_else(Publisher::new, Publisher::starting_at),
        }
    }

    /// 次の番号でフレームを組み立てる
    ///
    /// # 引数
    /// - `values`: サンプル値
    /// - `dts`: 各サンプルの直前からの間隔（`values` と同じ長さ）
    ///
    /// # エラー
    /// - `values` と `dts` の長さが違う（番号は進まない）
    #[wasm_bindgen(js_name = "encodeFrame")]
    pub fn encode_frame(&mut self, values: &[f64], dts: &[f64]) -> Result<Uint8Array, JsError> {
        let bytes = self.next_frame(values, dts).map_err(|e| JsError::new(&e))?;
        Ok(Uint8Array::from(bytes.as_slice()))
    }

    /// 次に使う番号
    #[wasm_bindgen(js_name = "nextSequenceId")]
    pub fn next_sequence_id(&self) -> u16 {
        self.publisher.next_sequence_id()
    }
}

impl ScopeSender {
    /// [`encode_frame`](Self::encode_frame) の本体（JS 値を介さない）
    pub fn next_frame(&mut self, values: &[f64], dts: &[f64]) -> Result<Vec<u8>, String> {
        let samples = zip_samples(values, dts)?;
        Ok(encode(&self.publisher.next_batch(samples)))
    }
}

/// 値列と間隔列をサンプル列にする
pub(crate) fn zip_samples(values: &[f64], dts: &[f64]) -> Result<Vec<Sample>, String> {
    if values.len() != dts.len() {
        return Err(format!(
            "values and dts differ in length: {} != {}",
            values.len(),
            dts.len()
        ));
    }
    Ok(values.iter().zip(dts).map(|(&value, &dt)| Sample::new(value, dt)).collect())
}
