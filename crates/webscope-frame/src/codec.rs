//! フレームのエンコード/デコード
//!
//! ## Frame Wire Format
//! ```text
//! [sequence_id: u16 LE (2 bytes)]
//! [record 0: value f64 LE (8 bytes)][dt f64 LE (8 bytes)]
//! [record 1: ...]
//! ...
//! ```
//!
//! サンプル数はフレームに含まれない。`(len - 2) / 16` で求める。
//! マジックナンバーもバージョンもないので、フォーマット変更は互換性を壊す。

use alloc::vec::Vec;

use crate::batch::{Sample, SampleBatch};
use crate::error::FrameError;

/// ヘッダー長（sequence_id: 2）
pub const HEADER_LEN: usize = 2;

/// 1 サンプルのレコード長（value: 8 + dt: 8）
pub const RECORD_LEN: usize = 16;

/// サンプル数からフレームのバイト数を求める
pub fn encoded_len(sample_count: usize) -> usize {
    HEADER_LEN + sample_count * RECORD_LEN
}

/// フレームのバイト数からサンプル数を求める
///
/// # 戻り値
/// - `Some(n)`: 正しい長さのフレーム
/// - `None`: 2 バイト未満、または端数のあるフレーム
pub fn sample_count(frame_len: usize) -> Option<usize> {
    let body = frame_len.checked_sub(HEADER_LEN)?;
    if body % RECORD_LEN != 0 {
        return None;
    }
    Some(body / RECORD_LEN)
}

/// SampleBatch を Wire Format に変換する
///
/// 空のバッチは 2 バイトのヘッダーのみになる。
pub fn encode(batch: &SampleBatch) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(encoded_len(batch.samples.len()));

    bytes.extend_from_slice(&batch.sequence_id.to_le_bytes());

    for sample in &batch.samples {
        bytes.extend_from_slice(&sample.value.to_le_bytes());
        bytes.extend_from_slice(&sample.dt.to_le_bytes());
    }

    bytes
}

/// 受信したバイト列から SampleBatch を復元する
///
/// # エラー
/// - `FrameError::MalformedFrame`: 2 バイト未満、または `(len - 2) % 16 != 0`
pub fn decode(bytes: &[u8]) -> Result<SampleBatch, FrameError> {
    let count = sample_count(bytes.len()).ok_or(FrameError::MalformedFrame { len: bytes.len() })?;

    let sequence_id = u16::from_le_bytes([bytes[0], bytes[1]]);

    let mut samples = Vec::with_capacity(count);
    for record in bytes[HEADER_LEN..].chunks_exact(RECORD_LEN) {
        let (value, dt) = record.split_at(8);
        samples.push(Sample {
            value: f64::from_le_bytes(read_8(value)),
            dt: f64::from_le_bytes(read_8(dt)),
        });
    }

    Ok(SampleBatch { sequence_id, samples })
}

fn read_8(bytes: &[u8]) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    buf
}
