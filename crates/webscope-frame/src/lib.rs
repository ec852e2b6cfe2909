//! # webscope-frame
//!
//! 計測器から送られるサンプルバッチのバイナリフレーム。
//!
//! 1 メッセージ = 1 フレーム。トランスポートはメッセージ単位で届けるので、
//! フレームに長さフィールドは持たせない。
//!
//! ## Frame の Wire Format
//!
//! ```text
//! offset 0     : u16 LE  sequence_id
//! offset 2..N  : { f64 LE value; f64 LE dt } の繰り返し
//! record count = (total_length - 2) / 16
//! ```

#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod batch;
pub mod codec;
pub mod error;

pub use batch::{Sample, SampleBatch, Window};
pub use codec::{decode, encode, encoded_len, sample_count, HEADER_LEN, RECORD_LEN};
pub use error::FrameError;
