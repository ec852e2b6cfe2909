//! # webscope-seq
//!
//! フレームの sequence_id（u16）に対する循環算術。
//!
//! トランスポートは順序保証がないため、受信側は到着順ではなく
//! sequence_id の循環距離でバッチの前後関係を判定する。
//!
//! ```text
//! distance(current, prev) ∈ (-32768, 32768]
//!
//!   > 0 : current が新しい（1 なら連続）
//!  <= 0 : 重複、または遅延到着
//! ```

#![cfg_attr(not(test), no_std)]

pub mod sequence;
pub mod sequencer;

pub use sequence::{distance, successor, SeqNum, HALF_MODULUS, MODULUS};
pub use sequencer::Sequencer;
