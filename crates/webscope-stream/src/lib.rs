//! # webscope-stream
//!
//! 損失・重複・順序入れ替わりのあるバッチ列から、描画用の有限長ローリング
//! ウィンドウを再構成する。
//!
//! ## データの流れ
//!
//! ```text
//! 送信:
//!   1. Publisher::publish(channel, samples)
//!   2. 連番付与 → webscope_frame::encode → ChannelHandle::send
//!
//! 受信:
//!   1. DataChannel::deliver(bytes) → 受信ハンドラ
//!   2. Reconstructor::on_frame(bytes) → decode → merge
//!   3. Reconstructor::window() → 描画側
//! ```
//!
//! ## 欠落時の方針
//!
//! 欠落を検出したら履歴を捨てて受信したバッチから描き直す。
//! ライブ表示では、つながっていない古い履歴を残すより捨てた方が誤解がない。

#![no_std]
extern crate alloc;

pub mod merge;
pub mod publisher;
pub mod reconstructor;

pub use merge::{classify, merge, merge_with_outcome, MergeOutcome};
pub use publisher::Publisher;
pub use reconstructor::{attach, Reconstructor, ReconstructorStats, SharedReconstructor};
