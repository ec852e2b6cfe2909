//! # webscope-channel
//!
//! ピアリンクとデータチャンネルのライフサイクル状態機械。
//!
//! 状態はすべてタグ付き列挙型で表し、送受信の能力（ハンドル）は
//! `Connected` / `Open` のバリアントからしか取り出せない。
//! 状態遷移を進めるのは外部トランスポートからの通知だけで、
//! 一度終端状態（`Closed` / `Error`）に入ったら戻らない。
//!
//! ## 状態遷移
//!
//! ```text
//! PeerLink:    Connecting → Connected → Closing → Closed
//!                   └──────────┴──────────┴──→ Error(reason)
//!
//! DataChannel: Opening → Open → Closed
//!                 └──────────────→ Closed
//! ```
//!
//! ## 受信ハンドラ
//!
//! 受信ハンドラは 1 スロットのみ。再登録で置き換わり、登録前に届いたメッセージは
//! 捨てられる（キューイングも再生もしない）。
//!
//! ## 再送・再接続
//!
//! しない。エラーで終端に入ったリンクを作り直すかどうかは呼び出し側が決める。

#![no_std]
extern crate alloc;

pub mod channel;
pub mod echo;
pub mod error;
pub mod label;
pub mod link;
pub mod loopback;
pub mod transport;

pub use channel::{ChannelEvent, ChannelHandle, ChannelPhase, ChannelState, ChannelStats, DataChannel, ReceiveHandler};
pub use echo::{dispatch, serve_echo};
pub use error::ChannelError;
pub use label::{ChannelLabel, DATA_LABEL, ECHO_LABEL};
pub use link::{LinkEvent, LinkHandle, LinkPhase, LinkState, PeerLink};
pub use loopback::{LoopbackConnector, LoopbackTransport, LoopbackWire, LoopbackWires};
pub use transport::{Connector, Transport};
