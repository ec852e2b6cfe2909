//! ピアリンク（外側の接続）の状態機械
//!
//! ```text
//! Connecting ──Established──▶ Connected ──CloseStarted──▶ Closing ──Closed──▶ Closed
//!     │                          │   └────────────Closed──────────────────────▲
//!     └──Failed──▶ Error ◀──Failed┘            Closing ──Failed──▶ Error
//! ```
//!
//! `Closed` と `Error` は終端状態。チャンネルを作る能力（[`LinkHandle`]）は
//! `Connected` のときだけ取り出せる。

use alloc::string::String;

use log::{debug, warn};

use crate::channel::DataChannel;
use crate::error::ChannelError;
use crate::label::ChannelLabel;
use crate::transport::Connector;

/// トランスポートからのリンク状態通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// 接続が確立した
    Established,
    /// 回復不能なエラー
    Failed(String),
    /// シャットダウン開始
    CloseStarted,
    /// シャットダウン完了
    Closed,
}

impl LinkEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LinkEvent::Established => "established",
            LinkEvent::Failed(_) => "failed",
            LinkEvent::CloseStarted => "close-started",
            LinkEvent::Closed => "closed",
        }
    }
}

/// リンク状態の種別（ペイロードなし）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    Connecting,
    Connected,
    Closing,
    Closed,
    Error,
}

impl LinkPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkPhase::Connecting => "connecting",
            LinkPhase::Connected => "connected",
            LinkPhase::Closing => "closing",
            LinkPhase::Closed => "closed",
            LinkPhase::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LinkPhase::Closed | LinkPhase::Error)
    }
}

/// リンクの状態
pub enum LinkState<C> {
    /// 確立待ち
    Connecting(C),
    /// 確立済み（チャンネルを作れる）
    Connected(C),
    /// シャットダウン中
    Closing,
    /// 終端: 正常終了
    Closed,
    /// 終端: エラー
    Error(String),
}

impl<C> LinkState<C> {
    pub fn phase(&self) -> LinkPhase {
        match self {
            LinkState::Connecting(_) => LinkPhase::Connecting,
            LinkState::Connected(_) => LinkPhase::Connected,
            LinkState::Closing => LinkPhase::Closing,
            LinkState::Closed => LinkPhase::Closed,
            LinkState::Error(_) => LinkPhase::Error,
        }
    }
}

/// ポイントツーポイントのピアリンク
///
/// 接続の確立（シグナリング、NAT 越え）は外部で行い、その進行を
/// [`apply`](Self::apply) で通知してもらう。再接続はしない。
pub struct PeerLink<C> {
    state: LinkState<C>,
}

impl<C: Connector> PeerLink<C> {
    /// connecting 状態のリンクを生成する
    pub fn connecting(connector: C) -> Self {
        PeerLink { state: LinkState::Connecting(connector) }
    }

    /// 既に connected なリンクを生成する（ループバック用）
    pub(crate) fn connected(connector: C) -> Self {
        PeerLink { state: LinkState::Connected(connector) }
    }

    pub fn state(&self) -> &LinkState<C> {
        &self.state
    }

    pub fn phase(&self) -> LinkPhase {
        self.state.phase()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }

    /// `Error` 状態ならその理由
    pub fn error_reason(&self) -> Option<&str> {
        match &self.state {
            LinkState::Error(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    /// トランスポートからの状態通知を適用する
    ///
    /// `Connected` を離れるとき（`Failed` / `CloseStarted` / `Closed`）は
    /// コネクタを閉じてから遷移する。
    /// 終端状態に重複して届く `Closed` は無視する。
    ///
    /// # エラー
    /// - `ChannelError::InvalidTransition`: 現在の状態では受け付けないイベント（状態は変わらない）
    pub fn apply(&mut self, event: LinkEvent) -> Result<(), ChannelError> {
        let from = self.phase();
        let event_name = event.name();
        let prev = core::mem::replace(&mut self.state, LinkState::Closed);

        let (next, result) = match (prev, event) {
            (LinkState::Connecting(c), LinkEvent::Established) => (LinkState::Connected(c), Ok(())),
            (LinkState::Connecting(mut c) | LinkState::Connected(mut c), LinkEvent::Failed(reason)) => {
                c.close();
                (LinkState::Error(reason), Ok(()))
            }
            (LinkState::Closing, LinkEvent::Failed(reason)) => (LinkState::Error(reason), Ok(())),
            (LinkState::Connected(mut c), LinkEvent::CloseStarted) => {
                c.close();
                (LinkState::Closing, Ok(()))
            }
            (LinkState::Connected(mut c), LinkEvent::Closed) => {
                c.close();
                (LinkState::Closed, Ok(()))
            }
            (LinkState::Closing, LinkEvent::Closed) => (LinkState::Closed, Ok(())),
            (LinkState::Closed, LinkEvent::Closed) => (LinkState::Closed, Ok(())),
            (state, _) => (
                state,
                Err(ChannelError::InvalidTransition {
                    from: from.as_str(),
                    event: event_name,
                }),
            ),
        };
        self.state = next;

        match (&result, &self.state) {
            (Ok(()), LinkState::Error(reason)) => {
                warn!("link: {} -> error: {}", from.as_str(), reason)
            }
            (Ok(()), state) => debug!("link: {} -> {} ({})", from.as_str(), state.phase().as_str(), event_name),
            (Err(e), _) => warn!("link: {}", e),
        }
        result
    }

    /// チャンネルを作る能力を取り出す
    ///
    /// # 戻り値
    /// - `Some(handle)`: `Connected` 状態
    /// - `None`: それ以外
    pub fn handle(&mut self) -> Option<LinkHandle<'_, C>> {
        if self.phase() == LinkPhase::Connected {
            Some(LinkHandle { link: self })
        } else {
            None
        }
    }
}

impl<C> core::fmt::Debug for PeerLink<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeerLink").field("phase", &self.state.phase()).finish()
    }
}

/// `Connected` なリンクの能力
pub struct LinkHandle<'a, C: Connector> {
    link: &'a mut PeerLink<C>,
}

impl<'a, C: Connector> LinkHandle<'a, C> {
    /// ラベル付きのデータチャンネルを作る
    ///
    /// チャンネルは `Opening` から始まり、トランスポートの `Ready` 通知で `Open` になる。
    ///
    /// # エラー
    /// コネクタのエラーをそのまま返す
    pub fn open_channel(&mut self, label: ChannelLabel) -> Result<DataChannel<C::Channel>, ChannelError> {
        let LinkState::Connected(connector) = &mut self.link.state else {
            return Err(ChannelError::NotConnected);
        };
        let transport = connector.create_channel(&label)?;
        debug!("link: opening channel {}", label);
        Ok(DataChannel::opening(label, transport))
    }

    /// リンクのシャットダウンを始める（`Closing` に入る）
    ///
    /// `Closed` への遷移はトランスポートの通知を待つ。
    pub fn close(self) {
        if let LinkState::Connected(mut connector) = core::mem::replace(&mut self.link.state, LinkState::Closing) {
            connector.close();
        }
        debug!("link: connected -> closing (local close)");
    }
}
