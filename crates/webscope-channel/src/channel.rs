//! データチャンネルの状態機械
//!
//! ```text
//! Opening ──Ready──▶ Open ──Closed──▶ Closed
//!    │                                  ▲
//!    └──────────────Closed──────────────┘
//! ```
//!
//! 送受信の能力（[`ChannelHandle`]）は `Open` のときだけ取り出せる。

use alloc::boxed::Box;

use log::{debug, warn};

use crate::error::ChannelError;
use crate::label::ChannelLabel;
use crate::transport::Transport;

/// 受信ハンドラ
///
/// 登録できるのは常に 1 つだけ。再登録すると前のハンドラは破棄される。
pub type ReceiveHandler = Box<dyn FnMut(&[u8])>;

/// トランスポートからの状態通知
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// 送受信可能になった
    Ready,
    /// 閉じた（相手側・下位層どちらからでも）
    Closed,
}

impl ChannelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChannelEvent::Ready => "ready",
            ChannelEvent::Closed => "closed",
        }
    }
}

/// チャンネル状態の種別（ペイロードなし）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    Opening,
    Open,
    Closed,
}

impl ChannelPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelPhase::Opening => "opening",
            ChannelPhase::Open => "open",
            ChannelPhase::Closed => "closed",
        }
    }
}

/// `Open` 状態が保持するもの
pub struct OpenChannel<T> {
    transport: T,
    handler: Option<ReceiveHandler>,
}

/// チャンネルの状態
///
/// トランスポートは `Opening`/`Open` の中にだけ存在し、`Closed` になると破棄される。
pub enum ChannelState<T> {
    /// 確立待ち
    Opening(T),
    /// 送受信可能
    Open(OpenChannel<T>),
    /// 終端状態
    Closed,
}

impl<T> ChannelState<T> {
    pub fn phase(&self) -> ChannelPhase {
        match self {
            ChannelState::Opening(_) => ChannelPhase::Opening,
            ChannelState::Open(_) => ChannelPhase::Open,
            ChannelState::Closed => ChannelPhase::Closed,
        }
    }
}

/// チャンネル統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// 送信したメッセージ数
    pub messages_sent: u64,
    /// 送信したバイト数
    pub bytes_sent: u64,
    /// 受信したメッセージ数（ハンドラ未登録で捨てたものを含む）
    pub messages_received: u64,
    /// 受信したバイト数
    pub bytes_received: u64,
    /// ハンドラ未登録のため捨てたメッセージ数
    pub unhandled: u64,
}

/// ラベル付きの論理チャンネル
///
/// 状態遷移は外部のトランスポートからの通知（[`apply`](Self::apply)）でのみ進む。
/// 例外はローカルからの [`close`](Self::close) で、いつ呼んでも即座に `Closed` になる。
///
/// ## スレッド安全性
///
/// 1 チャンネルにつき 1 つのイベントループから呼ばれる前提。
/// 受信メッセージは 1 つずつ最後まで処理される。
pub struct DataChannel<T> {
    label: ChannelLabel,
    state: ChannelState<T>,
    stats: ChannelStats,
}

impl<T: Transport> DataChannel<T> {
    /// opening 状態のチャンネルを生成する
    ///
    /// # 引数
    /// - `label`: ネゴシエーション時のラベル
    /// - `transport`: 確立途中のトランスポート
    pub fn opening(label: ChannelLabel, transport: T) -> Self {
        DataChannel {
            label,
            state: ChannelState::Opening(transport),
            stats: ChannelStats::default(),
        }
    }

    /// 既に open なチャンネルを生成する（ループバック用）
    pub(crate) fn opened(label: ChannelLabel, transport: T) -> Self {
        DataChannel {
            label,
            state: ChannelState::Open(OpenChannel { transport, handler: None }),
            stats: ChannelStats::default(),
        }
    }

    pub fn label(&self) -> &ChannelLabel {
        &self.label
    }

    pub fn state(&self) -> &ChannelState<T> {
        &self.state
    }

    pub fn phase(&self) -> ChannelPhase {
        self.state.phase()
    }

    pub fn is_open(&self) -> bool {
        self.phase() == ChannelPhase::Open
    }

    pub fn is_closed(&self) -> bool {
        self.phase() == ChannelPhase::Closed
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    /// トランスポートからの状態通知を適用する
    ///
    /// 閉じた後に重複して届く `Closed` は無視する。
    ///
    /// # エラー
    /// - `ChannelError::InvalidTransition`: 現在の状態では受け付けないイベント（状態は変わらない）
    pub fn apply(&mut self, event: ChannelEvent) -> Result<(), ChannelError> {
        let from = self.phase();
        let prev = core::mem::replace(&mut self.state, ChannelState::Closed);

        let (next, result) = match (prev, event) {
            (ChannelState::Opening(transport), ChannelEvent::Ready) => (
                ChannelState::Open(OpenChannel { transport, handler: None }),
                Ok(()),
            ),
            (ChannelState::Opening(_) | ChannelState::Open(_), ChannelEvent::Closed) => {
                (ChannelState::Closed, Ok(()))
            }
            (ChannelState::Closed, ChannelEvent::Closed) => (ChannelState::Closed, Ok(())),
            (state, event) => (
                state,
                Err(ChannelError::InvalidTransition {
                    from: from.as_str(),
                    event: event.name(),
                }),
            ),
        };
        self.state = next;

        match &result {
            Ok(()) => debug!(
                "channel {}: {} -> {} ({})",
                self.label,
                from.as_str(),
                self.phase().as_str(),
                event.name()
            ),
            Err(e) => warn!("channel {}: {}", self.label, e),
        }
        result
    }

    /// 送受信の能力を取り出す
    ///
    /// # 戻り値
    /// - `Some(handle)`: `Open` 状態
    /// - `None`: `Opening` または `Closed`
    pub fn handle(&mut self) -> Option<ChannelHandle<'_, T>> {
        if self.is_open() {
            Some(ChannelHandle { channel: self })
        } else {
            None
        }
    }

    /// [`handle`](Self::handle) のエラー版
    ///
    /// # エラー
    /// - `ChannelError::NotOpen`: まだ `Opening`
    /// - `ChannelError::Closed`: 既に `Closed`
    pub fn try_handle(&mut self) -> Result<ChannelHandle<'_, T>, ChannelError> {
        match self.phase() {
            ChannelPhase::Open => Ok(ChannelHandle { channel: self }),
            ChannelPhase::Opening => Err(ChannelError::NotOpen),
            ChannelPhase::Closed => Err(ChannelError::Closed),
        }
    }

    /// トランスポートが受信したメッセージを現在のハンドラに渡す
    ///
    /// ハンドラ未登録、または `Open` 以外のときは捨てる（バッファリングしない）。
    ///
    /// # 戻り値
    /// ハンドラに渡したら `true`
    pub fn deliver(&mut self, bytes: &[u8]) -> bool {
        let ChannelState::Open(open) = &mut self.state else {
            debug!(
                "channel {}: dropping {} bytes while {}",
                self.label,
                bytes.len(),
                self.state.phase().as_str()
            );
            return false;
        };

        self.stats.messages_received += 1;
        self.stats.bytes_received += bytes.len() as u64;

        match open.handler.as_mut() {
            Some(handler) => {
                handler(bytes);
                true
            }
            None => {
                self.stats.unhandled += 1;
                false
            }
        }
    }

    /// ローカルからチャンネルを閉じる
    ///
    /// どの状態から呼んでも `Closed` になる。既に `Closed` なら何もしない。
    pub fn close(&mut self) {
        let from = self.phase();
        match core::mem::replace(&mut self.state, ChannelState::Closed) {
            ChannelState::Opening(mut transport) => transport.close(),
            ChannelState::Open(mut open) => open.transport.close(),
            ChannelState::Closed => return,
        }
        debug!("channel {}: {} -> closed (local close)", self.label, from.as_str());
    }

    fn send_open(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        let ChannelState::Open(open) = &mut self.state else {
            return Err(ChannelError::Closed);
        };

        match open.transport.send(bytes) {
            Ok(()) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += bytes.len() as u64;
                Ok(())
            }
            Err(e) => {
                warn!("channel {}: send failed: {}", self.label, e);
                Err(e)
            }
        }
    }

    fn set_handler(&mut self, handler: Option<ReceiveHandler>) {
        if let ChannelState::Open(open) = &mut self.state {
            open.handler = handler;
        }
    }
}

impl<T> core::fmt::Debug for DataChannel<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DataChannel")
            .field("label", &self.label)
            .field("phase", &self.state.phase())
            .field("stats", &self.stats)
            .finish()
    }
}

/// `Open` なチャンネルの送受信能力
///
/// [`DataChannel::handle`] からのみ得られる。ハンドルが生きている間、
/// チャンネルの状態は `close` 以外で変わらない。
pub struct ChannelHandle<'a, T: Transport> {
    channel: &'a mut DataChannel<T>,
}

impl<'a, T: Transport> ChannelHandle<'a, T> {
    pub fn label(&self) -> &ChannelLabel {
        &self.channel.label
    }

    /// 1 メッセージを送信する
    ///
    /// # エラー
    /// トランスポートの送信エラーをそのまま返す
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        self.channel.send_open(bytes)
    }

    /// 受信ハンドラを登録する（既存のハンドラは置き換えられる）
    ///
    /// 登録前に届いたメッセージは再送されない。
    pub fn register_receive_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&[u8]) + 'static,
    {
        self.channel.set_handler(Some(Box::new(handler)));
    }

    /// 受信ハンドラを外す
    pub fn clear_receive_handler(&mut self) {
        self.channel.set_handler(None);
    }

    /// チャンネルを閉じる（ハンドルは消費される）
    pub fn close(self) {
        self.channel.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    /// 送信内容と close 回数を記録するだけのトランスポート
    #[derive(Clone, Default)]
    struct Recorder {
        sent: Rc<RefCell<Vec<Vec<u8>>>>,
        closes: Rc<RefCell<u32>>,
    }

    impl Transport for Recorder {
        fn send(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
            self.sent.borrow_mut().push(bytes.to_vec());
            Ok(())
        }

        fn close(&mut self) {
            *self.closes.borrow_mut() += 1;
        }
    }

    fn opening() -> (DataChannel<Recorder>, Recorder) {
        let recorder = Recorder::default();
        (DataChannel::opening(ChannelLabel::Data, recorder.clone()), recorder)
    }

    #[test]
    fn test_initial_state_is_opening() {
        let (mut ch, _) = opening();
        assert_eq!(ch.phase(), ChannelPhase::Opening);
        assert!(ch.handle().is_none());
        assert_eq!(ch.try_handle().err(), Some(ChannelError::NotOpen));
    }

    #[test]
    fn test_ready_opens_and_send_works() {
        let (mut ch, rec) = opening();
        ch.apply(ChannelEvent::Ready).unwrap();
        assert!(ch.is_open());

        ch.handle().unwrap().send(b"abc").unwrap();
        assert_eq!(rec.sent.borrow().as_slice(), &[b"abc".to_vec()]);
        assert_eq!(ch.stats().messages_sent, 1);
        assert_eq!(ch.stats().bytes_sent, 3);
    }

    #[test]
    fn test_closed_from_opening() {
        let (mut ch, _) = opening();
        ch.apply(ChannelEvent::Closed).unwrap();
        assert!(ch.is_closed());
        assert!(ch.handle().is_none());
    }

    #[test]
    fn test_terminal_state_never_left() {
        let (mut ch, _) = opening();
        ch.apply(ChannelEvent::Ready).unwrap();
        ch.apply(ChannelEvent::Closed).unwrap();

        let err = ch.apply(ChannelEvent::Ready).unwrap_err();
        assert_eq!(
            err,
            ChannelError::InvalidTransition { from: "closed", event: "ready" }
        );
        assert!(ch.is_closed());

        // 重複した closed 通知は無害
        assert!(ch.apply(ChannelEvent::Closed).is_ok());
        assert!(ch.is_closed());
    }

    #[test]
    fn test_ready_twice_rejected_state_kept() {
        let (mut ch, _) = opening();
        ch.apply(ChannelEvent::Ready).unwrap();
        assert!(ch.apply(ChannelEvent::Ready).is_err());
        assert!(ch.is_open());
    }

    #[test]
    fn test_handle_close_then_send_rejected() {
        let (mut ch, rec) = opening();
        ch.apply(ChannelEvent::Ready).unwrap();

        ch.handle().unwrap().close();
        assert!(ch.is_closed());
        assert_eq!(*rec.closes.borrow(), 1);

        // close 後は能力が取り出せず、送信はエラーになる
        assert!(ch.handle().is_none());
        assert_eq!(ch.try_handle().err(), Some(ChannelError::Closed));

        // 2 回目の close は何もしない
        ch.close();
        assert_eq!(*rec.closes.borrow(), 1);
    }

    #[test]
    fn test_local_close_while_opening_closes_transport() {
        let (mut ch, rec) = opening();
        ch.close();
        assert!(ch.is_closed());
        assert_eq!(*rec.closes.borrow(), 1);
    }

    #[test]
    fn test_deliver_without_handler_drops() {
        let (mut ch, _) = opening();
        ch.apply(ChannelEvent::Ready).unwrap();

        assert!(!ch.deliver(b"early"));
        assert_eq!(ch.stats().unhandled, 1);

        // 登録後も、登録前のメッセージは再生されない
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        ch.handle()
            .unwrap()
            .register_receive_handler(move |bytes| sink.borrow_mut().push(bytes.to_vec()));
        assert!(seen.borrow().is_empty());

        assert!(ch.deliver(b"late"));
        assert_eq!(seen.borrow().as_slice(), &[b"late".to_vec()]);
    }

    #[test]
    fn test_register_replaces_handler() {
        let (mut ch, _) = opening();
        ch.apply(ChannelEvent::Ready).unwrap();

        let first = Rc::new(RefCell::new(0u32));
        let second = Rc::new(RefCell::new(0u32));

        let f = first.clone();
        ch.handle().unwrap().register_receive_handler(move |_| *f.borrow_mut() += 1);
        ch.deliver(b"1");

        let s = second.clone();
        ch.handle().unwrap().register_receive_handler(move |_| *s.borrow_mut() += 1);
        ch.deliver(b"2");
        ch.deliver(b"3");

        assert_eq!(*first.borrow(), 1);
        assert_eq!(*second.borrow(), 2);
    }

    #[test]
    fn test_clear_handler_drops_later_messages() {
        let (mut ch, _) = opening();
        ch.apply(ChannelEvent::Ready).unwrap();

        let count = Rc::new(RefCell::new(0u32));
        let c = count.clone();
        ch.handle().unwrap().register_receive_handler(move |_| *c.borrow_mut() += 1);
        assert!(ch.deliver(b"1"));

        ch.handle().unwrap().clear_receive_handler();
        assert!(!ch.deliver(b"2"));
        assert_eq!(*count.borrow(), 1);
        assert_eq!(ch.stats().unhandled, 1);
        assert_eq!(ch.stats().messages_received, 2);
    }

    #[test]
    fn test_deliver_while_opening_or_closed_is_dropped() {
        let (mut ch, _) = opening();
        assert!(!ch.deliver(b"x"));
        ch.close();
        assert!(!ch.deliver(b"y"));
        assert_eq!(ch.stats().messages_received, 0);
    }
}
