//! インメモリのループバックトランスポート
//!
//! ローカル動作確認・テスト用の [`Transport`] / [`Connector`] 実装。
//! 送信したメッセージは [`LoopbackWire`] に溜まり、呼び出し側が任意のチャンネルへ
//! 配送する。配送前に取り出して並べ替え・欠落・重複を作れるので、
//! 損失のあるネットワークを模擬できる。

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::channel::DataChannel;
use crate::error::ChannelError;
use crate::label::ChannelLabel;
use crate::link::PeerLink;
use crate::transport::{Connector, Transport};

/// 送信済み・未配送のメッセージ列
///
/// クローンは同じ列を共有する。
#[derive(Clone, Default)]
pub struct LoopbackWire {
    in_flight: Rc<RefCell<VecDeque<Vec<u8>>>>,
    closed: Rc<Cell<bool>>,
}

impl LoopbackWire {
    pub fn new() -> Self {
        Self::default()
    }

    /// この列に書き込むトランスポートを作る
    pub fn transport(&self) -> LoopbackTransport {
        LoopbackTransport { wire: self.clone() }
    }

    /// 未配送のメッセージ数
    pub fn in_flight(&self) -> usize {
        self.in_flight.borrow().len()
    }

    /// 送信側が close したか
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// 未配送のメッセージをすべて取り出す（並べ替えや欠落の模擬用）
    pub fn take_all(&self) -> Vec<Vec<u8>> {
        self.in_flight.borrow_mut().drain(..).collect()
    }

    /// メッセージを列の末尾に積む（[`take_all`](Self::take_all) したものを戻す用途）
    pub fn push(&self, message: Vec<u8>) {
        self.in_flight.borrow_mut().push_back(message);
    }

    /// 未配送のメッセージを先頭から順に `channel` へ配送する
    ///
    /// # 戻り値
    /// ハンドラに渡ったメッセージ数
    pub fn deliver_to<T: Transport>(&self, channel: &mut DataChannel<T>) -> usize {
        let mut handled = 0;
        loop {
            // 借用はこの文で終わる（ハンドラ内からの送信で再借用できるように）
            let next = self.in_flight.borrow_mut().pop_front();
            let Some(message) = next else {
                break;
            };
            if channel.deliver(&message) {
                handled += 1;
            }
        }
        handled
    }
}

/// [`LoopbackWire`] に書き込むトランスポート
pub struct LoopbackTransport {
    wire: LoopbackWire,
}

impl Transport for LoopbackTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        if self.wire.is_closed() {
            return Err(ChannelError::Closed);
        }
        self.wire.push(bytes.to_vec());
        Ok(())
    }

    fn close(&mut self) {
        self.wire.closed.set(true);
    }
}

impl DataChannel<LoopbackTransport> {
    /// 既に open なループバックチャンネルを作る
    ///
    /// # 戻り値
    /// `(チャンネル, 送信メッセージが溜まる列)`
    pub fn loopback(label: ChannelLabel) -> (Self, LoopbackWire) {
        let wire = LoopbackWire::new();
        (DataChannel::opened(label, wire.transport()), wire)
    }
}

/// ループバックリンクが作ったチャンネルの列の一覧
///
/// クローンは同じ一覧を共有する。
#[derive(Clone, Default)]
pub struct LoopbackWires(Rc<RefCell<Vec<(ChannelLabel, LoopbackWire)>>>);

impl LoopbackWires {
    /// `label` で最後に作られたチャンネルの列
    pub fn get(&self, label: &ChannelLabel) -> Option<LoopbackWire> {
        self.0
            .borrow()
            .iter()
            .rev()
            .find(|(l, _)| l == label)
            .map(|(_, wire)| wire.clone())
    }

    /// 作られたチャンネル数
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// ループバックチャンネルを作るコネクタ
pub struct LoopbackConnector {
    wires: LoopbackWires,
    closed: bool,
}

impl Connector for LoopbackConnector {
    type Channel = LoopbackTransport;

    fn create_channel(&mut self, label: &ChannelLabel) -> Result<LoopbackTransport, ChannelError> {
        if self.closed {
            return Err(ChannelError::NotConnected);
        }
        let wire = LoopbackWire::new();
        self.wires.0.borrow_mut().push((label.clone(), wire.clone()));
        Ok(wire.transport())
    }

    fn close(&mut self) {
        self.closed = true;
        for (_, wire) in self.wires.0.borrow().iter() {
            wire.closed.set(true);
        }
    }
}

impl PeerLink<LoopbackConnector> {
    /// 既に connected なループバックリンクを作る
    ///
    /// # 戻り値
    /// `(リンク, 作られたチャンネルの列の一覧)`
    pub fn loopback() -> (Self, LoopbackWires) {
        let wires = LoopbackWires::default();
        let connector = LoopbackConnector { wires: wires.clone(), closed: false };
        (PeerLink::connected(connector), wires)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelEvent;
    use crate::link::{LinkEvent, LinkPhase};

    fn collector(channel: &mut DataChannel<LoopbackTransport>) -> Rc<RefCell<Vec<Vec<u8>>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        channel
            .handle()
            .unwrap()
            .register_receive_handler(move |bytes| sink.borrow_mut().push(bytes.to_vec()));
        seen
    }

    #[test]
    fn test_loopback_is_open() {
        let (mut ch, wire) = DataChannel::loopback(ChannelLabel::Data);
        assert!(ch.is_open());
        ch.handle().unwrap().send(b"ping").unwrap();
        assert_eq!(wire.in_flight(), 1);
    }

    #[test]
    fn test_loopback_pair_delivery() {
        let (mut a, a_wire) = DataChannel::loopback(ChannelLabel::Data);
        let (mut b, _b_wire) = DataChannel::loopback(ChannelLabel::Data);
        let seen = collector(&mut b);

        a.handle().unwrap().send(b"one").unwrap();
        a.handle().unwrap().send(b"two").unwrap();
        assert_eq!(a_wire.deliver_to(&mut b), 2);

        assert_eq!(seen.borrow().as_slice(), &[b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(a_wire.in_flight(), 0);
    }

    #[test]
    fn test_reorder_and_drop_via_take_all() {
        let (mut a, wire) = DataChannel::loopback(ChannelLabel::Data);
        let (mut b, _) = DataChannel::loopback(ChannelLabel::Data);
        let seen = collector(&mut b);

        for msg in [b"1", b"2", b"3"] {
            a.handle().unwrap().send(msg).unwrap();
        }
        let mut msgs = wire.take_all();
        msgs.remove(1); // "2" を落とす
        msgs.reverse();
        for m in msgs {
            wire.push(m);
        }
        wire.deliver_to(&mut b);

        assert_eq!(seen.borrow().as_slice(), &[b"3".to_vec(), b"1".to_vec()]);
    }

    #[test]
    fn test_send_after_transport_close_fails() {
        let (mut ch, wire) = DataChannel::loopback(ChannelLabel::Data);
        let mut transport = wire.transport();
        transport.close();
        assert!(wire.is_closed());

        // 下位層が閉じていれば open のままでも送信はエラー
        assert_eq!(ch.handle().unwrap().send(b"x"), Err(ChannelError::Closed));
        assert_eq!(ch.stats().messages_sent, 0);
    }

    #[test]
    fn test_loopback_link_creates_channels() {
        let (mut link, wires) = PeerLink::loopback();
        assert_eq!(link.phase(), LinkPhase::Connected);

        let mut ch = link.handle().unwrap().open_channel(ChannelLabel::Data).unwrap();
        assert_eq!(wires.len(), 1);
        assert!(ch.handle().is_none());

        ch.apply(ChannelEvent::Ready).unwrap();
        ch.handle().unwrap().send(b"frame").unwrap();
        assert_eq!(wires.get(&ChannelLabel::Data).unwrap().in_flight(), 1);
        assert!(wires.get(&ChannelLabel::Echo).is_none());
    }

    #[test]
    fn test_loopback_link_close_closes_wires() {
        let (mut link, wires) = PeerLink::loopback();
        let mut ch = link.handle().unwrap().open_channel(ChannelLabel::Data).unwrap();
        ch.apply(ChannelEvent::Ready).unwrap();

        link.handle().unwrap().close();
        assert_eq!(link.phase(), LinkPhase::Closing);
        assert!(wires.get(&ChannelLabel::Data).unwrap().is_closed());
        assert_eq!(ch.handle().unwrap().send(b"late"), Err(ChannelError::Closed));

        link.apply(LinkEvent::Closed).unwrap();
        ch.apply(ChannelEvent::Closed).unwrap();
        assert!(ch.is_closed());
    }

    #[test]
    fn test_link_closed_by_events_rejects_sends() {
        let (mut link, wires) = PeerLink::loopback();
        let mut ch = link.handle().unwrap().open_channel(ChannelLabel::Data).unwrap();
        ch.apply(ChannelEvent::Ready).unwrap();

        // ローカルの close を使わず、トランスポートの通知だけで閉じる
        link.apply(LinkEvent::CloseStarted).unwrap();
        assert!(wires.get(&ChannelLabel::Data).unwrap().is_closed());
        assert_eq!(ch.handle().unwrap().send(b"during"), Err(ChannelError::Closed));

        link.apply(LinkEvent::Closed).unwrap();
        assert!(link.is_terminal());
        assert_eq!(ch.handle().unwrap().send(b"after"), Err(ChannelError::Closed));
        assert_eq!(ch.stats().messages_sent, 0);
    }

    #[test]
    fn test_link_closed_without_closing_phase_rejects_sends() {
        let (mut link, wires) = PeerLink::loopback();
        let mut ch = link.handle().unwrap().open_channel(ChannelLabel::Data).unwrap();
        ch.apply(ChannelEvent::Ready).unwrap();

        link.apply(LinkEvent::Closed).unwrap();
        assert_eq!(link.phase(), LinkPhase::Closed);
        assert!(wires.get(&ChannelLabel::Data).unwrap().is_closed());
        assert_eq!(ch.handle().unwrap().send(b"late"), Err(ChannelError::Closed));
    }
}
