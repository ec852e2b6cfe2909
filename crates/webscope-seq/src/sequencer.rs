//! 送信側のシーケンス番号採番

use crate::sequence::SeqNum;

/// 送信するバッチに連番を振るカウンタ
///
/// 0 から始まり、65535 の次は 0 に戻る。
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    next: SeqNum,
}

impl Sequencer {
    /// 0 から採番する Sequencer を生成する
    pub fn new() -> Self {
        Sequencer { next: SeqNum::ZERO }
    }

    /// 任意の番号から採番を始める（再接続時の継続用）
    pub fn starting_at(start: u16) -> Self {
        Sequencer { next: SeqNum(start) }
    }

    /// 次の番号を払い出してカウンタを進める
    pub fn advance(&mut self) -> u16 {
        let current = self.next;
        self.next = current.successor();
        current.raw()
    }

    /// 次に払い出される番号（カウンタは進めない）
    pub fn peek(&self) -> u16 {
        self.next.raw()
    }
}
