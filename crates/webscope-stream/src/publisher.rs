//! 送信側: バッチに連番を振ってフレームとして送る

use alloc::vec::Vec;

use log::debug;

use webscope_channel::{ChannelError, DataChannel, Transport};
use webscope_frame::{encode, Sample, SampleBatch};
use webscope_seq::Sequencer;

/// 何フレームごとに送信ログを出すか
pub const LOG_EVERY: u16 = 64;

/// サンプル列をフレームにして送るパブリッシャ
///
/// 送信の成否にかかわらず番号は 1 つ進む。受信側からは欠落として見えるので、
/// 送れなかった区間をまたいで波形がつながることはない。
#[derive(Debug, Clone, Default)]
pub struct Publisher {
    sequencer: Sequencer,
    sent: u64,
    failed: u64,
}

impl Publisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定した番号から送り始める
    pub fn starting_at(start: u16) -> Self {
        Publisher {
            sequencer: Sequencer::starting_at(start),
            ..Self::default()
        }
    }

    /// 次のバッチを組み立てる（番号を 1 つ進める）
    pub fn next_batch(&mut self, samples: Vec<Sample>) -> SampleBatch {
        SampleBatch {
            sequence_id: self.sequencer.advance(),
            samples,
        }
    }

    /// サンプル列を次の番号で `channel` に送る
    ///
    /// # 戻り値
    /// 送ったフレームの sequence_id
    ///
    /// # エラー
    /// - `ChannelError::NotOpen` / `ChannelError::Closed`: チャンネルが open でない。
    ///   呼び出し側はこのチャンネルへの送信をやめてよい。
    /// - トランスポートの送信エラー
    pub fn publish<T: Transport>(
        &mut self,
        channel: &mut DataChannel<T>,
        samples: Vec<Sample>,
    ) -> Result<u16, ChannelError> {
        let batch = self.next_batch(samples);
        let bytes = encode(&batch);

        let result = channel.try_handle().and_then(|mut handle| handle.send(&bytes));
        match result {
            Ok(()) => {
                self.sent += 1;
                if batch.sequence_id % LOG_EVERY == 0 {
                    debug!("sending frame #{} ({} samples)", batch.sequence_id, batch.len());
                }
                Ok(batch.sequence_id)
            }
            Err(e) => {
                self.failed += 1;
                Err(e)
            }
        }
    }

    /// 次に使う番号
    pub fn next_sequence_id(&self) -> u16 {
        self.sequencer.peek()
    }

    /// 送信できたフレーム数
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// 送信に失敗したフレーム数
    pub fn failed(&self) -> u64 {
        self.failed
    }
}
