//! サンプルバッチのデータ構造

use alloc::vec::Vec;

/// 1 サンプル（計測値と前サンプルからの経過時間）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    /// 計測値
    pub value: f64,
    /// 直前のサンプルからの経過時間（秒）
    ///
    /// バッチ先頭のサンプルでは前バッチ末尾からの経過時間。解釈は描画側に任せる。
    pub dt: f64,
}

impl Sample {
    pub fn new(value: f64, dt: f64) -> Self {
        Sample { value, dt }
    }
}

/// 1 フレームで送られるサンプル列
///
/// `samples` は取得時刻順に並ぶ。受信側で再構成したローリングウィンドウも
/// 同じ形をとる（[`Window`]）。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleBatch {
    /// 循環シーケンス番号
    pub sequence_id: u16,
    /// 取得時刻順のサンプル
    pub samples: Vec<Sample>,
}

/// 再構成済みのローリングウィンドウ
///
/// `sequence_id` は最後にマージしたバッチの番号。
pub type Window = SampleBatch;

impl SampleBatch {
    pub fn new(sequence_id: u16, samples: Vec<Sample>) -> Self {
        SampleBatch { sequence_id, samples }
    }

    /// サンプルを持たないバッチ（受信開始前の初期ウィンドウ等）
    pub fn empty(sequence_id: u16) -> Self {
        SampleBatch { sequence_id, samples: Vec::new() }
    }

    /// 値の列と dt の列からバッチを組み立てる
    ///
    /// 長さが異なる場合は短い方に揃える。
    pub fn from_columns(sequence_id: u16, values: &[f64], dts: &[f64]) -> Self {
        let samples = values
            .iter()
            .zip(dts.iter())
            .map(|(&value, &dt)| Sample { value, dt })
            .collect();
        SampleBatch { sequence_id, samples }
    }

    /// サンプル数
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 計測値の列（描画側の頂点バッファ用）
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// 経過時間の列
    pub fn dts(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.dt).collect()
    }

    /// dt の合計（ウィンドウが覆う時間幅）
    pub fn span(&self) -> f64 {
        self.samples.iter().map(|s| s.dt).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns() {
        let batch = SampleBatch::from_columns(3, &[1.0, 2.0, 3.0], &[0.1, 0.2, 0.3]);
        assert_eq!(batch.sequence_id, 3);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.samples[1], Sample::new(2.0, 0.2));
        assert_eq!(batch.values(), alloc::vec![1.0, 2.0, 3.0]);
        assert_eq!(batch.dts(), alloc::vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_from_columns_mismatched_lengths() {
        // 短い方に揃う
        let batch = SampleBatch::from_columns(0, &[1.0, 2.0, 3.0], &[0.5]);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_empty_batch() {
        let batch = SampleBatch::empty(65535);
        assert!(batch.is_empty());
        assert_eq!(batch.span(), 0.0);
    }

    #[test]
    fn test_span() {
        let batch = SampleBatch::from_columns(0, &[0.0; 4], &[0.25; 4]);
        assert_eq!(batch.span(), 1.0);
    }
}
