//! 16 ビット循環シーケンス番号
//!
//! フレームの sequence_id は u16 で、65535 の次は 0 に戻る。
//! 大小比較は必ず符号付き循環距離 [`distance`] を経由して行う。

/// シーケンス番号空間の大きさ（u16 の値域）
pub const MODULUS: u32 = 1 << 16;

/// 循環距離の上限（M/2）
pub const HALF_MODULUS: i32 = (MODULUS / 2) as i32;

/// `current` が `prev` から何ステップ先にあるかを返す
///
/// 結果は `(-M/2, M/2]`（= `-32767..=32768`）に正規化される。
/// `M/2 - ((M/2 - (current - prev)) mod M)` と同値。
///
/// - 正: `current` の方が新しい
/// - 0 以下: 重複、または遅れて届いた古い番号
///
/// # 例
/// ```
/// use webscope_seq::distance;
/// assert_eq!(distance(1, 0), 1);
/// assert_eq!(distance(0, 65535), 1);   // ラップアラウンド
/// assert_eq!(distance(5, 7), -2);
/// ```
pub fn distance(current: u16, prev: u16) -> i32 {
    let forward = i32::from(current.wrapping_sub(prev));
    if forward <= HALF_MODULUS {
        forward
    } else {
        forward - MODULUS as i32
    }
}

/// 次のシーケンス番号（65535 の次は 0）
pub fn successor(n: u16) -> u16 {
    n.wrapping_add(1)
}

/// 循環シーケンス番号
///
/// 生の `u16` に循環比較のメソッドを付けた newtype。
/// `Ord` は意図的に実装しない（循環空間では全順序にならないため）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SeqNum(pub u16);

impl SeqNum {
    /// 初期値
    pub const ZERO: Self = SeqNum(0);

    /// `self` が `prev` から何ステップ先か（[`distance`] 参照）
    pub fn distance_from(self, prev: Self) -> i32 {
        distance(self.0, prev.0)
    }

    /// 次の番号
    pub fn successor(self) -> Self {
        SeqNum(successor(self.0))
    }

    /// `self` が `other` より厳密に新しいか
    pub fn is_ahead_of(self, other: Self) -> bool {
        self.distance_from(other) > 0
    }

    /// `self` が `prev` の直後の番号か
    pub fn follows(self, prev: Self) -> bool {
        self.distance_from(prev) == 1
    }

    /// 生の u16 値を返す
    pub fn raw(self) -> u16 {
        self.0
    }
}

impl From<u16> for SeqNum {
    fn from(val: u16) -> Self {
        SeqNum(val)
    }
}

impl From<SeqNum> for u16 {
    fn from(seq: SeqNum) -> Self {
        seq.0
    }
}

impl core::fmt::Display for SeqNum {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_distance_same_is_zero() {
        assert_eq!(distance(0, 0), 0);
        assert_eq!(distance(12345, 12345), 0);
        assert_eq!(distance(u16::MAX, u16::MAX), 0);
    }

    #[test]
    fn test_distance_forward_and_backward() {
        assert_eq!(distance(7, 5), 2);
        assert_eq!(distance(5, 7), -2);
        assert_eq!(distance(1000, 0), 1000);
    }

    #[test]
    fn test_distance_wraparound() {
        // 65535 → 0 は 1 ステップ先
        assert_eq!(distance(0, 65535), 1);
        assert_eq!(distance(65535, 0), -1);
        // 65530 → 4 は 10 ステップ先
        assert_eq!(distance(4, 65530), 10);
    }

    #[test]
    fn test_distance_range_bounds() {
        // ちょうど半周は正側（M/2）に寄せる
        assert_eq!(distance(32768, 0), 32768);
        assert_eq!(distance(0, 32768), 32768);
        // 半周 - 1 と 半周 + 1
        assert_eq!(distance(32767, 0), 32767);
        assert_eq!(distance(32769, 0), -32767);
    }

    #[test]
    fn test_successor_wraps() {
        assert_eq!(successor(0), 1);
        assert_eq!(successor(65534), 65535);
        assert_eq!(successor(65535), 0);
    }

    #[test]
    fn test_seqnum_helpers() {
        let a = SeqNum(65535);
        let b = a.successor();
        assert_eq!(b, SeqNum(0));
        assert!(b.follows(a));
        assert!(b.is_ahead_of(a));
        assert!(!a.is_ahead_of(b));
        assert!(!a.is_ahead_of(a));
        assert_eq!(u16::from(b), 0);
    }

    proptest! {
        #[test]
        fn prop_distance_to_self_is_zero(n in any::<u16>()) {
            prop_assert_eq!(distance(n, n), 0);
        }

        #[test]
        fn prop_successor_is_one_ahead(n in any::<u16>()) {
            prop_assert_eq!(distance(successor(n), n), 1);
        }

        #[test]
        fn prop_distance_in_half_open_range(a in any::<u16>(), b in any::<u16>()) {
            let d = distance(a, b);
            prop_assert!(d > -HALF_MODULUS && d <= HALF_MODULUS);
            // b + d ≡ a (mod M)
            prop_assert_eq!(b.wrapping_add(d as u16), a);
        }
    }
}
