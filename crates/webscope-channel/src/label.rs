//! チャンネルラベル
//!
//! ネゴシエーション時に付けられたラベルでチャンネルの用途を判別する。

use alloc::string::{String, ToString};

/// サンプルフレームを流すチャンネルのラベル
pub const DATA_LABEL: &str = "webscope_data";

/// 受信メッセージをそのまま送り返すチャンネルのラベル（遅延計測用）
pub const ECHO_LABEL: &str = "echo";

/// チャンネルの用途
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelLabel {
    /// サンプルフレーム
    Data,
    /// エコー
    Echo,
    /// 上記以外（呼び出し側で扱いを決める）
    Other(String),
}

impl ChannelLabel {
    /// ラベル文字列から判別する
    pub fn parse(label: &str) -> Self {
        match label {
            DATA_LABEL => ChannelLabel::Data,
            ECHO_LABEL => ChannelLabel::Echo,
            other => ChannelLabel::Other(other.to_string()),
        }
    }

    /// ネゴシエーションに使うラベル文字列
    pub fn as_str(&self) -> &str {
        match self {
            ChannelLabel::Data => DATA_LABEL,
            ChannelLabel::Echo => ECHO_LABEL,
            ChannelLabel::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for ChannelLabel {
    fn from(label: &str) -> Self {
        ChannelLabel::parse(label)
    }
}

impl core::fmt::Display for ChannelLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
