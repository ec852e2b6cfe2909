//! 受信側の設定
//!
//! JS からは JSON 文字列で渡す。省略したフィールドはデフォルト値になる。
//!
//! ```json
//! { "retention_bound": 4000, "channel_label": "webscope_data", "log_level": "info" }
//! ```

use core::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use webscope_channel::{ChannelLabel, DATA_LABEL};

/// ウィンドウ上限のデフォルト（60Hz 送信で 1 フレーム 1000 サンプルなら約 4 フレーム分）
pub const DEFAULT_RETENTION_BOUND: usize = 4000;

/// JS から渡された上限を検証する
///
/// # 戻り値
/// 省略時は [`DEFAULT_RETENTION_BOUND`]
///
/// # エラー
/// - `ConfigError::ZeroRetention`: 0 が渡された
pub fn retention_bound_or_default(retention_bound: Option<u32>) -> Result<usize, ConfigError> {
    match retention_bound {
        None => Ok(DEFAULT_RETENTION_BOUND),
        Some(0) => Err(ConfigError::ZeroRetention),
        Some(bound) => Ok(bound as usize),
    }
}

/// 設定エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(String),

    #[error("retention_bound must be positive")]
    ZeroRetention,

    #[error("unknown log level: {0}")]
    UnknownLogLevel(String),
}

/// 受信側の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// ウィンドウに保持する最大サンプル数
    pub retention_bound: usize,
    /// 購読するチャンネルのラベル
    pub channel_label: String,
    /// ログレベル（"off" / "error" / "warn" / "info" / "debug" / "trace"）
    pub log_level: String,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        ScopeConfig {
            retention_bound: DEFAULT_RETENTION_BOUND,
            channel_label: DATA_LABEL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ScopeConfig {
    /// JSON 文字列から読み込んで検証する
    ///
    /// # エラー
    /// - `ConfigError::Json`: JSON として不正、または型が合わない
    /// - `ConfigError::ZeroRetention`: `retention_bound` が 0
    /// - `ConfigError::UnknownLogLevel`: `log_level` が解釈できない
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ScopeConfig = serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention_bound == 0 {
            return Err(ConfigError::ZeroRetention);
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level).map_err(|_| ConfigError::UnknownLogLevel(self.log_level.clone()))
    }

    pub fn label(&self) -> ChannelLabel {
        ChannelLabel::parse(&self.channel_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = ScopeConfig::from_json("{}").unwrap();
        assert_eq!(config, ScopeConfig::default());
        assert_eq!(config.retention_bound, 4000);
        assert_eq!(config.label(), ChannelLabel::Data);
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_partial_override() {
        let config = ScopeConfig::from_json(r#"{"retention_bound": 12, "log_level": "DEBUG"}"#).unwrap();
        assert_eq!(config.retention_bound, 12);
        assert_eq!(config.channel_label, "webscope_data");
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
    }

    #[test]
    fn test_custom_label() {
        let config = ScopeConfig::from_json(r#"{"channel_label": "scope-2"}"#).unwrap();
        assert_eq!(config.label(), ChannelLabel::Other("scope-2".to_string()));
    }

    #[test]
    fn test_retention_bound_argument() {
        assert_eq!(retention_bound_or_default(None), Ok(4000));
        assert_eq!(retention_bound_or_default(Some(12)), Ok(12));
        assert_eq!(retention_bound_or_default(Some(0)), Err(ConfigError::ZeroRetention));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(ScopeConfig::from_json("not json"), Err(ConfigError::Json(_))));
        assert!(matches!(
            ScopeConfig::from_json(r#"{"retention_bound": -1}"#),
            Err(ConfigError::Json(_))
        ));
        assert_eq!(
            ScopeConfig::from_json(r#"{"retention_bound": 0}"#),
            Err(ConfigError::ZeroRetention)
        );
        assert_eq!(
            ScopeConfig::from_json(r#"{"log_level": "loud"}"#),
            Err(ConfigError::UnknownLogLevel("loud".to_string()))
        );
    }
}
