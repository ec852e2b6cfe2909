//! `log` ファサードのバックエンド
//!
//! コアクレートは `log` マクロだけを使う。WASM ではこのロガーが
//! ブラウザの `console.*` に転送する。

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;
use web_sys::console;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => console::error_1(&line),
            Level::Warn => console::warn_1(&line),
            Level::Info => console::info_1(&line),
            Level::Debug | Level::Trace => console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// ロガーを登録してレベルを設定する
///
/// 2 回目以降はレベルの変更だけが効く。
pub fn install(level: LevelFilter) {
    // 既に登録済みなら Err になるが、レベルは更新したいので無視する
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
