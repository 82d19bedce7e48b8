//! 設定
//!
//! JSON（kebab-case）で記述する設定。すべての項目にデフォルト値がある。

use crate::error::{config::Result, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// デフォルトのヒント文字（ホームポジション）
pub const DEFAULT_HINT_ALPHABET: &str = "asdfghjkl";

/// blockvim 設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// リンクヒントのラベルに使う文字
    pub hint_alphabet: String,
    /// 同じ行とみなす縦方向の許容差（px）
    pub row_tolerance_px: f64,
    /// 半ページスクロールの割合
    pub scroll_fraction: f64,
    /// 削除バッチのポーリング間隔
    pub deletion_poll_interval_ms: u64,
    /// 削除バッチのタイムアウト
    pub deletion_timeout_ms: u64,
    /// 単一リージョン削除時にホストへ渡す遅延
    pub single_delete_delay_ms: u64,
    /// 起動時のリージョン探索間隔
    pub startup_poll_interval_ms: u64,
    /// 起動時のリージョン探索の最大試行回数
    pub startup_max_attempts: u32,
    /// キャレットオーバーレイの最小幅（px）
    pub caret_min_width_px: f64,
    /// ログレベル名（`log::LevelFilter` として解釈）
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hint_alphabet: DEFAULT_HINT_ALPHABET.to_string(),
            row_tolerance_px: 4.0,
            scroll_fraction: 0.5,
            deletion_poll_interval_ms: 50,
            deletion_timeout_ms: 2_000,
            single_delete_delay_ms: 10,
            startup_poll_interval_ms: 100,
            startup_max_attempts: 50,
            caret_min_width_px: 8.0,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON文字列から読み込んで検証
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// ファイルから読み込んで検証
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|_| ConfigError::InvalidFile {
            path: path.display().to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// 標準の設定ファイルパス
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("blockvim").join("config.json"))
    }

    /// 標準パスから読み込み、ファイルが無ければデフォルト
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// 値の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        let distinct: HashSet<char> = self.hint_alphabet.chars().collect();
        if distinct.len() < 2 || distinct.len() != self.hint_alphabet.chars().count() {
            return Err(invalid("hint-alphabet", &self.hint_alphabet));
        }
        if !(self.row_tolerance_px >= 0.0) {
            return Err(invalid("row-tolerance-px", self.row_tolerance_px));
        }
        if !(self.scroll_fraction > 0.0 && self.scroll_fraction <= 1.0) {
            return Err(invalid("scroll-fraction", self.scroll_fraction));
        }
        if self.deletion_poll_interval_ms == 0 {
            return Err(invalid("deletion-poll-interval-ms", 0));
        }
        if self.deletion_timeout_ms == 0 {
            return Err(invalid("deletion-timeout-ms", 0));
        }
        if self.startup_poll_interval_ms == 0 {
            return Err(invalid("startup-poll-interval-ms", 0));
        }
        if self.startup_max_attempts == 0 {
            return Err(invalid("startup-max-attempts", 0));
        }
        Ok(())
    }

    pub fn hint_alphabet(&self) -> Vec<char> {
        self.hint_alphabet.chars().collect()
    }

    pub fn deletion_poll_interval(&self) -> Duration {
        Duration::from_millis(self.deletion_poll_interval_ms)
    }

    pub fn deletion_timeout(&self) -> Duration {
        Duration::from_millis(self.deletion_timeout_ms)
    }

    pub fn single_delete_delay(&self) -> Duration {
        Duration::from_millis(self.single_delete_delay_ms)
    }

    pub fn startup_poll_interval(&self) -> Duration {
        Duration::from_millis(self.startup_poll_interval_ms)
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
