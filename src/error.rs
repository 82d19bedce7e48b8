//! エラーハンドリングシステム
//!
//! blockvim 全体で使用される統一されたエラー型とユーティリティを定義
//! 検索系の操作はエラーを返さず「見つからない」を返す。エラーになるのは
//! ホスト側プリミティブ、設定読み込み、起動処理のみ。

use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug, Clone)]
pub enum BlockVimError {
    /// ホスト操作エラー
    #[error("Host operation failed")]
    Host(#[from] HostError),

    /// 設定エラー
    #[error("Configuration error")]
    Config(#[from] ConfigError),

    /// 起動エラー（致命的）
    #[error("Startup failed")]
    Startup(#[from] StartupError),
}

/// ホスト側プリミティブ固有のエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Region not found: {region}")]
    RegionNotFound { region: u64 },

    #[error("Clipboard unavailable: {message}")]
    ClipboardUnavailable { message: String },

    #[error("Host rejected operation: {operation}")]
    Rejected { operation: String },
}

/// 設定固有のエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration file: {path}")]
    InvalidFile { path: String },

    #[error("Failed to parse configuration: {message}")]
    Parse { message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// 起動固有のエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StartupError {
    #[error("No editable regions found after {attempts} attempts")]
    NoRegions { attempts: u32 },
}

/// エラーレベル分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    Info,
    Warning,
    Error,
    Fatal,
}

impl BlockVimError {
    /// エラーの深刻度
    pub fn level(&self) -> ErrorLevel {
        match self {
            // クリップボード失敗は削除を巻き戻さない
            BlockVimError::Host(HostError::ClipboardUnavailable { .. }) => ErrorLevel::Warning,
            BlockVimError::Host(_) => ErrorLevel::Error,
            BlockVimError::Config(_) => ErrorLevel::Error,
            BlockVimError::Startup(_) => ErrorLevel::Fatal,
        }
    }
}

/// エラーをレベルに応じたログマクロへ振り分ける
pub fn log_error(error: &BlockVimError, context: &str) {
    match error.level() {
        ErrorLevel::Info => log::info!("{} in {}", error_chain(error), context),
        ErrorLevel::Warning => log::warn!("{} in {}", error_chain(error), context),
        ErrorLevel::Error => log::error!("{} in {}", error_chain(error), context),
        ErrorLevel::Fatal => log::error!("FATAL: {} in {}", error_chain(error), context),
    }
}

fn error_chain(error: &BlockVimError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, BlockVimError>;

/// 各モジュール固有のResult型
pub mod host {
    pub type Result<T> = std::result::Result<T, super::HostError>;
}

pub mod config {
    pub type Result<T> = std::result::Result<T, super::ConfigError>;
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse { message: error.to_string() }
    }
}
