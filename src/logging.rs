//! ロギングシステム
//!
//! `log` ファサードの出力先。開発者向けの詳細ログを stderr と任意のファイルへ書き出す。

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// ロガー
#[derive(Debug, Clone)]
pub struct Logger {
    level: LevelFilter,
    output_stderr: bool,
    output_file: Option<PathBuf>,
}

impl Logger {
    /// デフォルト構築
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            output_stderr: true,
            output_file: None,
        }
    }

    /// 開発者向けロガー
    pub fn for_development() -> Self {
        Self::new(LevelFilter::Debug)
    }

    /// 設定文字列からレベルを決めて構築（不明な値は Info）
    pub fn from_level_name(name: &str) -> Self {
        let level = name.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);
        Self::new(level)
    }

    /// ログレベルを取得
    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// ログレベルを変更
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// ファイル出力を設定
    pub fn with_file_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// 標準エラー出力を無効化（テスト向け）
    pub fn without_stderr(mut self) -> Self {
        self.output_stderr = false;
        self
    }

    fn format(record: &Record) -> String {
        format!("{}: {} in {}", record.level(), record.args(), record.target())
    }

    fn write_line(&self, message: &str) {
        if self.output_stderr {
            eprintln!("{}", message);
        }

        if let Some(path) = &self.output_file {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", message);
            }
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.write_line(&Self::format(record));
        }
    }

    fn flush(&self) {}
}

/// グローバルロガーとして登録
pub fn init(logger: Logger) -> Result<(), SetLoggerError> {
    let level = logger.level();
    log::set_boxed_logger(Box::new(logger)).map(|()| log::set_max_level(level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn metadata(level: Level) -> Metadata<'static> {
        Metadata::builder().level(level).target("blockvim").build()
    }

    #[test]
    fn logger_respects_log_level() {
        let logger = Logger::for_development().without_stderr();
        assert!(logger.enabled(&metadata(Level::Debug)));
        assert!(logger.enabled(&metadata(Level::Error)));

        let info_logger = Logger::for_development()
            .with_level(LevelFilter::Info)
            .without_stderr();
        assert!(!info_logger.enabled(&metadata(Level::Debug)));
        assert!(info_logger.enabled(&metadata(Level::Warn)));
    }

    #[test]
    fn unknown_level_name_falls_back_to_info() {
        assert_eq!(Logger::from_level_name("warn").level(), LevelFilter::Warn);
        assert_eq!(Logger::from_level_name("loud").level(), LevelFilter::Info);
    }

    #[test]
    fn second_init_reports_error() {
        let quiet = || Logger::new(LevelFilter::Off).without_stderr();
        // 最初の登録は他のテストと競合しうるので結果を問わない
        let _ = init(quiet());
        assert!(init(quiet()).is_err());
    }

    #[test]
    fn file_output_appends_formatted_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blockvim.log");
        let logger = Logger::for_development()
            .without_stderr()
            .with_file_output(&path);

        logger.log(
            &Record::builder()
                .args(format_args!("clipboard write failed"))
                .level(Level::Warn)
                .target("blockvim::editor")
                .build(),
        );

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "WARN: clipboard write failed in blockvim::editor\n");
    }
}
