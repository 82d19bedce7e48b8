//! 入力処理モジュール
//!
//! キーバインド、モード別のキー処理、アクションの実行を提供

pub mod commands;
pub mod keybinding;
pub mod mode;

// 公開API
pub use keybinding::{parse_keys, Action, InsertPosition, Key, KeyCode, KeyModifiers, KeyParseError, KeyProcessResult};
pub use mode::{Mode, ModeHandler};
