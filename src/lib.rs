//! blockvim - ブロック型リッチエディタ向けの Vim 風モーダル編集
//!
//! ホストとなるエディタは `host::Host` トレイトを通じて操作する。
//! 状態はすべて `Session` が所有する。

// コアモジュール
pub mod config;
pub mod error;
pub mod logging;

// ホスト境界
pub mod host;

// データ層
pub mod buffer;

// 編集層
pub mod editor;

// ロジック層
pub mod hint;
pub mod input;
pub mod session;

// 表示層
pub mod ui;

// 公開API
pub use config::Config;
pub use error::{BlockVimError, Result};
pub use host::{Host, MemoryHost};
pub use input::{parse_keys, Key, Mode};
pub use session::{Selection, Session, VisualAnchor};
