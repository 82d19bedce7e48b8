//! 行モデル
//!
//! 行レジストリ、カーソル位置、モーション、テキストオブジェクトを提供

pub mod cursor;
pub mod navigation;
pub mod registry;
pub mod text_object;

// 公開API
pub use cursor::CursorState;
pub use navigation::{FindKind, Motion, WordKind};
pub use registry::{LineEntry, LineRegistry};
pub use text_object::{LineSpan, ObjectScope, QuoteClass, Span, TextObject};
