//! UIモジュール
//!
//! スクロールとキャレットオーバーレイの位置計算

pub mod caret;
pub mod viewport;

// 公開API
pub use caret::overlay_rect;
pub use viewport::{follow_scroll, ScrollAmount};
