//! モード状態機械
//!
//! モードごとのキー処理をハンドラに分け、セッションが現在のモードで振り分ける。
//! 戻り値はキーを消費した（ホストに渡さない）かどうか。

use crate::host::Host;
use crate::input::keybinding::{Key, KeyCode, KeyProcessResult};
use crate::session::Session;
use log::debug;

/// 編集モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    Visual,
    VisualLine,
    LinkHint,
}

impl Mode {
    pub fn is_visual(self) -> bool {
        matches!(self, Mode::Visual | Mode::VisualLine)
    }

    /// 表示用の名前
    pub fn label(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Visual => "VISUAL",
            Mode::VisualLine => "VISUAL LINE",
            Mode::LinkHint => "HINT",
        }
    }
}

/// モード別のキー処理
pub trait ModeHandler<H: Host> {
    fn handle(&self, session: &mut Session<H>, key: &Key) -> bool;
}

/// 未割り当てのキーも文書を書き換えるものは握りつぶす
fn swallow_unbound(key: &Key) -> bool {
    key.is_insertable_char()
        || (!key.modifiers.ctrl
            && !key.modifiers.alt
            && matches!(
                key.code,
                KeyCode::Enter | KeyCode::Tab | KeyCode::Delete | KeyCode::Backspace
            ))
}

pub struct NormalMode;

impl<H: Host> ModeHandler<H> for NormalMode {
    fn handle(&self, session: &mut Session<H>, key: &Key) -> bool {
        session.sync_from_host();
        match session.normal_keys.process_key(key) {
            KeyProcessResult::Action(action) => {
                session.execute(action);
                true
            }
            KeyProcessResult::PartialMatch => true,
            KeyProcessResult::NoMatch => {
                debug!("unbound key in normal mode: {:?}", key.code);
                swallow_unbound(key)
            }
        }
    }
}

/// 挿入モードは Esc 以外をホストに任せる
pub struct InsertMode;

impl<H: Host> ModeHandler<H> for InsertMode {
    fn handle(&self, session: &mut Session<H>, key: &Key) -> bool {
        if !key.is_esc() {
            return false;
        }
        session.leave_insert();
        true
    }
}

pub struct VisualMode;

impl<H: Host> ModeHandler<H> for VisualMode {
    fn handle(&self, session: &mut Session<H>, key: &Key) -> bool {
        session.sync_from_host();
        match session.visual_keys.process_key(key) {
            KeyProcessResult::Action(action) => {
                session.execute(action);
                true
            }
            KeyProcessResult::PartialMatch => true,
            KeyProcessResult::NoMatch => swallow_unbound(key),
        }
    }
}

/// リンクヒントモードはすべてのキーを消費する
pub struct LinkHintMode;

impl<H: Host> ModeHandler<H> for LinkHintMode {
    fn handle(&self, session: &mut Session<H>, key: &Key) -> bool {
        session.link_hint_key(key);
        true
    }
}
