//! アクションの実行
//!
//! キーマップが確定させた `Action` をセッションの操作に振り分ける。

use crate::buffer::cursor::char_len;
use crate::host::Host;
use crate::input::keybinding::{Action, InsertPosition};
use crate::input::mode::Mode;
use crate::session::{Session, VisualAnchor};
use log::debug;

impl<H: Host> Session<H> {
    pub(crate) fn execute(&mut self, action: Action) {
        debug!("{:?} in {}", action, self.mode.label());
        match action {
            Action::Move(motion) => self.apply_motion(motion),
            Action::Operate(verb, target) => self.apply_operator(verb, target),
            Action::EnterInsert(position) => self.enter_insert(position),
            Action::EnterVisual => self.toggle_visual(Mode::Visual),
            Action::EnterVisualLine => self.toggle_visual(Mode::VisualLine),
            Action::Scroll(amount) => {
                let request = amount.request(self.config.scroll_fraction);
                self.host.scroll(request);
                self.on_scroll();
            }
            Action::EnterLinkHint => self.enter_link_hint(),
            Action::Cancel => {}
            Action::VisualOperate(verb) => self.apply_visual(verb),
            Action::SwapAnchor => self.swap_anchor(),
            Action::ExitVisual => self.set_mode(Mode::Normal),
        }
    }

    fn enter_insert(&mut self, position: InsertPosition) {
        let len = char_len(&self.line_text(self.cursor.active_line));
        let offset = self.cursor.offset.min(len);
        let target = match position {
            InsertPosition::AtCaret => offset,
            InsertPosition::AfterCaret => (offset + 1).min(len),
            InsertPosition::LineStart => 0,
            InsertPosition::LineEnd => len,
        };
        self.set_column(target);
        self.set_mode(Mode::Insert);
    }

    /// Esc で挿入モードを抜ける。キャレットは1文字左へ戻る
    pub(crate) fn leave_insert(&mut self) {
        self.sync_from_host();
        self.set_mode(Mode::Normal);
        let text = self.line_text(self.cursor.active_line);
        let offset = self.cursor.offset;
        let previous = offset
            .checked_sub(1)
            .filter(|&prev| text.chars().nth(prev) != Some('\n'));
        self.set_column(previous.unwrap_or(offset));
    }

    /// 同じビジュアルモードなら抜け、別のビジュアルモードなら切り替える
    fn toggle_visual(&mut self, target: Mode) {
        if self.mode == target {
            self.set_mode(Mode::Normal);
            return;
        }
        let anchor = self.visual_anchor.unwrap_or(VisualAnchor {
            line: self.cursor.active_line,
            offset: self.cursor.offset,
        });
        self.set_mode(target);
        self.visual_anchor = Some(anchor);
    }

    /// 選択の両端を入れ替える
    fn swap_anchor(&mut self) {
        let Some(anchor) = self.visual_anchor else {
            return;
        };
        self.visual_anchor = Some(VisualAnchor {
            line: self.cursor.active_line,
            offset: self.cursor.offset,
        });
        self.set_active_line(anchor.line);
        self.set_column(anchor.offset);
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::host::MemoryHost;
    use crate::input::keybinding::{Action, InsertPosition};
    use crate::input::mode::Mode;
    use crate::session::{Selection, Session, VisualAnchor};

    fn session(lines: &[&str]) -> Session<MemoryHost> {
        Session::attach(MemoryHost::from_lines(lines), Config::default())
    }

    #[test]
    fn insert_positions() {
        let mut session = session(&["hello"]);
        session.set_column(2);
        session.execute(Action::EnterInsert(InsertPosition::AfterCaret));
        assert_eq!(session.mode(), Mode::Insert);
        assert_eq!(session.cursor().offset, 3);

        session.leave_insert();
        assert_eq!(session.mode(), Mode::Normal);
        assert_eq!(session.cursor().offset, 2);

        session.execute(Action::EnterInsert(InsertPosition::LineEnd));
        assert_eq!(session.cursor().offset, 5);
        session.leave_insert();
        session.execute(Action::EnterInsert(InsertPosition::LineStart));
        assert_eq!(session.cursor().offset, 0);
        session.leave_insert();
        assert_eq!(session.cursor().offset, 0);
    }

    #[test]
    fn visual_toggles_and_switches() {
        let mut session = session(&["abc", "def"]);
        session.execute(Action::EnterVisual);
        assert_eq!(session.mode(), Mode::Visual);
        session.execute(Action::EnterVisualLine);
        assert_eq!(session.mode(), Mode::VisualLine);
        assert!(session.visual_selection().is_some());
        session.execute(Action::EnterVisualLine);
        assert_eq!(session.mode(), Mode::Normal);
        assert_eq!(session.visual_selection(), None);
    }

    #[test]
    fn swap_anchor_moves_caret_to_other_end() {
        let mut session = session(&["abcdef"]);
        session.set_column(1);
        session.execute(Action::EnterVisual);
        session.set_column(4);
        session.execute(Action::SwapAnchor);
        assert_eq!(session.cursor().offset, 1);
        assert_eq!(
            session.visual_selection(),
            Some(Selection::Chars {
                start: VisualAnchor { line: 0, offset: 1 },
                end: VisualAnchor { line: 0, offset: 4 },
            })
        );
    }
}
