//! モーションの実行
//!
//! 行内の移動は `Motion::resolve_in_line` に任せ、行をまたぐ移動と
//! 垂直方向の `desired_column` の扱いをここで行う。

use crate::buffer::cursor::{char_len, is_multi_line, vertical_within, VerticalEntry};
use crate::buffer::navigation::{char_left, char_right, paragraph_backward, paragraph_forward, Motion};
use crate::host::{Host, ScrollRequest};
use crate::session::Session;
use log::debug;

impl<H: Host> Session<H> {
    /// カーソルを動かす（ビジュアルモードでは選択を伸縮する）
    pub(crate) fn apply_motion(&mut self, motion: Motion) {
        let line = self.cursor.active_line;
        let text = self.line_text(line);
        let offset = self.cursor.offset.min(char_len(&text));

        match motion {
            Motion::Left => match char_left(offset) {
                Some(target) => self.set_column(target),
                None if line > 0 => {
                    self.set_active_line(line - 1);
                    let end = char_len(&self.line_text(line - 1));
                    self.set_column(end);
                }
                None => debug!("already at document start"),
            },
            Motion::Right => match char_right(&text, offset) {
                Some(target) => self.set_column(target),
                None if line + 1 < self.registry.len() => {
                    self.set_active_line(line + 1);
                    self.set_column(0);
                }
                None => debug!("already at document end"),
            },
            Motion::Up => self.move_vertical(&text, offset, false),
            Motion::Down => self.move_vertical(&text, offset, true),
            Motion::ParagraphForward | Motion::ParagraphBackward => {
                let lines = self.line_texts();
                let target = if motion == Motion::ParagraphForward {
                    paragraph_forward(&lines, line)
                } else {
                    paragraph_backward(&lines, line)
                };
                let Some(target) = target else {
                    debug!("{:?}: no paragraph boundary", motion);
                    return;
                };
                let offset = if target.at_end {
                    char_len(&lines[target.line])
                } else {
                    0
                };
                self.set_active_line(target.line);
                self.set_column(offset);
                self.reveal_active_line();
            }
            Motion::DocumentTop => {
                self.host.scroll(ScrollRequest::Top);
                self.set_active_line(0);
                self.set_column(0);
            }
            Motion::DocumentBottom => {
                self.host.scroll(ScrollRequest::Bottom);
                // 末尾までスクロールすると遅延描画の行が増えることがある
                self.refresh();
                if let Some(last) = self.registry.last_index() {
                    self.set_active_line(last);
                    self.set_column(0);
                }
            }
            _ => match motion.resolve_in_line(&text, offset) {
                Some(target) => self.set_column(target),
                None => debug!("{:?}: no target in line", motion),
            },
        }
    }

    fn move_vertical(&mut self, text: &str, offset: usize, down: bool) {
        if is_multi_line(text) {
            if let Some(target) = vertical_within(text, offset, self.cursor.desired_column, down) {
                self.place_caret(target);
                return;
            }
        }

        let line = self.cursor.active_line;
        let target = if down {
            line + 1
        } else {
            match line.checked_sub(1) {
                Some(target) => target,
                None => {
                    debug!("already on the first line");
                    return;
                }
            }
        };
        if target >= self.registry.len() {
            debug!("already on the last line");
            return;
        }

        let entry = if down {
            VerticalEntry::Downward
        } else {
            VerticalEntry::Upward
        };
        self.move_to_line(target, entry);
        self.reveal_active_line();
    }
}
