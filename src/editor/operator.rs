//! オペレータ合成
//!
//! 保留中のオペレータ（yank / delete / change）とモーションまたは
//! テキストオブジェクトを組み合わせて編集計画を作り、ホストに適用する。
//! クリップボードへの書き込みは常に変更より先に行う。

use crate::buffer::cursor::{char_len, is_multi_line, sub_line_at, sub_lines, vertical_within, CursorState};
use crate::buffer::navigation::{
    self, char_left, char_right, find_char, is_boundary, FindKind, Motion,
};
use crate::buffer::text_object::{paragraph_object, LineSpan, ObjectScope, Span, TextObject};
use crate::editor::deletion::{DeletionBatch, FollowUp};
use crate::error::{log_error, BlockVimError};
use crate::host::{Host, RegionId};
use crate::input::mode::Mode;
use crate::session::{Session, VisualAnchor};
use log::debug;
use std::time::Instant;

/// オペレータの動詞
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Yank,
    Delete,
    Change,
}

impl Verb {
    pub fn from_key(ch: char) -> Option<Self> {
        match ch {
            'y' => Some(Verb::Yank),
            'd' => Some(Verb::Delete),
            'c' => Some(Verb::Change),
            _ => None,
        }
    }
}

/// 保留中オペレータが待っている対象の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    TextObjectInner,
    TextObjectAround,
    FindForward,
    FindBackward,
    TillForward,
    TillBackward,
    None,
}

impl From<FindKind> for TargetKind {
    fn from(kind: FindKind) -> Self {
        match kind {
            FindKind::Forward => TargetKind::FindForward,
            FindKind::Backward => TargetKind::FindBackward,
            FindKind::TillForward => TargetKind::TillForward,
            FindKind::TillBackward => TargetKind::TillBackward,
        }
    }
}

impl From<ObjectScope> for TargetKind {
    fn from(scope: ObjectScope) -> Self {
        match scope {
            ObjectScope::Inner => TargetKind::TextObjectInner,
            ObjectScope::Around => TargetKind::TextObjectAround,
        }
    }
}

/// 2段階コマンドの前半
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingOperator {
    pub verb: Verb,
    pub target: TargetKind,
}

/// オペレータの対象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorTarget {
    Motion(Motion),
    TextObject(ObjectScope, TextObject),
    /// `dd` / `yy` / `cc`
    Line,
}

/// 解決済みの範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// 行内の文字範囲
    Chars { line: usize, span: Span },
    /// 行全体
    Lines(LineSpan),
    /// 複数行リージョン内の連続したサブ行
    SubLines { line: usize, span: LineSpan },
    /// 行をまたぐ文字範囲。`end` のオフセットは含まない
    CrossLine {
        start: (usize, usize),
        end: (usize, usize),
    },
}

/// ホストへの適用計画
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditPlan {
    /// クリップボードへ書く内容（何も切り取らない場合は `None`）
    pub clipboard: Option<String>,
    /// （行, 新しいテキスト）
    pub replacements: Vec<(usize, String)>,
    /// （行, サブ行の範囲）
    pub sub_line_removal: Option<(usize, LineSpan)>,
    /// 削除バッチで取り除く行
    pub line_removal: Option<LineSpan>,
    /// 適用後のキャレット（行, オフセット）
    pub caret: Option<(usize, usize)>,
    pub enter_insert: bool,
}

impl EditPlan {
    pub fn mutates(&self) -> bool {
        !self.replacements.is_empty() || self.sub_line_removal.is_some() || self.line_removal.is_some()
    }
}

fn chars(line: usize, start: usize, end: usize) -> Option<Resolved> {
    Some(Resolved::Chars {
        line,
        span: Span::new(start, end),
    })
}

/// ノーマルモードの対象を範囲に解決する
pub fn resolve_target<S: AsRef<str>>(
    target: OperatorTarget,
    lines: &[S],
    cursor: &CursorState,
) -> Option<Resolved> {
    let active = cursor.active_line;
    let text = lines.get(active)?.as_ref();
    let offset = cursor.offset.min(char_len(text));
    let last = lines.len() - 1;

    match target {
        OperatorTarget::Line => {
            if is_multi_line(text) {
                let current = sub_line_at(text, offset).0;
                Some(Resolved::SubLines {
                    line: active,
                    span: LineSpan::new(current, current),
                })
            } else {
                Some(Resolved::Lines(LineSpan::new(active, active)))
            }
        }
        OperatorTarget::TextObject(scope, TextObject::Paragraph) => {
            paragraph_object(lines, active, scope).map(Resolved::Lines)
        }
        OperatorTarget::TextObject(scope, object) => object
            .resolve_in_line(text, offset, scope)
            .map(|span| Resolved::Chars { line: active, span }),
        OperatorTarget::Motion(motion) => match motion {
            Motion::Left => chars(active, char_left(offset)?, offset),
            Motion::Right => chars(active, offset, char_right(text, offset)?),
            Motion::Up | Motion::Down => {
                let down = motion == Motion::Down;
                if let Some(span) = sub_line_step(text, offset, cursor.desired_column, down) {
                    return Some(Resolved::SubLines { line: active, span });
                }
                if down {
                    (active < last).then(|| Resolved::Lines(LineSpan::new(active, active + 1)))
                } else {
                    Some(Resolved::Lines(LineSpan::new(active.checked_sub(1)?, active)))
                }
            }
            Motion::Find(kind, ch) => {
                let target = find_char(text, offset, ch, kind)?;
                if kind.is_forward() {
                    chars(active, offset, target + 1)
                } else {
                    chars(active, target, offset)
                }
            }
            Motion::WordForward(_) | Motion::LineEnd => {
                chars(active, offset, motion.resolve_in_line(text, offset)?)
            }
            Motion::WordBackward(_) | Motion::LineStart => {
                chars(active, motion.resolve_in_line(text, offset)?, offset)
            }
            Motion::ParagraphForward => {
                let target = navigation::paragraph_forward(lines, active)?;
                if target.line == active {
                    return None;
                }
                let include = target.line == last && !is_boundary(lines[last].as_ref());
                let end = if include { target.line } else { target.line - 1 };
                Some(Resolved::Lines(LineSpan::new(active, end)))
            }
            Motion::ParagraphBackward => {
                let target = navigation::paragraph_backward(lines, active)?;
                if target.line == active {
                    return None;
                }
                let start = if is_boundary(lines[target.line].as_ref()) {
                    target.line + 1
                } else {
                    target.line
                };
                Some(Resolved::Lines(LineSpan::new(start, active)))
            }
            Motion::DocumentTop => Some(Resolved::Lines(LineSpan::new(0, active))),
            Motion::DocumentBottom => Some(Resolved::Lines(LineSpan::new(active, last))),
        },
    }
}

/// `j`/`k` が複数行リージョン内にとどまる場合のサブ行範囲
fn sub_line_step(text: &str, offset: usize, desired_column: usize, down: bool) -> Option<LineSpan> {
    if !is_multi_line(text) {
        return None;
    }
    let target = vertical_within(text, offset, desired_column, down)?;
    let current = sub_line_at(text, offset).0;
    let next = sub_line_at(text, target).0;
    Some(LineSpan::new(current.min(next), current.max(next)))
}

/// ビジュアル選択を範囲に解決する（キャレット下の文字を含む）
pub fn resolve_visual<S: AsRef<str>>(
    anchor: VisualAnchor,
    caret: VisualAnchor,
    linewise: bool,
    lines: &[S],
) -> Option<Resolved> {
    let (start, end) = if (anchor.line, anchor.offset) <= (caret.line, caret.offset) {
        (anchor, caret)
    } else {
        (caret, anchor)
    };
    if end.line >= lines.len() {
        return None;
    }
    if linewise {
        return Some(Resolved::Lines(LineSpan::new(start.line, end.line)));
    }

    let end_len = char_len(lines[end.line].as_ref());
    let end_offset = (end.offset + 1).min(end_len);
    if start.line == end.line {
        return chars(start.line, start.offset.min(end_offset), end_offset);
    }
    Some(Resolved::CrossLine {
        start: (start.line, start.offset),
        end: (end.line, end_offset),
    })
}

fn head(text: &str, end: usize) -> String {
    text.chars().take(end).collect()
}

fn tail(text: &str, start: usize) -> String {
    text.chars().skip(start).collect()
}

/// 範囲と動詞から適用計画を作る（何もしない場合は `None`）
pub fn plan<S: AsRef<str>>(verb: Verb, resolved: Resolved, lines: &[S]) -> Option<EditPlan> {
    let editing = verb != Verb::Yank;
    let enter_insert = verb == Verb::Change;

    match resolved {
        Resolved::Chars { line, span } => {
            let text = lines.get(line)?.as_ref();
            if span.end > char_len(text) {
                return None;
            }
            if span.is_empty() {
                // 単語外の `ciw` は何も消さずに挿入へ
                if verb != Verb::Change {
                    return None;
                }
                return Some(EditPlan {
                    caret: Some((line, span.start)),
                    enter_insert: true,
                    ..EditPlan::default()
                });
            }
            let mut plan = EditPlan {
                clipboard: Some(span.slice(text)),
                ..EditPlan::default()
            };
            if editing {
                plan.replacements.push((line, span.remove_from(text)));
                plan.caret = Some((line, span.start));
                plan.enter_insert = enter_insert;
            }
            Some(plan)
        }
        Resolved::Lines(span) => {
            if span.first > span.last || span.last >= lines.len() {
                return None;
            }
            let mut plan = EditPlan {
                clipboard: Some(
                    lines[span.first..=span.last]
                        .iter()
                        .map(|line| line.as_ref())
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                ..EditPlan::default()
            };
            if !editing {
                return Some(plan);
            }

            let covers_all = span.first == 0 && span.last == lines.len() - 1;
            if verb == Verb::Change || covers_all {
                // 先頭行は空にして残す
                plan.replacements.push((span.first, String::new()));
                if span.last > span.first {
                    plan.line_removal = Some(LineSpan::new(span.first + 1, span.last));
                }
            } else {
                plan.line_removal = Some(span);
            }
            plan.caret = Some((span.first, 0));
            plan.enter_insert = enter_insert;
            Some(plan)
        }
        Resolved::SubLines { line, span } => {
            let text = lines.get(line)?.as_ref();
            let subs = sub_lines(text);
            if span.first > span.last || span.last >= subs.len() {
                return None;
            }
            if span.count() == subs.len() {
                // すべてのサブ行ならリージョンごと
                return plan(verb, Resolved::Lines(LineSpan::new(line, line)), lines);
            }
            let covered = Span::new(subs[span.first].start, subs[span.last].end());
            let mut plan = EditPlan {
                clipboard: Some(covered.slice(text)),
                ..EditPlan::default()
            };
            match verb {
                Verb::Yank => {}
                Verb::Delete => {
                    let mut parts: Vec<&str> = text.split('\n').collect();
                    parts.drain(span.first..=span.last);
                    let remaining = parts.join("\n");
                    let landing = span.first.min(parts.len().saturating_sub(1));
                    let offset = sub_lines(&remaining).get(landing).map_or(0, |sub| sub.start);
                    plan.sub_line_removal = Some((line, span));
                    plan.caret = Some((line, offset));
                }
                Verb::Change => {
                    plan.replacements.push((line, covered.remove_from(text)));
                    plan.caret = Some((line, covered.start));
                    plan.enter_insert = true;
                }
            }
            Some(plan)
        }
        Resolved::CrossLine { start, end } => {
            let (first, first_offset) = start;
            let (last, last_offset) = end;
            if first >= last || last >= lines.len() {
                return None;
            }
            let first_text = lines[first].as_ref();
            let last_text = lines[last].as_ref();

            let mut parts = vec![tail(first_text, first_offset)];
            parts.extend(lines[first + 1..last].iter().map(|line| line.as_ref().to_string()));
            parts.push(head(last_text, last_offset));

            let mut plan = EditPlan {
                clipboard: Some(parts.join("\n")),
                ..EditPlan::default()
            };
            if editing {
                // 先頭行に残りを結合し、以降の行を消す
                let joined = head(first_text, first_offset) + &tail(last_text, last_offset);
                plan.replacements.push((first, joined));
                plan.line_removal = Some(LineSpan::new(first + 1, last));
                plan.caret = Some((first, first_offset));
                plan.enter_insert = enter_insert;
            }
            Some(plan)
        }
    }
}

impl<H: Host> Session<H> {
    /// ノーマルモードのオペレータを適用する
    pub(crate) fn apply_operator(&mut self, verb: Verb, target: OperatorTarget) {
        let lines = self.line_texts();
        match resolve_target(target, &lines, &self.cursor) {
            Some(resolved) => self.apply_resolved(verb, resolved, &lines),
            None => debug!("{:?} {:?}: no target", verb, target),
        }
    }

    /// ビジュアル選択にオペレータを適用してノーマルモードへ戻る
    pub(crate) fn apply_visual(&mut self, verb: Verb) {
        let Some(anchor) = self.visual_anchor.take() else {
            return;
        };
        let linewise = self.mode == Mode::VisualLine;
        let caret = VisualAnchor {
            line: self.cursor.active_line,
            offset: self.cursor.offset,
        };
        let start = if (anchor.line, anchor.offset) <= (caret.line, caret.offset) {
            anchor
        } else {
            caret
        };
        self.set_mode(Mode::Normal);

        let lines = self.line_texts();
        let Some(resolved) = resolve_visual(anchor, caret, linewise, &lines) else {
            debug!("{:?} on empty selection", verb);
            return;
        };
        self.apply_resolved(verb, resolved, &lines);
        if verb == Verb::Yank {
            self.set_active_line(start.line);
            self.set_column(if linewise { 0 } else { start.offset });
        }
    }

    fn apply_resolved(&mut self, verb: Verb, resolved: Resolved, lines: &[String]) {
        match plan(verb, resolved, lines) {
            Some(plan) => {
                debug!("{:?} {:?}", verb, resolved);
                self.execute_plan(plan);
            }
            None => debug!("{:?} {:?}: nothing to do", verb, resolved),
        }
    }

    fn execute_plan(&mut self, plan: EditPlan) {
        if let Some(text) = &plan.clipboard {
            self.write_clipboard(text);
        }
        if !plan.mutates() && !plan.enter_insert {
            return;
        }

        for (line, text) in &plan.replacements {
            let Some(region) = self.registry.region(*line) else {
                continue;
            };
            if let Err(err) = self.host.replace_text(region, text) {
                log_error(&BlockVimError::from(err), "replace text");
                return;
            }
        }

        if let Some((line, span)) = plan.sub_line_removal {
            if let Some(region) = self.registry.region(line) {
                // 後ろから消せば手前のインデックスはずれない
                for sub_line in (span.first..=span.last).rev() {
                    if let Err(err) = self.host.delete_sub_line(region, sub_line) {
                        log_error(&BlockVimError::from(err), "delete sub-line");
                        return;
                    }
                }
            }
        }

        let mode = if plan.enter_insert { Mode::Insert } else { Mode::Normal };
        let (line, offset) = plan
            .caret
            .unwrap_or((self.cursor.active_line, self.cursor.offset));

        match plan.line_removal {
            Some(span) => self.issue_deletion(span, mode, line, offset),
            None => {
                self.set_active_line(line);
                self.set_column(offset);
                self.set_mode(mode);
            }
        }
    }

    /// 行削除を発行し、完了まで挿入モードに固定する
    fn issue_deletion(&mut self, span: LineSpan, mode: Mode, line: usize, offset: usize) {
        let targets: Vec<RegionId> = (span.first..=span.last)
            .filter_map(|index| self.registry.region(index))
            .collect();
        let Some(first) = targets.first().copied() else {
            return;
        };

        let anchor = if (span.first..=span.last).contains(&line) {
            self.registry
                .region(span.last + 1)
                .or_else(|| span.first.checked_sub(1).and_then(|index| self.registry.region(index)))
        } else {
            self.registry.region(line)
        };
        let follow_up = FollowUp {
            mode,
            anchor,
            line,
            offset,
        };

        let issued = if targets.len() == 1 {
            self.host.delete_region(first, self.config.single_delete_delay())
        } else {
            self.host.delete_region_range(first, targets.len())
        };
        if let Err(err) = issued {
            log_error(&BlockVimError::from(err), "delete lines");
            self.finish_deletion(follow_up);
            return;
        }

        debug!("deletion batch issued for {} line(s)", targets.len());
        self.deletion = Some(DeletionBatch::new(
            targets,
            follow_up,
            Instant::now(),
            self.config.deletion_poll_interval(),
            self.config.deletion_timeout(),
        ));
        self.set_mode(Mode::Insert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::navigation::WordKind;
    use crate::buffer::text_object::QuoteClass;

    fn cursor(line: usize, offset: usize) -> CursorState {
        CursorState::at(line, offset)
    }

    #[test]
    fn find_spans_follow_inclusivity() {
        let lines = ["a,b,c"];
        let forward = resolve_target(
            OperatorTarget::Motion(Motion::Find(FindKind::Forward, ',')),
            &lines,
            &cursor(0, 0),
        );
        assert_eq!(forward, chars(0, 0, 2));

        let till = resolve_target(
            OperatorTarget::Motion(Motion::Find(FindKind::TillForward, 'c')),
            &lines,
            &cursor(0, 0),
        );
        assert_eq!(till, chars(0, 0, 4));

        let backward = resolve_target(
            OperatorTarget::Motion(Motion::Find(FindKind::Backward, 'a')),
            &lines,
            &cursor(0, 4),
        );
        assert_eq!(backward, chars(0, 0, 4));
    }

    #[test]
    fn word_and_line_end_motions() {
        let lines = ["foo bar"];
        assert_eq!(
            resolve_target(OperatorTarget::Motion(Motion::WordForward(WordKind::Word)), &lines, &cursor(0, 0)),
            chars(0, 0, 4)
        );
        assert_eq!(
            resolve_target(OperatorTarget::Motion(Motion::LineEnd), &lines, &cursor(0, 4)),
            chars(0, 4, 7)
        );
        assert_eq!(
            resolve_target(OperatorTarget::Motion(Motion::Right), &lines, &cursor(0, 7)),
            None
        );
    }

    #[test]
    fn paragraph_motion_spans() {
        let lines = ["a", "b", "", "c", "d"];
        assert_eq!(
            resolve_target(OperatorTarget::Motion(Motion::ParagraphForward), &lines, &cursor(0, 0)),
            Some(Resolved::Lines(LineSpan::new(0, 1)))
        );
        // 最終行が区切りでなければ含める
        assert_eq!(
            resolve_target(OperatorTarget::Motion(Motion::ParagraphForward), &lines, &cursor(3, 0)),
            Some(Resolved::Lines(LineSpan::new(3, 4)))
        );
        assert_eq!(
            resolve_target(OperatorTarget::Motion(Motion::ParagraphBackward), &lines, &cursor(4, 0)),
            Some(Resolved::Lines(LineSpan::new(3, 4)))
        );
        assert_eq!(
            resolve_target(OperatorTarget::Motion(Motion::ParagraphBackward), &lines, &cursor(1, 0)),
            Some(Resolved::Lines(LineSpan::new(0, 1)))
        );
    }

    #[test]
    fn line_target_on_multi_line_region_is_sub_line() {
        let lines = ["one\ntwo\nthree"];
        assert_eq!(
            resolve_target(OperatorTarget::Line, &lines, &cursor(0, 5)),
            Some(Resolved::SubLines { line: 0, span: LineSpan::new(1, 1) })
        );
    }

    #[test]
    fn vertical_motion_stays_inside_multi_line_region() {
        let lines = ["one\ntwo\nthree", "keep"];
        assert_eq!(
            resolve_target(OperatorTarget::Motion(Motion::Down), &lines, &cursor(0, 0)),
            Some(Resolved::SubLines { line: 0, span: LineSpan::new(0, 1) })
        );
        assert_eq!(
            resolve_target(OperatorTarget::Motion(Motion::Up), &lines, &cursor(0, 9)),
            Some(Resolved::SubLines { line: 0, span: LineSpan::new(1, 2) })
        );
        // 最後のサブ行からは次のリージョンまで
        assert_eq!(
            resolve_target(OperatorTarget::Motion(Motion::Down), &lines, &cursor(0, 9)),
            Some(Resolved::Lines(LineSpan::new(0, 1)))
        );
    }

    #[test]
    fn plan_sub_line_range_deletion() {
        let lines = ["one\ntwo\nthree", "keep"];
        let resolved = Resolved::SubLines { line: 0, span: LineSpan::new(0, 1) };
        let delete = plan(Verb::Delete, resolved, &lines).unwrap();
        assert_eq!(delete.clipboard.as_deref(), Some("one\ntwo"));
        assert_eq!(delete.sub_line_removal, Some((0, LineSpan::new(0, 1))));
        assert_eq!(delete.caret, Some((0, 0)));
        assert_eq!(delete.line_removal, None);

        let whole = plan(Verb::Delete, Resolved::SubLines { line: 0, span: LineSpan::new(0, 2) }, &lines).unwrap();
        assert_eq!(whole.line_removal, Some(LineSpan::new(0, 0)));
    }

    #[test]
    fn plan_delete_chars() {
        let lines = ["hello (world) foo"];
        let resolved = resolve_target(
            OperatorTarget::TextObject(ObjectScope::Inner, TextObject::Bracket { open: '(', close: ')' }),
            &lines,
            &cursor(0, 8),
        )
        .unwrap();
        let plan = plan(Verb::Delete, resolved, &lines).unwrap();
        assert_eq!(plan.clipboard.as_deref(), Some("world"));
        assert_eq!(plan.replacements, vec![(0, "hello () foo".to_string())]);
        assert_eq!(plan.caret, Some((0, 7)));
        assert!(!plan.enter_insert);
    }

    #[test]
    fn plan_yank_does_not_mutate() {
        let lines = [r#"say "hi" and "bye""#];
        let resolved = resolve_target(
            OperatorTarget::TextObject(ObjectScope::Inner, TextObject::Quote(QuoteClass::Double)),
            &lines,
            &cursor(0, 6),
        )
        .unwrap();
        let plan = plan(Verb::Yank, resolved, &lines).unwrap();
        assert_eq!(plan.clipboard.as_deref(), Some("hi"));
        assert!(!plan.mutates());
        assert_eq!(plan.caret, None);
    }

    #[test]
    fn plan_empty_span_is_nothing() {
        let lines = ["a  b"];
        let resolved = Resolved::Chars { line: 0, span: Span::empty(1) };
        assert_eq!(plan(Verb::Delete, resolved, &lines), None);
        assert_eq!(plan(Verb::Yank, resolved, &lines), None);
    }

    #[test]
    fn change_on_empty_span_only_enters_insert() {
        let lines = ["a  b"];
        let resolved = Resolved::Chars { line: 0, span: Span::empty(2) };
        let change = plan(Verb::Change, resolved, &lines).unwrap();
        assert!(!change.mutates());
        assert!(change.enter_insert);
        assert_eq!(change.caret, Some((0, 2)));
    }

    #[test]
    fn plan_line_deletion_and_change() {
        let lines = ["a", "b", "c", "d"];
        let delete = plan(Verb::Delete, Resolved::Lines(LineSpan::new(1, 2)), &lines).unwrap();
        assert_eq!(delete.clipboard.as_deref(), Some("b\nc"));
        assert_eq!(delete.line_removal, Some(LineSpan::new(1, 2)));
        assert!(delete.replacements.is_empty());

        let change = plan(Verb::Change, Resolved::Lines(LineSpan::new(1, 2)), &lines).unwrap();
        assert_eq!(change.replacements, vec![(1, String::new())]);
        assert_eq!(change.line_removal, Some(LineSpan::new(2, 2)));
        assert!(change.enter_insert);
    }

    #[test]
    fn deleting_every_line_keeps_one_empty() {
        let lines = ["a", "b"];
        let delete = plan(Verb::Delete, Resolved::Lines(LineSpan::new(0, 1)), &lines).unwrap();
        assert_eq!(delete.replacements, vec![(0, String::new())]);
        assert_eq!(delete.line_removal, Some(LineSpan::new(1, 1)));
    }

    #[test]
    fn plan_sub_line_operations() {
        let lines = ["one\ntwo\nthree"];
        let resolved = Resolved::SubLines { line: 0, span: LineSpan::new(2, 2) };
        let delete = plan(Verb::Delete, resolved, &lines).unwrap();
        assert_eq!(delete.clipboard.as_deref(), Some("three"));
        assert_eq!(delete.sub_line_removal, Some((0, LineSpan::new(2, 2))));
        // 最後のサブ行を消すと1つ上のサブ行の先頭へ
        assert_eq!(delete.caret, Some((0, 4)));

        let change = plan(Verb::Change, Resolved::SubLines { line: 0, span: LineSpan::new(1, 1) }, &lines).unwrap();
        assert_eq!(change.replacements, vec![(0, "one\n\nthree".to_string())]);
        assert_eq!(change.caret, Some((0, 4)));
    }

    #[test]
    fn visual_cross_line() {
        let lines = ["hello", "middle", "world"];
        let anchor = VisualAnchor { line: 2, offset: 2 };
        let caret = VisualAnchor { line: 0, offset: 3 };
        let resolved = resolve_visual(anchor, caret, false, &lines).unwrap();
        assert_eq!(resolved, Resolved::CrossLine { start: (0, 3), end: (2, 3) });

        let plan = plan(Verb::Delete, resolved, &lines).unwrap();
        assert_eq!(plan.clipboard.as_deref(), Some("lo\nmiddle\nwor"));
        assert_eq!(plan.replacements, vec![(0, "helld".to_string())]);
        assert_eq!(plan.line_removal, Some(LineSpan::new(1, 2)));
        assert_eq!(plan.caret, Some((0, 3)));
    }

    #[test]
    fn visual_same_line_includes_caret_char() {
        let lines = ["abcdef"];
        let resolved = resolve_visual(
            VisualAnchor { line: 0, offset: 1 },
            VisualAnchor { line: 0, offset: 3 },
            false,
            &lines,
        );
        assert_eq!(resolved, chars(0, 1, 4));
        let linewise = resolve_visual(
            VisualAnchor { line: 0, offset: 1 },
            VisualAnchor { line: 0, offset: 3 },
            true,
            &lines,
        );
        assert_eq!(linewise, Some(Resolved::Lines(LineSpan::new(0, 0))));
    }
}
