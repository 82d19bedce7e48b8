//! モーションエンジン
//!
//! `(テキスト, オフセット)` から新しい位置を求める純粋関数群。
//! 行をまたぐ移動（h/l の折り返し、j/k、段落、先頭/末尾）は
//! セッション側がレジストリと組み合わせて解決する。

use crate::buffer::cursor::char_len;

/// 単語構成文字（英数字とアンダースコア）
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// 単語の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordKind {
    /// 英数字とアンダースコアの連なり
    Word,
    /// 空白以外の連なり（WORD）
    BigWord,
}

impl WordKind {
    pub fn is_member(self, ch: char) -> bool {
        match self {
            WordKind::Word => is_word_char(ch),
            WordKind::BigWord => !ch.is_whitespace(),
        }
    }
}

/// 文字検索の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindKind {
    /// `f`: 次の出現位置
    Forward,
    /// `F`: 前の出現位置
    Backward,
    /// `t`: 次の出現位置の1つ手前
    TillForward,
    /// `T`: 前の出現位置の1つ後
    TillBackward,
}

impl FindKind {
    pub fn is_forward(self) -> bool {
        matches!(self, FindKind::Forward | FindKind::TillForward)
    }
}

/// モーション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    WordForward(WordKind),
    WordBackward(WordKind),
    Find(FindKind, char),
    LineStart,
    LineEnd,
    ParagraphForward,
    ParagraphBackward,
    DocumentTop,
    DocumentBottom,
}

impl Motion {
    /// 行内で完結するモーションの移動先（移動できなければ `None`）
    pub fn resolve_in_line(self, text: &str, offset: usize) -> Option<usize> {
        match self {
            Motion::WordForward(kind) => word_forward(text, offset, kind),
            Motion::WordBackward(kind) => word_backward(text, offset, kind),
            Motion::Find(kind, target) => find_char(text, offset, target, kind),
            Motion::LineStart => Some(line_start()),
            Motion::LineEnd => Some(line_end(text)),
            _ => None,
        }
    }
}

/// 1文字左（行頭では `None`）
pub fn char_left(offset: usize) -> Option<usize> {
    offset.checked_sub(1)
}

/// 1文字右（行末では `None`）
pub fn char_right(text: &str, offset: usize) -> Option<usize> {
    (offset < char_len(text)).then_some(offset + 1)
}

/// 次の単語の先頭
///
/// 現在の単語の残りを飛ばし、続く区切り文字を飛ばす。次の単語が無ければ行末。
pub fn word_forward(text: &str, offset: usize, kind: WordKind) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    if offset >= chars.len() {
        return None;
    }
    let mut index = offset;
    while index < chars.len() && kind.is_member(chars[index]) {
        index += 1;
    }
    while index < chars.len() && !kind.is_member(chars[index]) {
        index += 1;
    }
    (index != offset).then_some(index)
}

/// 前の単語の先頭
pub fn word_backward(text: &str, offset: usize, kind: WordKind) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut index = offset.min(chars.len());
    if index == 0 {
        return None;
    }
    while index > 0 && !kind.is_member(chars[index - 1]) {
        index -= 1;
    }
    while index > 0 && kind.is_member(chars[index - 1]) {
        index -= 1;
    }
    (index != offset).then_some(index)
}

/// 文字検索（f/F/t/T）
pub fn find_char(text: &str, offset: usize, target: char, kind: FindKind) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    match kind {
        FindKind::Forward | FindKind::TillForward => {
            let found = (offset + 1..chars.len()).find(|index| chars[*index] == target)?;
            Some(if kind == FindKind::Forward { found } else { found - 1 })
        }
        FindKind::Backward | FindKind::TillBackward => {
            let found = (0..offset.min(chars.len()))
                .rev()
                .find(|index| chars[*index] == target)?;
            Some(if kind == FindKind::Backward { found } else { found + 1 })
        }
    }
}

pub fn line_start() -> usize {
    0
}

pub fn line_end(text: &str) -> usize {
    char_len(text)
}

/// 段落の境界行（空白を除くと空）
pub fn is_boundary(text: &str) -> bool {
    text.trim().is_empty()
}

/// 段落移動の着地点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphTarget {
    pub line: usize,
    /// 行末に置くか（前方移動で最終行に着いたとき）
    pub at_end: bool,
}

/// `}`: 次の段落区切りへ
pub fn paragraph_forward<S: AsRef<str>>(lines: &[S], active: usize) -> Option<ParagraphTarget> {
    let last = lines.len().checked_sub(1)?;
    let boundary = |index: usize| is_boundary(lines[index].as_ref());
    let mut index = active.min(last);

    while index < last && boundary(index) {
        index += 1;
    }
    while index < last && !boundary(index + 1) {
        index += 1;
    }
    if index < last && boundary(index + 1) {
        index += 1;
    }

    Some(ParagraphTarget {
        line: index,
        at_end: index == last,
    })
}

/// `{`: 前の段落区切りへ
pub fn paragraph_backward<S: AsRef<str>>(lines: &[S], active: usize) -> Option<ParagraphTarget> {
    let last = lines.len().checked_sub(1)?;
    let boundary = |index: usize| is_boundary(lines[index].as_ref());
    let mut index = active.min(last);

    while index > 0 && boundary(index) {
        index -= 1;
    }
    while index > 0 && !boundary(index - 1) {
        index -= 1;
    }
    if index > 0 && boundary(index - 1) {
        index -= 1;
    }

    Some(ParagraphTarget {
        line: index,
        at_end: false,
    })
}
