//! テキストオブジェクト
//!
//! `(テキスト, オフセット)` から `[start, end)` の範囲を求める。
//! 見つからない場合は `None` を返し、呼び出し側は何もしない。

use crate::buffer::navigation::{is_boundary, WordKind};

/// 行内の文字範囲 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 範囲の文字列を取り出す
    pub fn slice(&self, text: &str) -> String {
        text.chars().skip(self.start).take(self.len()).collect()
    }

    /// 範囲を取り除いたテキスト
    pub fn remove_from(&self, text: &str) -> String {
        text.chars()
            .enumerate()
            .filter(|(index, _)| *index < self.start || *index >= self.end)
            .map(|(_, ch)| ch)
            .collect()
    }
}

/// 行範囲（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub first: usize,
    pub last: usize,
}

impl LineSpan {
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    pub fn count(&self) -> usize {
        self.last - self.first + 1
    }
}

/// inner / around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectScope {
    Inner,
    Around,
}

/// 引用符の種類（タイポグラフィ用の変種も同じクラスに含める）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteClass {
    Double,
    Single,
    Backtick,
}

impl QuoteClass {
    pub fn contains(self, ch: char) -> bool {
        match self {
            QuoteClass::Double => matches!(ch, '"' | '\u{201C}' | '\u{201D}'),
            QuoteClass::Single => matches!(ch, '\'' | '\u{2018}' | '\u{2019}'),
            QuoteClass::Backtick => ch == '`',
        }
    }
}

/// テキストオブジェクトの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextObject {
    Word(WordKind),
    Bracket { open: char, close: char },
    Quote(QuoteClass),
    Paragraph,
}

impl TextObject {
    /// `i`/`a` に続くキーから
    pub fn from_key(ch: char) -> Option<Self> {
        let object = match ch {
            'w' => TextObject::Word(WordKind::Word),
            'W' => TextObject::Word(WordKind::BigWord),
            'p' => TextObject::Paragraph,
            '(' | ')' | 'b' => TextObject::Bracket { open: '(', close: ')' },
            '[' | ']' => TextObject::Bracket { open: '[', close: ']' },
            '{' | '}' | 'B' => TextObject::Bracket { open: '{', close: '}' },
            '<' | '>' => TextObject::Bracket { open: '<', close: '>' },
            '"' => TextObject::Quote(QuoteClass::Double),
            '\'' => TextObject::Quote(QuoteClass::Single),
            '`' => TextObject::Quote(QuoteClass::Backtick),
            _ => return None,
        };
        Some(object)
    }

    /// 行内で完結するオブジェクトの範囲（段落は `None`）
    pub fn resolve_in_line(self, text: &str, offset: usize, scope: ObjectScope) -> Option<Span> {
        match self {
            TextObject::Word(kind) => Some(word_object(text, offset, kind, scope)),
            TextObject::Bracket { open, close } => bracket_object(text, offset, open, close, scope),
            TextObject::Quote(class) => quote_object(text, offset, class, scope),
            TextObject::Paragraph => None,
        }
    }
}

fn is_blank(ch: char) -> bool {
    ch.is_whitespace() && ch != '\n'
}

/// 単語オブジェクト
///
/// オフセットが単語上に無ければ空の範囲。around は後続の空白を含め、
/// 後続の空白が無い場合に限り先行する空白を含める。
pub fn word_object(text: &str, offset: usize, kind: WordKind, scope: ObjectScope) -> Span {
    let chars: Vec<char> = text.chars().collect();
    if offset >= chars.len() || !kind.is_member(chars[offset]) {
        return Span::empty(offset);
    }

    let mut start = offset;
    while start > 0 && kind.is_member(chars[start - 1]) {
        start -= 1;
    }
    let mut end = offset + 1;
    while end < chars.len() && kind.is_member(chars[end]) {
        end += 1;
    }

    if scope == ObjectScope::Inner {
        return Span::new(start, end);
    }

    let mut trailing = end;
    while trailing < chars.len() && is_blank(chars[trailing]) {
        trailing += 1;
    }
    if trailing > end {
        return Span::new(start, trailing);
    }

    let mut leading = start;
    while leading > 0 && is_blank(chars[leading - 1]) {
        leading -= 1;
    }
    Span::new(leading, end)
}

/// 括弧オブジェクト
pub fn bracket_object(text: &str, offset: usize, open: char, close: char, scope: ObjectScope) -> Option<Span> {
    let chars: Vec<char> = text.chars().collect();
    let opener = find_opener(&chars, offset, open, close)?;

    let mut depth = 0usize;
    let mut closer = None;
    for (index, ch) in chars.iter().enumerate().skip(opener + 1) {
        if *ch == open {
            depth += 1;
        } else if *ch == close {
            if depth == 0 {
                closer = Some(index);
                break;
            }
            depth -= 1;
        }
    }
    let closer = closer?;

    Some(match scope {
        ObjectScope::Inner => Span::new(opener + 1, closer),
        ObjectScope::Around => Span::new(opener, closer + 1),
    })
}

/// 対応の取れていない開き括弧を探す
///
/// 後方（オフセット上の文字を含む）で見つからなければ前方の最初の開き括弧。
fn find_opener(chars: &[char], offset: usize, open: char, close: char) -> Option<usize> {
    if chars.is_empty() {
        return None;
    }
    let mut depth = 0usize;
    for index in (0..=offset.min(chars.len() - 1)).rev() {
        let ch = chars[index];
        if ch == close && index != offset {
            depth += 1;
        } else if ch == open {
            if depth == 0 {
                return Some(index);
            }
            depth -= 1;
        }
    }
    (offset + 1..chars.len()).find(|index| chars[*index] == open)
}

/// 行内の引用符の位置を出現順に2つずつ組にする
pub fn quote_pairs(text: &str, class: QuoteClass) -> Vec<(usize, usize)> {
    let positions: Vec<usize> = text
        .chars()
        .enumerate()
        .filter(|(_, ch)| class.contains(*ch))
        .map(|(index, _)| index)
        .collect();
    pair_positions(&positions)
}

/// 位置列を (1番目, 2番目), (3番目, 4番目), ... と組にする
pub fn pair_positions(positions: &[usize]) -> Vec<(usize, usize)> {
    positions
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .map(|pair| (pair[0], pair[1]))
        .collect()
}

/// オフセットを囲む組、無ければオフセット以降で最初の組
pub fn select_pair(pairs: &[(usize, usize)], offset: usize) -> Option<(usize, usize)> {
    pairs
        .iter()
        .find(|(open, close)| *open < offset && offset <= *close)
        .or_else(|| pairs.iter().find(|(open, _)| *open >= offset))
        .copied()
}

/// 引用符オブジェクト
pub fn quote_object(text: &str, offset: usize, class: QuoteClass, scope: ObjectScope) -> Option<Span> {
    let (open, close) = select_pair(&quote_pairs(text, class), offset)?;
    Some(match scope {
        ObjectScope::Inner => Span::new(open + 1, close),
        ObjectScope::Around => Span::new(open, close + 1),
    })
}

fn run_around<F: Fn(usize) -> bool>(len: usize, index: usize, member: F) -> LineSpan {
    let mut first = index;
    while first > 0 && member(first - 1) {
        first -= 1;
    }
    let mut last = index;
    while last + 1 < len && member(last + 1) {
        last += 1;
    }
    LineSpan::new(first, last)
}

/// 段落オブジェクト（行範囲）
pub fn paragraph_object<S: AsRef<str>>(lines: &[S], active: usize, scope: ObjectScope) -> Option<LineSpan> {
    if active >= lines.len() {
        return None;
    }
    let boundary = |index: usize| is_boundary(lines[index].as_ref());

    if boundary(active) {
        return match scope {
            ObjectScope::Inner => None,
            ObjectScope::Around => Some(run_around(lines.len(), active, boundary)),
        };
    }

    let inner = run_around(lines.len(), active, |index| !boundary(index));
    if scope == ObjectScope::Inner {
        return Some(inner);
    }

    if inner.last + 1 < lines.len() && boundary(inner.last + 1) {
        let trailing = run_around(lines.len(), inner.last + 1, boundary);
        return Some(LineSpan::new(inner.first, trailing.last));
    }
    if inner.first > 0 && boundary(inner.first - 1) {
        let leading = run_around(lines.len(), inner.first - 1, boundary);
        return Some(LineSpan::new(leading.first, inner.last));
    }
    Some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::navigation::is_word_char;
    use proptest::prelude::*;

    #[test]
    fn inner_and_around_word() {
        let text = "foo bar  baz";
        let inner = word_object(text, 5, WordKind::Word, ObjectScope::Inner);
        assert_eq!(inner, Span::new(4, 7));
        assert_eq!(inner.slice(text), "bar");
        assert_eq!(word_object(text, 5, WordKind::Word, ObjectScope::Around), Span::new(4, 9));
        // 後続の空白が無ければ先行する空白
        assert_eq!(word_object(text, 10, WordKind::Word, ObjectScope::Around), Span::new(7, 12));
    }

    #[test]
    fn word_object_off_word_is_empty() {
        assert_eq!(word_object("a  b", 1, WordKind::Word, ObjectScope::Around), Span::empty(1));
        assert_eq!(word_object("ab", 2, WordKind::Word, ObjectScope::Inner), Span::empty(2));
    }

    #[test]
    fn inner_bracket() {
        let text = "hello (world) foo";
        let span = bracket_object(text, 8, '(', ')', ObjectScope::Inner).unwrap();
        assert_eq!(span.slice(text), "world");
        assert_eq!(span.remove_from(text), "hello () foo");
        let around = bracket_object(text, 8, '(', ')', ObjectScope::Around).unwrap();
        assert_eq!(around.slice(text), "(world)");
    }

    #[test]
    fn bracket_nesting_and_cursor_on_delimiters() {
        let text = "f(a, (b), c)";
        assert_eq!(bracket_object(text, 6, '(', ')', ObjectScope::Inner), Some(Span::new(6, 7)));
        assert_eq!(bracket_object(text, 3, '(', ')', ObjectScope::Inner), Some(Span::new(2, 11)));
        // 閉じ括弧の上では、その括弧の組
        assert_eq!(bracket_object(text, 11, '(', ')', ObjectScope::Inner), Some(Span::new(2, 11)));
        // 開き括弧の上
        assert_eq!(bracket_object(text, 5, '(', ')', ObjectScope::Inner), Some(Span::new(6, 7)));
    }

    #[test]
    fn bracket_forward_fallback() {
        let text = "call [1, 2]";
        assert_eq!(bracket_object(text, 0, '[', ']', ObjectScope::Inner), Some(Span::new(6, 10)));
    }

    #[test]
    fn unbalanced_brackets_are_none() {
        assert_eq!(bracket_object("(abc", 2, '(', ')', ObjectScope::Inner), None);
        assert_eq!(bracket_object("abc)", 1, '(', ')', ObjectScope::Inner), None);
        assert_eq!(bracket_object("", 0, '(', ')', ObjectScope::Inner), None);
    }

    #[test]
    fn quote_pairing() {
        let pairs = pair_positions(&[2, 5, 9, 14]);
        assert_eq!(pairs, vec![(2, 5), (9, 14)]);
        assert_eq!(select_pair(&pairs, 7), Some((9, 14)));
        assert_eq!(select_pair(&pairs, 4), Some((2, 5)));
        assert_eq!(select_pair(&pairs, 2), Some((2, 5)));
        assert_eq!(select_pair(&pairs, 15), None);
    }

    #[test]
    fn inner_quote() {
        let text = r#"say "hi" and "bye""#;
        let span = quote_object(text, 6, QuoteClass::Double, ObjectScope::Inner).unwrap();
        assert_eq!(span.slice(text), "hi");
        let next = quote_object(text, 9, QuoteClass::Double, ObjectScope::Around).unwrap();
        assert_eq!(next.slice(text), "\"bye\"");
    }

    #[test]
    fn typographic_quotes_share_a_class() {
        let text = "a \u{201C}b\u{201D} c";
        let span = quote_object(text, 3, QuoteClass::Double, ObjectScope::Inner).unwrap();
        assert_eq!(span.slice(text), "b");
        assert_eq!(quote_object(text, 0, QuoteClass::Single, ObjectScope::Inner), None);
    }

    #[test]
    fn paragraph_objects() {
        let lines = ["a", "b", "", " ", "c", ""];
        assert_eq!(paragraph_object(&lines, 1, ObjectScope::Inner), Some(LineSpan::new(0, 1)));
        assert_eq!(paragraph_object(&lines, 1, ObjectScope::Around), Some(LineSpan::new(0, 3)));
        assert_eq!(paragraph_object(&lines, 2, ObjectScope::Inner), None);
        assert_eq!(paragraph_object(&lines, 3, ObjectScope::Around), Some(LineSpan::new(2, 3)));
        assert_eq!(paragraph_object(&lines, 4, ObjectScope::Around), Some(LineSpan::new(4, 5)));

        // 後続の区切りが無ければ先行する区切り
        let tail = ["a", "", "b", "c"];
        assert_eq!(paragraph_object(&tail, 3, ObjectScope::Around), Some(LineSpan::new(1, 3)));
        assert_eq!(paragraph_object(&tail, 9, ObjectScope::Inner), None);
    }

    #[test]
    fn object_keys() {
        assert_eq!(TextObject::from_key('b'), Some(TextObject::Bracket { open: '(', close: ')' }));
        assert_eq!(TextObject::from_key('B'), Some(TextObject::Bracket { open: '{', close: '}' }));
        assert_eq!(TextObject::from_key('`'), Some(TextObject::Quote(QuoteClass::Backtick)));
        assert_eq!(TextObject::from_key('z'), None);
    }

    proptest! {
        #[test]
        fn inner_word_is_maximal(text in "[a-z_ .,]{1,24}", seed in 0usize..24) {
            let chars: Vec<char> = text.chars().collect();
            let offset = seed % chars.len();
            prop_assume!(is_word_char(chars[offset]));

            let span = word_object(&text, offset, WordKind::Word, ObjectScope::Inner);
            prop_assert!(span.start <= offset && offset < span.end);
            if span.start > 0 {
                prop_assert!(!is_word_char(chars[span.start - 1]));
            }
            if span.end < chars.len() {
                prop_assert!(!is_word_char(chars[span.end]));
            }
        }

        #[test]
        fn around_word_extends_one_side(text in "[a-z ]{1,24}", seed in 0usize..24) {
            let chars: Vec<char> = text.chars().collect();
            let offset = seed % chars.len();
            prop_assume!(is_word_char(chars[offset]));

            let inner = word_object(&text, offset, WordKind::Word, ObjectScope::Inner);
            let around = word_object(&text, offset, WordKind::Word, ObjectScope::Around);
            let has_trailing = inner.end < chars.len() && chars[inner.end] == ' ';
            if has_trailing {
                prop_assert_eq!(around.start, inner.start);
                prop_assert!(around.end > inner.end);
            } else {
                prop_assert_eq!(around.end, inner.end);
                prop_assert!(around.start <= inner.start);
            }
        }

        #[test]
        fn bracket_resolution_is_stable(text in "[a()]{0,16}", seed in 0usize..16) {
            let offset = if text.is_empty() { 0 } else { seed % text.len() };
            let first = bracket_object(&text, offset, '(', ')', ObjectScope::Inner);
            let second = bracket_object(&text, offset, '(', ')', ObjectScope::Inner);
            prop_assert_eq!(first, second);
            if let Some(span) = first {
                let chars: Vec<char> = text.chars().collect();
                prop_assert_eq!(chars[span.start - 1], '(');
                prop_assert_eq!(chars[span.end], ')');
            }
        }
    }
}
