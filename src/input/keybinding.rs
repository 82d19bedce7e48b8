//! キーバインドシステム
//!
//! Vim風の2段階（オペレータ＋対象）キーシーケンスを解釈してアクションに変換する。
//! 途中のキーは `KeyProcessResult::PartialMatch` を返し、状態はキーマップが保持する。

use crate::buffer::navigation::{FindKind, Motion, WordKind};
use crate::buffer::text_object::{ObjectScope, TextObject};
use crate::editor::operator::{OperatorTarget, PendingOperator, TargetKind, Verb};
use crate::ui::viewport::ScrollAmount;

/// キー入力の内部表現
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    /// 修飾キー
    pub modifiers: KeyModifiers,
    /// 基本キー
    pub code: KeyCode,
}

/// 修飾キーの組み合わせ
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

/// 基本キーコード
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Esc,
    Unknown,
}

impl Key {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { modifiers, code }
    }

    /// 修飾キーなし
    pub fn plain(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), KeyModifiers::default())
    }

    pub fn ctrl(ch: char) -> Self {
        Self::new(
            KeyCode::Char(ch),
            KeyModifiers { ctrl: true, alt: false, shift: false },
        )
    }

    pub fn esc() -> Self {
        Self::new(KeyCode::Esc, KeyModifiers::default())
    }

    pub fn backspace() -> Self {
        Self::new(KeyCode::Backspace, KeyModifiers::default())
    }

    pub fn enter() -> Self {
        Self::new(KeyCode::Enter, KeyModifiers::default())
    }

    pub fn arrow_up() -> Self {
        Self::new(KeyCode::Up, KeyModifiers::default())
    }

    pub fn arrow_down() -> Self {
        Self::new(KeyCode::Down, KeyModifiers::default())
    }

    pub fn arrow_left() -> Self {
        Self::new(KeyCode::Left, KeyModifiers::default())
    }

    pub fn arrow_right() -> Self {
        Self::new(KeyCode::Right, KeyModifiers::default())
    }

    pub fn is_esc(&self) -> bool {
        self.code == KeyCode::Esc
    }

    /// 挿入可能な文字かどうかを判定
    pub fn is_insertable_char(&self) -> bool {
        matches!(self.code, KeyCode::Char(_)) && !self.modifiers.ctrl && !self.modifiers.alt
    }

    /// 修飾キーなしの文字
    pub fn as_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch) if self.is_insertable_char() => Some(ch),
            _ => None,
        }
    }

    /// Ctrl 付きの文字
    pub fn as_ctrl_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch) if self.modifiers.ctrl && !self.modifiers.alt => Some(ch),
            _ => None,
        }
    }
}

/// キー列を解析する
///
/// 通常の文字はそのまま1キー、`<Esc>` `<CR>` `<BS>` `<Up>` `<C-d>` のような
/// 山括弧表記は特殊キーとして扱う。`<lt>` は `<` そのもの。
pub fn parse_keys(script: &str) -> Result<Vec<Key>, KeyParseError> {
    let mut keys = Vec::new();
    let mut rest = script;

    while let Some(ch) = rest.chars().next() {
        if ch == '<' {
            if let Some(close) = rest.find('>') {
                let name = &rest[1..close];
                if !name.is_empty() {
                    keys.push(parse_named_key(name)?);
                    rest = &rest[close + 1..];
                    continue;
                }
            }
        }
        keys.push(Key::plain(ch));
        rest = &rest[ch.len_utf8()..];
    }

    Ok(keys)
}

fn parse_named_key(name: &str) -> Result<Key, KeyParseError> {
    let mut modifiers = KeyModifiers::default();
    let mut remaining = name;

    // 修飾キーの解析
    loop {
        if let Some(stripped) = remaining.strip_prefix("C-") {
            modifiers.ctrl = true;
            remaining = stripped;
        } else if let Some(stripped) = remaining.strip_prefix("M-") {
            modifiers.alt = true;
            remaining = stripped;
        } else if let Some(stripped) = remaining.strip_prefix("S-") {
            modifiers.shift = true;
            remaining = stripped;
        } else {
            break;
        }
    }

    let code = match remaining {
        "Esc" => KeyCode::Esc,
        "CR" | "Enter" => KeyCode::Enter,
        "BS" | "Backspace" => KeyCode::Backspace,
        "Del" | "Delete" => KeyCode::Delete,
        "Tab" => KeyCode::Tab,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "lt" => KeyCode::Char('<'),
        "Space" => KeyCode::Char(' '),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => KeyCode::Char(ch),
                _ => return Err(KeyParseError::UnknownKey(name.to_string())),
            }
        }
    };

    Ok(Key { modifiers, code })
}

/// 挿入モードに入る位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertPosition {
    /// `i`
    AtCaret,
    /// `a`
    AfterCaret,
    /// `I`
    LineStart,
    /// `A`
    LineEnd,
}

/// アクション定義
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// カーソル移動
    Move(Motion),
    /// オペレータの適用
    Operate(Verb, OperatorTarget),
    /// 挿入モードへ
    EnterInsert(InsertPosition),
    EnterVisual,
    EnterVisualLine,
    /// ビューポートのスクロール
    Scroll(ScrollAmount),
    /// リンクヒントモードへ
    EnterLinkHint,
    /// 保留中のコマンドを取り消す
    Cancel,
    /// ビジュアル選択へのオペレータ
    VisualOperate(Verb),
    /// アンカーとキャレットの交換
    SwapAnchor,
    ExitVisual,
}

/// キー処理結果
#[derive(Debug, Clone, PartialEq)]
pub enum KeyProcessResult {
    /// アクション実行
    Action(Action),
    /// 部分マッチ（連続キー待ち）
    PartialMatch,
    /// マッチなし（無視）
    NoMatch,
}

/// 部分マッチ状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartialMatchState {
    None,
    /// `d` / `y` / `c` の後
    Operator(Verb),
    /// `di` / `da` の後
    ObjectScope(Verb, ObjectScope),
    /// `f` / `F` / `t` / `T` の後（オペレータ付きの場合あり）
    Find(Option<Verb>, FindKind),
    /// `g` の後
    GPrefix(Option<Verb>),
}

impl PartialMatchState {
    fn pending_operator(self) -> Option<PendingOperator> {
        let (verb, target) = match self {
            PartialMatchState::None | PartialMatchState::Find(None, _) | PartialMatchState::GPrefix(None) => {
                return None
            }
            PartialMatchState::Operator(verb) | PartialMatchState::GPrefix(Some(verb)) => {
                (verb, TargetKind::None)
            }
            PartialMatchState::ObjectScope(verb, scope) => (verb, scope.into()),
            PartialMatchState::Find(Some(verb), kind) => (verb, kind.into()),
        };
        Some(PendingOperator { verb, target })
    }

    fn label(self) -> Option<String> {
        let verb_char = |verb: Verb| match verb {
            Verb::Yank => 'y',
            Verb::Delete => 'd',
            Verb::Change => 'c',
        };
        let prefix = |verb: Option<Verb>| verb.map(verb_char).map(String::from).unwrap_or_default();
        match self {
            PartialMatchState::None => None,
            PartialMatchState::Operator(verb) => Some(verb_char(verb).to_string()),
            PartialMatchState::ObjectScope(verb, scope) => Some(format!(
                "{}{}",
                verb_char(verb),
                if scope == ObjectScope::Inner { 'i' } else { 'a' }
            )),
            PartialMatchState::Find(verb, kind) => Some(format!("{}{}", prefix(verb), find_key(kind))),
            PartialMatchState::GPrefix(verb) => Some(format!("{}g", prefix(verb))),
        }
    }
}

fn find_key(kind: FindKind) -> char {
    match kind {
        FindKind::Forward => 'f',
        FindKind::Backward => 'F',
        FindKind::TillForward => 't',
        FindKind::TillBackward => 'T',
    }
}

fn find_kind(ch: char) -> Option<FindKind> {
    match ch {
        'f' => Some(FindKind::Forward),
        'F' => Some(FindKind::Backward),
        't' => Some(FindKind::TillForward),
        'T' => Some(FindKind::TillBackward),
        _ => None,
    }
}

/// 単独で完結するモーションキー
fn motion_for(key: &Key) -> Option<Motion> {
    match key.code {
        KeyCode::Left => return Some(Motion::Left),
        KeyCode::Right => return Some(Motion::Right),
        KeyCode::Up => return Some(Motion::Up),
        KeyCode::Down => return Some(Motion::Down),
        _ => {}
    }
    let motion = match key.as_char()? {
        'h' => Motion::Left,
        'l' => Motion::Right,
        'k' => Motion::Up,
        'j' => Motion::Down,
        'w' => Motion::WordForward(WordKind::Word),
        'W' => Motion::WordForward(WordKind::BigWord),
        'b' => Motion::WordBackward(WordKind::Word),
        'B' => Motion::WordBackward(WordKind::BigWord),
        '0' => Motion::LineStart,
        '$' => Motion::LineEnd,
        '}' => Motion::ParagraphForward,
        '{' => Motion::ParagraphBackward,
        'G' => Motion::DocumentBottom,
        _ => return None,
    };
    Some(motion)
}

/// Ctrl スクロール
fn scroll_for(key: &Key) -> Option<ScrollAmount> {
    match key.as_ctrl_char()? {
        'd' => Some(ScrollAmount::HalfPageDown),
        'u' => Some(ScrollAmount::HalfPageUp),
        'f' => Some(ScrollAmount::PageDown),
        'b' => Some(ScrollAmount::PageUp),
        _ => None,
    }
}

fn action(action: Action) -> KeyProcessResult {
    KeyProcessResult::Action(action)
}

/// ノーマルモードのキーマップ
#[derive(Debug, Clone)]
pub struct NormalKeyMap {
    partial_match_state: PartialMatchState,
}

impl NormalKeyMap {
    /// 新しいキーマップを作成
    pub fn new() -> Self {
        Self {
            partial_match_state: PartialMatchState::None,
        }
    }

    /// キー入力を処理してアクションを返す
    pub fn process_key(&mut self, key: &Key) -> KeyProcessResult {
        if matches!(key.code, KeyCode::Unknown) {
            return KeyProcessResult::NoMatch;
        }

        // Escape はどの段階でも保留を捨てる
        if key.is_esc() {
            self.reset_partial_match();
            return action(Action::Cancel);
        }

        let state = std::mem::replace(&mut self.partial_match_state, PartialMatchState::None);
        match state {
            PartialMatchState::None => self.process_initial_key(key),
            PartialMatchState::Operator(verb) => self.process_operator_key(verb, key),
            PartialMatchState::ObjectScope(verb, scope) => process_object_key(verb, scope, key),
            PartialMatchState::Find(verb, kind) => process_find_key(verb, kind, key),
            PartialMatchState::GPrefix(verb) => process_g_key(verb, key, true),
        }
    }

    fn process_initial_key(&mut self, key: &Key) -> KeyProcessResult {
        if let Some(amount) = scroll_for(key) {
            return action(Action::Scroll(amount));
        }
        if let Some(motion) = motion_for(key) {
            return action(Action::Move(motion));
        }
        if key.code == KeyCode::Backspace {
            return action(Action::Move(Motion::Left));
        }

        let Some(ch) = key.as_char() else {
            return KeyProcessResult::NoMatch;
        };
        if let Some(verb) = Verb::from_key(ch) {
            return self.enter(PartialMatchState::Operator(verb));
        }
        if let Some(kind) = find_kind(ch) {
            return self.enter(PartialMatchState::Find(None, kind));
        }

        let result = match ch {
            'g' => return self.enter(PartialMatchState::GPrefix(None)),
            'i' => Action::EnterInsert(InsertPosition::AtCaret),
            'a' => Action::EnterInsert(InsertPosition::AfterCaret),
            'I' => Action::EnterInsert(InsertPosition::LineStart),
            'A' => Action::EnterInsert(InsertPosition::LineEnd),
            'v' => Action::EnterVisual,
            'V' => Action::EnterVisualLine,
            'x' => Action::Operate(Verb::Delete, OperatorTarget::Motion(Motion::Right)),
            'D' => Action::Operate(Verb::Delete, OperatorTarget::Motion(Motion::LineEnd)),
            'C' => Action::Operate(Verb::Change, OperatorTarget::Motion(Motion::LineEnd)),
            'Y' => Action::Operate(Verb::Yank, OperatorTarget::Line),
            _ => return KeyProcessResult::NoMatch,
        };
        action(result)
    }

    fn process_operator_key(&mut self, verb: Verb, key: &Key) -> KeyProcessResult {
        if let Some(motion) = motion_for(key) {
            return action(Action::Operate(verb, OperatorTarget::Motion(motion)));
        }

        // 無関係なキーは保留を捨てる
        let Some(ch) = key.as_char() else {
            return KeyProcessResult::NoMatch;
        };
        if Verb::from_key(ch) == Some(verb) {
            return action(Action::Operate(verb, OperatorTarget::Line));
        }
        if let Some(kind) = find_kind(ch) {
            return self.enter(PartialMatchState::Find(Some(verb), kind));
        }
        match ch {
            'i' => self.enter(PartialMatchState::ObjectScope(verb, ObjectScope::Inner)),
            'a' => self.enter(PartialMatchState::ObjectScope(verb, ObjectScope::Around)),
            'g' => self.enter(PartialMatchState::GPrefix(Some(verb))),
            _ => KeyProcessResult::NoMatch,
        }
    }

    fn enter(&mut self, state: PartialMatchState) -> KeyProcessResult {
        self.partial_match_state = state;
        KeyProcessResult::PartialMatch
    }

    /// 部分マッチ状態のリセット
    pub fn reset_partial_match(&mut self) {
        self.partial_match_state = PartialMatchState::None;
    }

    /// 現在の部分マッチ状態を取得
    pub fn is_partial_match(&self) -> bool {
        !matches!(self.partial_match_state, PartialMatchState::None)
    }

    /// 保留中のオペレータ
    pub fn pending_operator(&self) -> Option<PendingOperator> {
        self.partial_match_state.pending_operator()
    }

    /// 現在のプレフィックス表示
    pub fn current_prefix_label(&self) -> Option<String> {
        self.partial_match_state.label()
    }
}

impl Default for NormalKeyMap {
    fn default() -> Self {
        Self::new()
    }
}

fn process_object_key(verb: Verb, scope: ObjectScope, key: &Key) -> KeyProcessResult {
    key.as_char()
        .and_then(TextObject::from_key)
        .map(|object| action(Action::Operate(verb, OperatorTarget::TextObject(scope, object))))
        .unwrap_or(KeyProcessResult::NoMatch)
}

fn process_find_key(verb: Option<Verb>, kind: FindKind, key: &Key) -> KeyProcessResult {
    let Some(ch) = key.as_char() else {
        return KeyProcessResult::NoMatch;
    };
    let motion = Motion::Find(kind, ch);
    match verb {
        Some(verb) => action(Action::Operate(verb, OperatorTarget::Motion(motion))),
        None => action(Action::Move(motion)),
    }
}

fn process_g_key(verb: Option<Verb>, key: &Key, allow_link_hint: bool) -> KeyProcessResult {
    match (key.as_char(), verb) {
        (Some('g'), Some(verb)) => action(Action::Operate(verb, OperatorTarget::Motion(Motion::DocumentTop))),
        (Some('g'), None) => action(Action::Move(Motion::DocumentTop)),
        (Some('f'), None) if allow_link_hint => action(Action::EnterLinkHint),
        _ => KeyProcessResult::NoMatch,
    }
}

/// ビジュアルモードのキーマップ
#[derive(Debug, Clone)]
pub struct VisualKeyMap {
    partial_match_state: PartialMatchState,
}

impl VisualKeyMap {
    pub fn new() -> Self {
        Self {
            partial_match_state: PartialMatchState::None,
        }
    }

    pub fn process_key(&mut self, key: &Key) -> KeyProcessResult {
        if matches!(key.code, KeyCode::Unknown) {
            return KeyProcessResult::NoMatch;
        }
        if key.is_esc() {
            self.reset_partial_match();
            return action(Action::ExitVisual);
        }

        let state = std::mem::replace(&mut self.partial_match_state, PartialMatchState::None);
        match state {
            PartialMatchState::Find(_, kind) => process_find_key(None, kind, key),
            PartialMatchState::GPrefix(_) => process_g_key(None, key, false),
            _ => self.process_initial_key(key),
        }
    }

    fn process_initial_key(&mut self, key: &Key) -> KeyProcessResult {
        if let Some(amount) = scroll_for(key) {
            return action(Action::Scroll(amount));
        }
        if let Some(motion) = motion_for(key) {
            return action(Action::Move(motion));
        }

        let Some(ch) = key.as_char() else {
            return KeyProcessResult::NoMatch;
        };
        if let Some(kind) = find_kind(ch) {
            self.partial_match_state = PartialMatchState::Find(None, kind);
            return KeyProcessResult::PartialMatch;
        }

        let result = match ch {
            'g' => {
                self.partial_match_state = PartialMatchState::GPrefix(None);
                return KeyProcessResult::PartialMatch;
            }
            'o' => Action::SwapAnchor,
            'y' => Action::VisualOperate(Verb::Yank),
            'd' | 'x' => Action::VisualOperate(Verb::Delete),
            'c' => Action::VisualOperate(Verb::Change),
            'v' => Action::EnterVisual,
            'V' => Action::EnterVisualLine,
            _ => return KeyProcessResult::NoMatch,
        };
        action(result)
    }

    pub fn reset_partial_match(&mut self) {
        self.partial_match_state = PartialMatchState::None;
    }

    pub fn is_partial_match(&self) -> bool {
        !matches!(self.partial_match_state, PartialMatchState::None)
    }
}

impl Default for VisualKeyMap {
    fn default() -> Self {
        Self::new()
    }
}

/// キーパースエラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KeyParseError {
    #[error("Unknown key: {0}")]
    UnknownKey(String),
}
