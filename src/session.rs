//! セッション
//!
//! 1つの文書にアタッチしたモーダル編集の状態一式。アタッチで生成し、
//! デタッチで破棄してホストを返す。

use crate::buffer::cursor::{self, char_len, column_of, entry_offset, is_multi_line, CursorState, VerticalEntry};
use crate::buffer::registry::LineRegistry;
use crate::buffer::text_object::LineSpan;
use crate::config::Config;
use crate::editor::deletion::{BatchPoll, DeletionBatch, FollowUp};
use crate::editor::operator::PendingOperator;
use crate::error::{log_error, BlockVimError, Result, StartupError};
use crate::hint::LinkHintState;
use crate::host::{Host, Rect, ScrollRequest};
use crate::input::keybinding::{Key, NormalKeyMap, VisualKeyMap};
use crate::input::mode::{InsertMode, LinkHintMode, Mode, ModeHandler, NormalMode, VisualMode};
use crate::ui::caret::overlay_rect;
use crate::ui::viewport::follow_scroll;
use log::{debug, info, warn};
use std::time::Instant;

/// ビジュアル選択の端点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualAnchor {
    pub line: usize,
    pub offset: usize,
}

/// 現在のビジュアル選択
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 文字単位（両端の文字を含む）
    Chars { start: VisualAnchor, end: VisualAnchor },
    /// 行単位
    Lines(LineSpan),
}

/// 起動状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Startup {
    /// リージョンが見つかるまで再試行中
    Polling { attempts: u32, next_poll: Instant },
    Ready,
    /// 試行回数を使い切った
    Failed,
}

/// モーダル編集セッション
pub struct Session<H: Host> {
    pub(crate) host: H,
    pub(crate) config: Config,
    pub(crate) registry: LineRegistry,
    pub(crate) cursor: CursorState,
    pub(crate) mode: Mode,
    pub(crate) normal_keys: NormalKeyMap,
    pub(crate) visual_keys: VisualKeyMap,
    pub(crate) visual_anchor: Option<VisualAnchor>,
    pub(crate) hints: Option<LinkHintState>,
    pub(crate) deletion: Option<DeletionBatch>,
    startup: Startup,
}

impl<H: Host> Session<H> {
    /// ホストにアタッチする
    ///
    /// リージョンがまだ無い場合は `tick` で再試行する。
    pub fn attach(host: H, config: Config) -> Self {
        let now = Instant::now();
        let mut session = Self {
            host,
            config,
            registry: LineRegistry::new(),
            cursor: CursorState::new(),
            mode: Mode::Normal,
            normal_keys: NormalKeyMap::new(),
            visual_keys: VisualKeyMap::new(),
            visual_anchor: None,
            hints: None,
            deletion: None,
            startup: Startup::Failed,
        };
        session.startup = session.try_start(now, 1);
        session
    }

    /// デタッチしてホストを返す
    pub fn detach(mut self) -> H {
        if let Some(batch) = self.deletion.take() {
            let registry = &self.registry;
            let outstanding = batch.cancel(|region| registry.contains(region));
            debug!("deletion batch dropped with {} region(s) outstanding", outstanding.len());
        }
        self.clear_hint_overlays();
        self.host.place_caret_overlay(None);
        self.registry.detach_all(&mut self.host);
        info!("session detached");
        self.host
    }

    fn try_start(&mut self, now: Instant, attempts: u32) -> Startup {
        self.registry.refresh(&mut self.host, None);
        if self.registry.is_empty() {
            debug!("no editable regions yet (attempt {})", attempts);
            return Startup::Polling {
                attempts,
                next_poll: now + self.config.startup_poll_interval(),
            };
        }

        info!("session attached to {} line(s)", self.registry.len());
        if !self.sync_from_host() {
            self.set_active_line(0);
            self.set_column(0);
        }
        self.refresh_caret_overlay();
        Startup::Ready
    }

    /// 時間経過の処理（起動時の再試行と削除バッチのポーリング）
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        match self.startup {
            Startup::Polling { attempts, next_poll } => {
                if now < next_poll {
                    return Ok(());
                }
                if attempts >= self.config.startup_max_attempts {
                    self.startup = Startup::Failed;
                    let err = BlockVimError::from(StartupError::NoRegions { attempts });
                    log_error(&err, "startup");
                    return Err(err);
                }
                self.startup = self.try_start(now, attempts + 1);
                Ok(())
            }
            Startup::Ready => {
                self.poll_deletion(now, false);
                Ok(())
            }
            Startup::Failed => Ok(()),
        }
    }

    /// ホストの構造が変わったときの通知
    pub fn on_mutation(&mut self) {
        let now = Instant::now();
        match self.startup {
            Startup::Polling { attempts, .. } => {
                if let Startup::Ready = self.try_start(now, attempts) {
                    self.startup = Startup::Ready;
                }
            }
            Startup::Ready => {
                self.refresh();
                self.poll_deletion(now, true);
            }
            Startup::Failed => {}
        }
    }

    /// スクロールの通知。キャレットを画面内に追従させる
    pub fn on_scroll(&mut self) {
        if !self.is_ready() || !matches!(self.mode, Mode::Normal | Mode::Visual | Mode::VisualLine) {
            return;
        }
        let viewport = self.host.viewport();
        let rects: Vec<Option<Rect>> = self
            .registry
            .entries()
            .iter()
            .map(|entry| self.host.region_rect(entry.region))
            .collect();
        let active = self.cursor.active_line;
        if let Some(line) = follow_scroll(&rects, active, &viewport) {
            let entry = if line > active {
                VerticalEntry::Downward
            } else {
                VerticalEntry::Upward
            };
            self.move_to_line(line, entry);
        }
    }

    /// キー入力。消費した（ホストに渡さない）場合は `true`
    pub fn handle_key(&mut self, key: &Key) -> bool {
        if !self.is_ready() {
            return false;
        }
        if self.deletion.is_some() {
            // 削除完了までは新しいコマンドを受け付けない
            return key.is_esc();
        }
        match self.mode {
            Mode::Normal => NormalMode.handle(self, key),
            Mode::Insert => InsertMode.handle(self, key),
            Mode::Visual | Mode::VisualLine => VisualMode.handle(self, key),
            Mode::LinkHint => LinkHintMode.handle(self, key),
        }
    }

    fn poll_deletion(&mut self, now: Instant, force: bool) {
        let Some(mut batch) = self.deletion.take() else {
            return;
        };
        if !force && !batch.is_due(now) {
            self.deletion = Some(batch);
            return;
        }

        self.refresh();
        let registry = &self.registry;
        match batch.poll(now, |region| registry.contains(region)) {
            BatchPoll::Pending => self.deletion = Some(batch),
            BatchPoll::Completed(follow_up) => {
                debug!("deletion batch completed");
                self.finish_deletion(follow_up);
            }
            BatchPoll::TimedOut(follow_up) => {
                warn!(
                    "deletion batch timed out with {} target(s)",
                    batch.targets().len()
                );
                self.finish_deletion(follow_up);
            }
        }
    }

    /// 削除後のモード復帰とキャレット再配置
    pub(crate) fn finish_deletion(&mut self, follow_up: FollowUp) {
        self.refresh();
        let line = follow_up
            .anchor
            .and_then(|region| self.registry.index_of(region))
            .or_else(|| self.registry.clamp(follow_up.line));
        if let Some(line) = line {
            self.set_active_line(line);
            self.set_column(follow_up.offset);
        }
        self.set_mode(follow_up.mode);
    }

    /// レジストリを作り直し、アクティブ行を同一性で探し直す
    pub(crate) fn refresh(&mut self) {
        let active = self.registry.region(self.cursor.active_line);
        match self.registry.refresh(&mut self.host, active) {
            Some(index) => self.cursor.active_line = index,
            None => {
                if let Some(line) = self.registry.clamp(self.cursor.active_line) {
                    self.cursor.active_line = line;
                    let len = char_len(&self.line_text(line));
                    self.cursor.offset = self.cursor.offset.min(len);
                }
            }
        }
    }

    /// ホストのキャレットからカーソルを読み直す
    ///
    /// ユーザーのクリックや入力で位置が変わっていれば `desired_column` も更新する。
    pub(crate) fn sync_from_host(&mut self) -> bool {
        let Some((region, position)) = self.host.caret() else {
            return false;
        };
        if !self.registry.contains(region) {
            self.refresh();
        }
        let Some(line) = self.registry.index_of(region) else {
            return false;
        };
        let Some(root) = self.host.region_root(region) else {
            return false;
        };
        let offset = cursor::offset_of(&self.host, root, position);
        if line != self.cursor.active_line || offset != self.cursor.offset {
            self.cursor.active_line = line;
            self.cursor.offset = offset;
            self.cursor.desired_column = column_of(&self.line_text(line), offset);
        }
        true
    }

    /// アクティブ行を設定する（`desired_column` は変えない）
    pub(crate) fn set_active_line(&mut self, target: usize) {
        let Some(line) = self.registry.clamp(target) else {
            return;
        };
        self.cursor.active_line = line;
        if let Some(region) = self.registry.region(line) {
            self.host.focus_region(region);
        }
    }

    /// アクティブ行の中にキャレットを置く（`desired_column` は変えない）
    pub(crate) fn place_caret(&mut self, offset: usize) {
        let Some(region) = self.registry.region(self.cursor.active_line) else {
            return;
        };
        let Some(root) = self.host.region_root(region) else {
            return;
        };
        let offset = offset.min(cursor::text_len(&self.host, root));
        let target = cursor::caret_target(&self.host, region, root, offset);
        self.host.set_caret(region, target);
        self.cursor.offset = offset;
        self.refresh_caret_overlay();
    }

    /// 水平移動。キャレットを置き `desired_column` を更新する
    pub(crate) fn set_column(&mut self, offset: usize) {
        self.place_caret(offset);
        let text = self.line_text(self.cursor.active_line);
        self.cursor.desired_column = column_of(&text, self.cursor.offset);
    }

    /// 垂直移動。`desired_column` を読むだけで書き換えない
    pub(crate) fn move_to_line(&mut self, line: usize, entry: VerticalEntry) {
        self.set_active_line(line);
        let text = self.line_text(self.cursor.active_line);
        let offset = if is_multi_line(&text) {
            entry_offset(&text, self.cursor.desired_column, entry)
        } else {
            self.cursor.desired_column.min(char_len(&text))
        };
        self.place_caret(offset);
    }

    /// アクティブ行が見える位置までスクロール
    pub(crate) fn reveal_active_line(&mut self) {
        if let Some(region) = self.registry.region(self.cursor.active_line) {
            self.host.scroll(ScrollRequest::IntoView(region));
        }
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        if !mode.is_visual() {
            self.visual_anchor = None;
        }
        self.normal_keys.reset_partial_match();
        self.visual_keys.reset_partial_match();
        self.mode = mode;
        self.refresh_caret_overlay();
    }

    pub(crate) fn refresh_caret_overlay(&mut self) {
        let Some(region) = self.registry.region(self.cursor.active_line) else {
            self.host.place_caret_overlay(None);
            return;
        };
        let offset = self.cursor.offset;
        let rect = overlay_rect(
            self.mode,
            self.host.char_rect(region, offset),
            offset
                .checked_sub(1)
                .and_then(|prev| self.host.char_rect(region, prev)),
            self.host.region_rect(region),
            self.config.caret_min_width_px,
        );
        self.host.place_caret_overlay(rect);
    }

    /// クリップボードへ書く。失敗はログのみ
    pub(crate) fn write_clipboard(&mut self, text: &str) {
        if let Err(err) = self.host.write_clipboard(text) {
            log_error(&BlockVimError::from(err), "clipboard write");
        }
    }

    pub(crate) fn line_text(&self, index: usize) -> String {
        self.registry
            .region(index)
            .and_then(|region| self.host.region_text(region))
            .unwrap_or_default()
    }

    pub(crate) fn line_texts(&self) -> Vec<String> {
        (0..self.registry.len()).map(|index| self.line_text(index)).collect()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    /// 各行のテキスト（レジストリ順）
    pub fn lines(&self) -> Vec<String> {
        self.line_texts()
    }

    pub fn visual_selection(&self) -> Option<Selection> {
        let anchor = self.visual_anchor?;
        let caret = VisualAnchor {
            line: self.cursor.active_line,
            offset: self.cursor.offset,
        };
        let (start, end) = if (anchor.line, anchor.offset) <= (caret.line, caret.offset) {
            (anchor, caret)
        } else {
            (caret, anchor)
        };
        match self.mode {
            Mode::Visual => Some(Selection::Chars { start, end }),
            Mode::VisualLine => Some(Selection::Lines(LineSpan::new(start.line, end.line))),
            _ => None,
        }
    }

    pub fn pending_operator(&self) -> Option<PendingOperator> {
        match self.mode {
            Mode::Normal => self.normal_keys.pending_operator(),
            _ => None,
        }
    }

    /// 表示中のヒントラベル
    pub fn hint_labels(&self) -> Vec<String> {
        self.hints
            .as_ref()
            .map(|state| {
                state
                    .entries()
                    .iter()
                    .filter(|entry| state.is_visible(entry))
                    .map(|entry| entry.label.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_ready(&self) -> bool {
        self.startup == Startup::Ready
    }

    pub fn startup_failed(&self) -> bool {
        self.startup == Startup::Failed
    }

    /// 削除バッチの完了待ちか
    pub fn deletion_pending(&self) -> bool {
        self.deletion.is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use std::time::Duration;

    fn session(lines: &[&str]) -> Session<MemoryHost> {
        Session::attach(MemoryHost::from_lines(lines), Config::default())
    }

    #[test]
    fn attach_places_caret_on_first_line() {
        let session = session(&["abc", "def"]);
        assert!(session.is_ready());
        assert_eq!(session.cursor(), CursorState::at(0, 0));
        let first = session.host().region_at(0);
        assert_eq!(session.host().caret_offset(), Some((first, 0)));
        assert!(session.host().caret_overlay().is_some());
    }

    #[test]
    fn attach_adopts_existing_host_caret() {
        let mut host = MemoryHost::from_lines(&["abc", "defgh"]);
        let second = host.region_at(1);
        host.click(second, 4);
        let session = Session::attach(host, Config::default());
        assert_eq!(session.cursor(), CursorState::at(1, 4));
    }

    #[test]
    fn startup_gives_up_after_attempt_budget() {
        let config = Config {
            startup_max_attempts: 3,
            ..Config::default()
        };
        let mut session = Session::attach(MemoryHost::new(), config);
        assert!(!session.is_ready());
        assert!(!session.handle_key(&Key::plain('j')));

        let start = Instant::now();
        let step = Duration::from_millis(100);
        assert!(session.tick(start + step).is_ok());
        assert!(session.tick(start + step * 2).is_ok());
        let err = session.tick(start + step * 3).unwrap_err();
        assert!(matches!(err, BlockVimError::Startup(StartupError::NoRegions { attempts: 3 })));
        assert!(session.startup_failed());
    }

    #[test]
    fn startup_succeeds_once_regions_mount() {
        let mut session = Session::attach(MemoryHost::new(), Config::default());
        session.host_mut().push_line("late");
        session.on_mutation();
        assert!(session.is_ready());
        assert_eq!(session.lines(), vec!["late".to_string()]);
    }

    #[test]
    fn sync_picks_up_clicks() {
        let mut session = session(&["hello", "world"]);
        let second = session.host().region_at(1);
        session.host_mut().click(second, 3);
        assert!(session.sync_from_host());
        assert_eq!(session.cursor(), CursorState::at(1, 3));
    }

    #[test]
    fn refresh_follows_active_region_identity() {
        let mut session = session(&["a", "b"]);
        session.set_active_line(1);
        session.set_column(1);
        session.host_mut().insert_line(0, "new");
        session.on_mutation();
        assert_eq!(session.cursor().active_line, 2);
    }

    #[test]
    fn detach_removes_listeners_and_overlay() {
        let session = session(&["a", "b"]);
        let host = session.detach();
        assert!(host.regions().iter().all(|region| !host.has_listener(*region)));
        assert_eq!(host.caret_overlay(), None);
    }
}
