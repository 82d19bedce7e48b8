//! リンクヒント
//!
//! 画面内のリンク対象に固定長のラベルを割り当て、入力された接頭辞で絞り込む。
//! ラベルはすべて同じ長さなので、どのラベルも他のラベルの接頭辞にならない。

use crate::host::{DiscoveryArea, HintCandidate, HintTargetId, Host, OverlayId, Rect};
use crate::input::keybinding::{Key, KeyCode};
use crate::input::mode::Mode;
use crate::session::Session;
use log::debug;
use std::collections::HashSet;

/// `n` 個の対象に必要なラベル長（`k^L >= n` となる最小の L、ただし 1 以上）
pub fn label_length(count: usize, alphabet_size: usize) -> usize {
    let mut length = 1;
    let mut capacity = alphabet_size;
    while capacity < count {
        capacity = capacity.saturating_mul(alphabet_size);
        length += 1;
    }
    length
}

/// 順位を `alphabet` による `k` 進数に変換し、先頭を0埋めしたラベル
pub fn generate_labels(count: usize, alphabet: &[char]) -> Vec<String> {
    let base = alphabet.len();
    if count == 0 || base < 2 {
        return Vec::new();
    }
    let length = label_length(count, base);

    (0..count)
        .map(|rank| {
            let mut digits = vec![alphabet[0]; length];
            let mut rest = rank;
            for slot in digits.iter_mut().rev() {
                *slot = alphabet[rest % base];
                rest /= base;
            }
            digits.into_iter().collect()
        })
        .collect()
}

/// 上から下、同じ行の中では左から右に並べる
///
/// 行の先頭要素との縦のずれが `tolerance` 以内なら同じ行とみなす。
pub fn sort_candidates(mut candidates: Vec<HintCandidate>, tolerance: f64) -> Vec<HintCandidate> {
    candidates.sort_by(|a, b| a.rect.y.total_cmp(&b.rect.y).then(a.rect.x.total_cmp(&b.rect.x)));

    let mut rows: Vec<Vec<HintCandidate>> = Vec::new();
    for candidate in candidates {
        match rows.last_mut() {
            Some(row) if (candidate.rect.y - row[0].rect.y).abs() <= tolerance => row.push(candidate),
            _ => rows.push(vec![candidate]),
        }
    }
    for row in &mut rows {
        row.sort_by(|a, b| a.rect.x.total_cmp(&b.rect.x));
    }
    rows.into_iter().flatten().collect()
}

/// 探索範囲を順に回り、画面内の対象を重複なく集める
pub fn collect_candidates<H: Host + ?Sized>(host: &H, viewport: &Rect) -> Vec<HintCandidate> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for area in DiscoveryArea::ORDER {
        for candidate in host.hint_candidates(area) {
            if candidate.rect.intersects(viewport) && seen.insert(candidate.id) {
                found.push(candidate);
            }
        }
    }
    found
}

/// ラベル付きの対象
#[derive(Debug, Clone, PartialEq)]
pub struct HintEntry {
    pub target: HintTargetId,
    pub rect: Rect,
    pub label: String,
    pub overlay: Option<OverlayId>,
}

/// 1文字入力した結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintOutcome {
    /// 絞り込み中（表示中のラベル数）
    Narrowed(usize),
    /// 1つに確定
    Activate(HintTargetId),
}

/// リンクヒントモードの状態
#[derive(Debug, Clone, Default)]
pub struct LinkHintState {
    entries: Vec<HintEntry>,
    typed: String,
}

impl LinkHintState {
    /// 並べ替え済みの候補にラベルを割り当てる
    pub fn new(candidates: Vec<HintCandidate>, alphabet: &[char]) -> Self {
        let labels = generate_labels(candidates.len(), alphabet);
        let entries = candidates
            .into_iter()
            .zip(labels)
            .map(|(candidate, label)| HintEntry {
                target: candidate.id,
                rect: candidate.rect,
                label,
                overlay: None,
            })
            .collect();
        Self {
            entries,
            typed: String::new(),
        }
    }

    pub fn entries(&self) -> &[HintEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [HintEntry] {
        &mut self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.label.clone()).collect()
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn is_visible(&self, entry: &HintEntry) -> bool {
        entry.label.starts_with(&self.typed)
    }

    pub fn visible_count(&self) -> usize {
        self.entries.iter().filter(|entry| self.is_visible(entry)).count()
    }

    pub fn type_char(&mut self, ch: char) -> HintOutcome {
        self.typed.push(ch);
        let mut exact = self.entries.iter().filter(|entry| entry.label == self.typed);
        match (exact.next(), exact.next()) {
            (Some(entry), None) => HintOutcome::Activate(entry.target),
            _ => HintOutcome::Narrowed(self.visible_count()),
        }
    }

    /// 最後の1文字を取り消す
    pub fn backspace(&mut self) {
        self.typed.pop();
    }
}

impl<H: Host> Session<H> {
    /// リンクヒントモードに入る（対象が無ければ何もしない）
    pub(crate) fn enter_link_hint(&mut self) {
        let viewport = self.host.viewport();
        let candidates = sort_candidates(
            collect_candidates(&self.host, &viewport),
            self.config.row_tolerance_px,
        );
        if candidates.is_empty() {
            debug!("no link hint targets in view");
            return;
        }

        let mut state = LinkHintState::new(candidates, &self.config.hint_alphabet());
        for entry in state.entries_mut() {
            entry.overlay = Some(self.host.show_hint(entry.target, &entry.label, entry.rect));
        }
        debug!("link hint: {} targets", state.entries().len());
        self.hints = Some(state);
        self.set_mode(Mode::LinkHint);
    }

    /// リンクヒントモードのキー処理（すべてのキーを消費する）
    pub(crate) fn link_hint_key(&mut self, key: &Key) {
        if key.is_esc() {
            self.exit_link_hint();
            return;
        }
        let Some(state) = self.hints.as_mut() else {
            self.set_mode(Mode::Normal);
            return;
        };

        if key.code == KeyCode::Backspace {
            state.backspace();
            self.render_hints();
            return;
        }
        let Some(ch) = key.as_char() else {
            return;
        };
        match state.type_char(ch) {
            HintOutcome::Activate(target) => {
                debug!("link hint activated {:?}", target);
                self.exit_link_hint();
                self.host.activate_hint_target(target);
            }
            HintOutcome::Narrowed(visible) => {
                debug!("link hint narrowed to {}", visible);
                self.render_hints();
            }
        }
    }

    fn render_hints(&mut self) {
        let Some(state) = &self.hints else {
            return;
        };
        let matched = state.typed().chars().count();
        for entry in state.entries() {
            if let Some(overlay) = entry.overlay {
                let visible = state.is_visible(entry);
                self.host
                    .update_hint(overlay, if visible { matched } else { 0 }, visible);
            }
        }
    }

    /// オーバーレイを取り除いてノーマルモードへ戻る
    pub(crate) fn exit_link_hint(&mut self) {
        self.clear_hint_overlays();
        self.set_mode(Mode::Normal);
    }

    pub(crate) fn clear_hint_overlays(&mut self) {
        if let Some(state) = self.hints.take() {
            for overlay in state.entries().iter().filter_map(|entry| entry.overlay) {
                self.host.remove_hint(overlay);
            }
        }
    }
}
