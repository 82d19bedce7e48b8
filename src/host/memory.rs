//! インメモリホスト
//!
//! 実ブラウザ無しで `Host` を満たす実装。テストとデモ用。
//! リージョン削除は要求時には反映されず、`settle` で初めて反映される
//! （ホストの非同期な再描画を模している）。

use super::{
    CaretTarget, DiscoveryArea, HintCandidate, HintTargetId, Host, NativePosition, NodeId,
    NodeTree, OverlayId, Rect, RegionId, ScrollRequest,
};
use crate::buffer::cursor::{self, char_len};
use crate::error::{host::Result, HostError};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

const PAGE_WIDTH: f64 = 800.0;

#[derive(Debug, Clone)]
enum MemNode {
    Text(String),
    Element(Vec<NodeId>),
}

/// リッチテキストの構築用パーツ
#[derive(Debug, Clone, PartialEq)]
pub enum RichPart {
    Text(String),
    Span(Vec<RichPart>),
}

impl RichPart {
    pub fn text(text: &str) -> Self {
        RichPart::Text(text.to_string())
    }

    pub fn span(parts: Vec<RichPart>) -> Self {
        RichPart::Span(parts)
    }
}

/// ホストが受け取った操作の記録
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    ClipboardWrite(String),
    ReplaceText { region: RegionId, text: String },
    DeleteRegion { region: RegionId, delay: Duration },
    DeleteRegionRange { first: RegionId, count: usize },
    DeleteSubLine { region: RegionId, sub_line: usize },
    Scroll(ScrollRequest),
    Activate(HintTargetId),
}

/// 表示中のヒントラベル
#[derive(Debug, Clone, PartialEq)]
pub struct HintOverlay {
    pub target: HintTargetId,
    pub label: String,
    pub matched: usize,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct MemoryHost {
    nodes: HashMap<NodeId, MemNode>,
    regions: Vec<(RegionId, NodeId)>,
    next_id: u64,
    caret: Option<(RegionId, NativePosition)>,
    focused: Option<RegionId>,
    clipboard: Option<String>,
    clipboard_fails: bool,
    pending_removals: Vec<RegionId>,
    listeners: HashSet<RegionId>,
    listener_attaches: HashMap<RegionId, usize>,
    events: Vec<HostEvent>,
    line_height: f64,
    char_width: f64,
    viewport_height: f64,
    scroll_y: f64,
    hint_targets: Vec<(DiscoveryArea, HintCandidate)>,
    overlays: BTreeMap<OverlayId, HintOverlay>,
    activated: Vec<HintTargetId>,
    caret_overlay: Option<Rect>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            regions: Vec::new(),
            next_id: 1,
            caret: None,
            focused: None,
            clipboard: None,
            clipboard_fails: false,
            pending_removals: Vec::new(),
            listeners: HashSet::new(),
            listener_attaches: HashMap::new(),
            events: Vec::new(),
            line_height: 20.0,
            char_width: 8.0,
            viewport_height: 400.0,
            scroll_y: 0.0,
            hint_targets: Vec::new(),
            overlays: BTreeMap::new(),
            activated: Vec::new(),
            caret_overlay: None,
        }
    }

    /// 1行1リージョンで構築
    pub fn from_lines(lines: &[&str]) -> Self {
        let mut host = Self::new();
        for line in lines {
            host.push_line(line);
        }
        host
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn build_leaf_children(&mut self, text: &str) -> Vec<NodeId> {
        if text.is_empty() {
            return Vec::new();
        }
        let leaf = NodeId(self.next());
        self.nodes.insert(leaf, MemNode::Text(text.to_string()));
        vec![leaf]
    }

    fn build_parts(&mut self, parts: Vec<RichPart>) -> Vec<NodeId> {
        parts
            .into_iter()
            .map(|part| {
                let id = NodeId(self.next());
                let node = match part {
                    RichPart::Text(text) => MemNode::Text(text),
                    RichPart::Span(children) => MemNode::Element(self.build_parts(children)),
                };
                self.nodes.insert(id, node);
                id
            })
            .collect()
    }

    fn new_region(&mut self, children: Vec<NodeId>) -> (RegionId, NodeId) {
        let region = RegionId(self.next());
        let root = NodeId(self.next());
        self.nodes.insert(root, MemNode::Element(children));
        (region, root)
    }

    /// 末尾にプレーンテキストのリージョンを追加
    pub fn push_line(&mut self, text: &str) -> RegionId {
        let children = self.build_leaf_children(text);
        let entry = self.new_region(children);
        self.regions.push(entry);
        entry.0
    }

    /// 末尾に入れ子構造のリージョンを追加
    pub fn push_rich(&mut self, parts: Vec<RichPart>) -> RegionId {
        let children = self.build_parts(parts);
        let entry = self.new_region(children);
        self.regions.push(entry);
        entry.0
    }

    /// 指定位置にリージョンを挿入（ホスト側の構造変化を模す）
    pub fn insert_line(&mut self, index: usize, text: &str) -> RegionId {
        let children = self.build_leaf_children(text);
        let entry = self.new_region(children);
        let index = index.min(self.regions.len());
        self.regions.insert(index, entry);
        entry.0
    }

    /// 即座にリージョンを取り除く
    pub fn remove_line_now(&mut self, region: RegionId) {
        self.regions.retain(|(id, _)| *id != region);
        self.listeners.remove(&region);
        if matches!(self.caret, Some((id, _)) if id == region) {
            self.caret = None;
        }
    }

    /// 保留中の削除を反映する
    pub fn settle(&mut self) {
        let pending = std::mem::take(&mut self.pending_removals);
        for region in pending {
            self.remove_line_now(region);
        }
    }

    pub fn pending_removals(&self) -> &[RegionId] {
        &self.pending_removals
    }

    pub fn root_of(&self, region: RegionId) -> NodeId {
        self.region_root(region)
            .unwrap_or_else(|| panic!("unknown region {:?}", region))
    }

    pub fn region_at(&self, index: usize) -> RegionId {
        self.regions[index].0
    }

    pub fn lines(&self) -> Vec<String> {
        self.regions
            .iter()
            .map(|(_, root)| self.collect_text(*root))
            .collect()
    }

    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    pub fn set_clipboard_fails(&mut self, fails: bool) {
        self.clipboard_fails = fails;
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn listener_attach_count(&self, region: RegionId) -> usize {
        self.listener_attaches.get(&region).copied().unwrap_or(0)
    }

    pub fn has_listener(&self, region: RegionId) -> bool {
        self.listeners.contains(&region)
    }

    pub fn focused(&self) -> Option<RegionId> {
        self.focused
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height;
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// スクロール位置を直接変更（ユーザーのホイール操作を模す）
    pub fn scroll_to(&mut self, y: f64) {
        self.scroll_y = y.clamp(0.0, self.max_scroll());
    }

    pub fn add_hint_target(&mut self, area: DiscoveryArea, rect: Rect) -> HintTargetId {
        let id = HintTargetId(self.next());
        self.hint_targets.push((area, HintCandidate { id, rect }));
        id
    }

    /// 既存の対象を別の探索範囲にも登録（重複発見を模す）
    pub fn add_hint_target_with_id(&mut self, area: DiscoveryArea, id: HintTargetId, rect: Rect) {
        self.hint_targets.push((area, HintCandidate { id, rect }));
    }

    pub fn overlays(&self) -> Vec<HintOverlay> {
        self.overlays.values().cloned().collect()
    }

    pub fn activated(&self) -> &[HintTargetId] {
        &self.activated
    }

    pub fn caret_overlay(&self) -> Option<Rect> {
        self.caret_overlay
    }

    /// キャレットの線形オフセット
    pub fn caret_offset(&self) -> Option<(RegionId, usize)> {
        let (region, position) = self.caret?;
        let root = self.region_root(region)?;
        Some((region, cursor::offset_of(self, root, position)))
    }

    /// ユーザーのクリックを模してキャレットを置く
    pub fn click(&mut self, region: RegionId, offset: usize) {
        if let Some(root) = self.region_root(region) {
            let target = cursor::caret_target(&*self, region, root, offset);
            self.set_caret(region, target);
        }
    }

    /// 挿入モードでの入力を模す
    pub fn type_text(&mut self, text: &str) {
        let Some((region, offset)) = self.caret_offset() else {
            return;
        };
        let Some(mut current) = self.region_text(region) else {
            return;
        };
        let byte = current
            .char_indices()
            .nth(offset)
            .map(|(index, _)| index)
            .unwrap_or(current.len());
        current.insert_str(byte, text);
        self.rebuild_region(region, &current);
        self.click(region, offset + char_len(text));
    }

    fn collect_text(&self, node: NodeId) -> String {
        match self.nodes.get(&node) {
            Some(MemNode::Text(text)) => text.clone(),
            Some(MemNode::Element(children)) => {
                children.iter().map(|child| self.collect_text(*child)).collect()
            }
            None => String::new(),
        }
    }

    fn rebuild_region(&mut self, region: RegionId, text: &str) {
        let Some(root) = self.region_root(region) else {
            return;
        };
        let children = self.build_leaf_children(text);
        self.nodes.insert(root, MemNode::Element(children));
    }

    fn region_index(&self, region: RegionId) -> Option<usize> {
        self.regions.iter().position(|(id, _)| *id == region)
    }

    fn region_height(&self, root: NodeId) -> f64 {
        let text = self.collect_text(root);
        cursor::sub_lines(&text).len() as f64 * self.line_height
    }

    fn document_height(&self) -> f64 {
        self.regions
            .iter()
            .map(|(_, root)| self.region_height(*root))
            .sum()
    }

    fn max_scroll(&self) -> f64 {
        (self.document_height() - self.viewport_height).max(0.0)
    }

    fn region_top(&self, index: usize) -> f64 {
        self.regions[..index]
            .iter()
            .map(|(_, root)| self.region_height(*root))
            .sum()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree for MemoryHost {
    fn child_count(&self, node: NodeId) -> usize {
        match self.nodes.get(&node) {
            Some(MemNode::Element(children)) => children.len(),
            _ => 0,
        }
    }

    fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId> {
        match self.nodes.get(&node) {
            Some(MemNode::Element(children)) => children.get(index).copied(),
            _ => None,
        }
    }

    fn is_text(&self, node: NodeId) -> bool {
        matches!(self.nodes.get(&node), Some(MemNode::Text(_)))
    }

    fn text_length(&self, node: NodeId) -> usize {
        char_len(&self.collect_text(node))
    }
}

impl Host for MemoryHost {
    fn regions(&self) -> Vec<RegionId> {
        self.regions.iter().map(|(id, _)| *id).collect()
    }

    fn region_root(&self, region: RegionId) -> Option<NodeId> {
        self.regions
            .iter()
            .find(|(id, _)| *id == region)
            .map(|(_, root)| *root)
    }

    fn region_text(&self, region: RegionId) -> Option<String> {
        self.region_root(region).map(|root| self.collect_text(root))
    }

    fn attach_input_listener(&mut self, region: RegionId) {
        self.listeners.insert(region);
        *self.listener_attaches.entry(region).or_insert(0) += 1;
    }

    fn detach_input_listener(&mut self, region: RegionId) {
        self.listeners.remove(&region);
    }

    fn caret(&self) -> Option<(RegionId, NativePosition)> {
        self.caret
    }

    fn set_caret(&mut self, region: RegionId, target: CaretTarget) {
        let Some(root) = self.region_root(region) else {
            return;
        };
        let position = match target {
            CaretTarget::Position(position) => position,
            CaretTarget::Region(_) => NativePosition { node: root, offset: 0 },
        };
        self.caret = Some((region, position));
        self.focused = Some(region);
    }

    fn focus_region(&mut self, region: RegionId) {
        if self.region_root(region).is_some() {
            self.focused = Some(region);
        }
    }

    fn replace_text(&mut self, region: RegionId, text: &str) -> Result<()> {
        if self.region_root(region).is_none() {
            return Err(HostError::RegionNotFound { region: region.0 });
        }
        self.rebuild_region(region, text);
        if matches!(self.caret, Some((id, _)) if id == region) {
            self.caret = None;
        }
        self.events.push(HostEvent::ReplaceText {
            region,
            text: text.to_string(),
        });
        Ok(())
    }

    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        if self.clipboard_fails {
            return Err(HostError::ClipboardUnavailable {
                message: "permission denied".to_string(),
            });
        }
        self.clipboard = Some(text.to_string());
        self.events.push(HostEvent::ClipboardWrite(text.to_string()));
        Ok(())
    }

    fn delete_region(&mut self, region: RegionId, delay: Duration) -> Result<()> {
        if self.region_root(region).is_none() {
            return Err(HostError::RegionNotFound { region: region.0 });
        }
        self.pending_removals.push(region);
        self.events.push(HostEvent::DeleteRegion { region, delay });
        Ok(())
    }

    fn delete_region_range(&mut self, first: RegionId, count: usize) -> Result<()> {
        let start = self
            .region_index(first)
            .ok_or(HostError::RegionNotFound { region: first.0 })?;
        let end = (start + count).min(self.regions.len());
        let doomed: Vec<RegionId> = self.regions[start..end].iter().map(|(id, _)| *id).collect();
        self.pending_removals.extend(doomed);
        self.events.push(HostEvent::DeleteRegionRange { first, count });
        Ok(())
    }

    fn delete_sub_line(&mut self, region: RegionId, sub_line: usize) -> Result<()> {
        let text = self
            .region_text(region)
            .ok_or(HostError::RegionNotFound { region: region.0 })?;
        let mut lines: Vec<&str> = text.split('\n').collect();
        if sub_line >= lines.len() {
            return Err(HostError::Rejected {
                operation: format!("delete sub-line {}", sub_line),
            });
        }
        lines.remove(sub_line);
        let joined = lines.join("\n");
        self.rebuild_region(region, &joined);
        if matches!(self.caret, Some((id, _)) if id == region) {
            self.caret = None;
        }
        self.events.push(HostEvent::DeleteSubLine { region, sub_line });
        Ok(())
    }

    fn region_rect(&self, region: RegionId) -> Option<Rect> {
        let index = self.region_index(region)?;
        let root = self.regions[index].1;
        Some(Rect::new(
            0.0,
            self.region_top(index),
            PAGE_WIDTH,
            self.region_height(root),
        ))
    }

    fn char_rect(&self, region: RegionId, offset: usize) -> Option<Rect> {
        let text = self.region_text(region)?;
        let ch = text.chars().nth(offset)?;
        if ch == '\n' {
            return None;
        }
        let top = self.region_rect(region)?.y;
        let (sub_line, column) = cursor::sub_line_at(&text, offset);
        Some(Rect::new(
            column as f64 * self.char_width,
            top + sub_line as f64 * self.line_height,
            self.char_width,
            self.line_height,
        ))
    }

    fn viewport(&self) -> Rect {
        Rect::new(0.0, self.scroll_y, PAGE_WIDTH, self.viewport_height)
    }

    fn scroll(&mut self, request: ScrollRequest) {
        self.events.push(HostEvent::Scroll(request));
        let target = match request {
            ScrollRequest::Fraction(fraction) => self.scroll_y + fraction * self.viewport_height,
            ScrollRequest::Top => 0.0,
            ScrollRequest::Bottom => self.max_scroll(),
            ScrollRequest::IntoView(region) => match self.region_rect(region) {
                Some(rect) if rect.y < self.scroll_y => rect.y,
                Some(rect) if rect.bottom() > self.scroll_y + self.viewport_height => {
                    rect.bottom() - self.viewport_height
                }
                _ => self.scroll_y,
            },
        };
        self.scroll_to(target);
    }

    fn hint_candidates(&self, area: DiscoveryArea) -> Vec<HintCandidate> {
        self.hint_targets
            .iter()
            .filter(|(candidate_area, _)| *candidate_area == area)
            .map(|(_, candidate)| *candidate)
            .collect()
    }

    fn show_hint(&mut self, target: HintTargetId, label: &str, _rect: Rect) -> OverlayId {
        let id = OverlayId(self.next());
        self.overlays.insert(
            id,
            HintOverlay {
                target,
                label: label.to_string(),
                matched: 0,
                visible: true,
            },
        );
        id
    }

    fn update_hint(&mut self, overlay: OverlayId, matched: usize, visible: bool) {
        if let Some(entry) = self.overlays.get_mut(&overlay) {
            entry.matched = matched;
            entry.visible = visible;
        }
    }

    fn remove_hint(&mut self, overlay: OverlayId) {
        self.overlays.remove(&overlay);
    }

    fn activate_hint_target(&mut self, target: HintTargetId) {
        self.activated.push(target);
        self.events.push(HostEvent::Activate(target));
    }

    fn place_caret_overlay(&mut self, rect: Option<Rect>) {
        self.caret_overlay = rect;
    }
}
