//! ホストアダプタ
//!
//! blockvim が所有しない外部リッチエディタとの境界。ホストは
//! 編集可能リージョンの集合、ネイティブなキャレット API、構造ツリー、
//! クリップボード、行削除プリミティブ、ジオメトリ、ヒント描画を提供する。
//! 実装はホストごとに一度だけ書けばよい。

pub mod memory;

pub use memory::{HostEvent, MemoryHost, RichPart};

use crate::error::host::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 編集可能リージョンのハンドル（ホスト側で同一性が保たれる）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u64);

/// 構造ツリーのノードハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// リンクヒント対象のハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HintTargetId(pub u64);

/// ヒントラベル描画のハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

/// 画面上の矩形（px）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// 他の矩形と重なるか（辺が接するだけの場合は重ならない）
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// ネイティブなキャレット位置（ノードとノード内オフセット）
///
/// テキストノードなら文字オフセット、要素ノードなら子のインデックス。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativePosition {
    pub node: NodeId,
    pub offset: usize,
}

/// キャレットの設定先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretTarget {
    /// 文字位置
    Position(NativePosition),
    /// リージョン自体を選択（空のリージョン）
    Region(RegionId),
}

/// ヒント対象の探索範囲（この順に探索する）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryArea {
    /// 本文領域
    Content,
    /// ナビゲーション領域
    Navigation,
    /// 文書全体（フォールバック）
    Document,
}

impl DiscoveryArea {
    pub const ORDER: [DiscoveryArea; 3] = [
        DiscoveryArea::Content,
        DiscoveryArea::Navigation,
        DiscoveryArea::Document,
    ];
}

/// ヒント対象の候補
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HintCandidate {
    pub id: HintTargetId,
    pub rect: Rect,
}

/// スクロール要求
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollRequest {
    /// ビューポート高さに対する割合（負数は上方向）
    Fraction(f64),
    /// 文書先頭
    Top,
    /// 文書末尾
    Bottom,
    /// リージョンが見える位置まで
    IntoView(RegionId),
}

/// 構造ツリーへの最小アダプタ
pub trait NodeTree {
    fn child_count(&self, node: NodeId) -> usize;
    fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId>;
    fn is_text(&self, node: NodeId) -> bool;
    fn text_length(&self, node: NodeId) -> usize;
}

/// 外部エディタとのインタフェース
pub trait Host: NodeTree {
    /// 文書順に並んだ編集可能リージョン
    fn regions(&self) -> Vec<RegionId>;
    fn region_root(&self, region: RegionId) -> Option<NodeId>;
    fn region_text(&self, region: RegionId) -> Option<String>;
    fn attach_input_listener(&mut self, region: RegionId);
    fn detach_input_listener(&mut self, region: RegionId);

    /// グローバルキャレット（リージョンごとではない）
    fn caret(&self) -> Option<(RegionId, NativePosition)>;
    fn set_caret(&mut self, region: RegionId, target: CaretTarget);
    fn focus_region(&mut self, region: RegionId);

    /// リージョンのテキストを置き換える（キャレットは保持されない）
    fn replace_text(&mut self, region: RegionId, text: &str) -> Result<()>;

    fn write_clipboard(&mut self, text: &str) -> Result<()>;

    fn delete_region(&mut self, region: RegionId, delay: Duration) -> Result<()>;
    fn delete_region_range(&mut self, first: RegionId, count: usize) -> Result<()>;
    /// 複数行リージョン内の1行だけを削除
    fn delete_sub_line(&mut self, region: RegionId, sub_line: usize) -> Result<()>;

    fn region_rect(&self, region: RegionId) -> Option<Rect>;
    /// オフセット位置の文字の矩形（行末では `None`）
    fn char_rect(&self, region: RegionId, offset: usize) -> Option<Rect>;
    fn viewport(&self) -> Rect;
    fn scroll(&mut self, request: ScrollRequest);

    fn hint_candidates(&self, area: DiscoveryArea) -> Vec<HintCandidate>;
    fn show_hint(&mut self, target: HintTargetId, label: &str, rect: Rect) -> OverlayId;
    /// `matched` は強調表示する先頭文字数
    fn update_hint(&mut self, overlay: OverlayId, matched: usize, visible: bool);
    fn remove_hint(&mut self, overlay: OverlayId);
    fn activate_hint_target(&mut self, target: HintTargetId);

    /// `None` でオーバーレイを隠す
    fn place_caret_overlay(&mut self, rect: Option<Rect>);
}
