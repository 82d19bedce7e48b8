//! カーソル位置管理
//!
//! リージョン内の線形文字オフセットと、ホストのネイティブなキャレット位置との
//! 相互変換を行う。構造ツリーは `{テキスト葉, 子を持つ要素}` の2種類だけとして
//! 型付きビジタで深さ優先に走査する。
//!
//! 改行を含むリージョン（複数行リージョン）では、1つの線形オフセットが
//! 複数の表示上のサブ行にまたがる。

use crate::host::{CaretTarget, NativePosition, NodeId, NodeTree, RegionId};
use std::ops::ControlFlow;

/// カーソル状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    /// アクティブ行（レジストリのインデックス）
    pub active_line: usize,
    /// 垂直移動で維持する列。水平移動だけが更新する
    pub desired_column: usize,
    /// 行内の文字オフセット
    pub offset: usize,
}

impl CursorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(active_line: usize, offset: usize) -> Self {
        Self {
            active_line,
            desired_column: offset,
            offset,
        }
    }
}

/// 構造ツリーのノード分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureNode {
    Text { node: NodeId, len: usize },
    Element { node: NodeId, children: usize },
}

impl StructureNode {
    pub fn classify<T: NodeTree + ?Sized>(tree: &T, node: NodeId) -> Self {
        if tree.is_text(node) {
            StructureNode::Text {
                node,
                len: tree.text_length(node),
            }
        } else {
            StructureNode::Element {
                node,
                children: tree.child_count(node),
            }
        }
    }
}

/// 構造ツリーのビジタ
pub trait StructureVisitor {
    type Break;

    fn text(&mut self, node: NodeId, len: usize) -> ControlFlow<Self::Break>;

    fn enter_element(&mut self, _node: NodeId, _children: usize) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }
}

/// 深さ優先でビジタを適用する
pub fn walk<T, V>(tree: &T, node: NodeId, visitor: &mut V) -> ControlFlow<V::Break>
where
    T: NodeTree + ?Sized,
    V: StructureVisitor,
{
    match StructureNode::classify(tree, node) {
        StructureNode::Text { node, len } => visitor.text(node, len),
        StructureNode::Element { node, children } => {
            visitor.enter_element(node, children)?;
            for index in 0..children {
                if let Some(child) = tree.child_at(node, index) {
                    walk(tree, child, visitor)?;
                }
            }
            ControlFlow::Continue(())
        }
    }
}

struct LengthCounter {
    total: usize,
}

impl StructureVisitor for LengthCounter {
    type Break = ();

    fn text(&mut self, _node: NodeId, len: usize) -> ControlFlow<()> {
        self.total += len;
        ControlFlow::Continue(())
    }
}

/// ノード配下のテキスト長
pub fn text_len<T: NodeTree + ?Sized>(tree: &T, node: NodeId) -> usize {
    let mut counter = LengthCounter { total: 0 };
    let _ = walk(tree, node, &mut counter);
    counter.total
}

struct OffsetCounter<'a, T: ?Sized> {
    tree: &'a T,
    target: NativePosition,
    count: usize,
}

impl<T: NodeTree + ?Sized> StructureVisitor for OffsetCounter<'_, T> {
    type Break = usize;

    fn text(&mut self, node: NodeId, len: usize) -> ControlFlow<usize> {
        if node == self.target.node {
            return ControlFlow::Break(self.count + self.target.offset.min(len));
        }
        self.count += len;
        ControlFlow::Continue(())
    }

    fn enter_element(&mut self, node: NodeId, children: usize) -> ControlFlow<usize> {
        if node != self.target.node {
            return ControlFlow::Continue(());
        }
        // 要素上のキャレットは子インデックスを指す
        let before: usize = (0..self.target.offset.min(children))
            .filter_map(|index| self.tree.child_at(node, index))
            .map(|child| text_len(self.tree, child))
            .sum();
        ControlFlow::Break(self.count + before)
    }
}

/// キャレット位置からリージョン内の線形オフセットを求める
///
/// キャレットがリージョン内に見つからない場合は 0。
pub fn offset_of<T: NodeTree + ?Sized>(tree: &T, root: NodeId, caret: NativePosition) -> usize {
    let mut counter = OffsetCounter {
        tree,
        target: caret,
        count: 0,
    };
    match walk(tree, root, &mut counter) {
        ControlFlow::Break(offset) => offset,
        ControlFlow::Continue(()) => 0,
    }
}

struct Locator {
    remaining: usize,
}

impl StructureVisitor for Locator {
    type Break = NativePosition;

    fn text(&mut self, node: NodeId, len: usize) -> ControlFlow<NativePosition> {
        if len > 0 && self.remaining <= len {
            return ControlFlow::Break(NativePosition {
                node,
                offset: self.remaining,
            });
        }
        self.remaining = self.remaining.saturating_sub(len);
        ControlFlow::Continue(())
    }
}

/// 線形オフセットに対応するネイティブ位置（テキスト葉が無ければ `None`）
pub fn locate<T: NodeTree + ?Sized>(tree: &T, root: NodeId, index: usize) -> Option<NativePosition> {
    let mut locator = Locator { remaining: index };
    match walk(tree, root, &mut locator) {
        ControlFlow::Break(position) => Some(position),
        ControlFlow::Continue(()) => None,
    }
}

/// 線形オフセットを設定するためのキャレット位置を求める
///
/// オフセットはテキスト長にクランプする。空のリージョンはリージョン自体を選択する。
pub fn caret_target<T: NodeTree + ?Sized>(
    tree: &T,
    region: RegionId,
    root: NodeId,
    index: usize,
) -> CaretTarget {
    let total = text_len(tree, root);
    if tree.child_count(root) == 0 || total == 0 {
        return CaretTarget::Region(region);
    }
    locate(tree, root, index.min(total))
        .map(CaretTarget::Position)
        .unwrap_or(CaretTarget::Region(region))
}

/// 文字数
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// 複数行リージョンのサブ行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubLine {
    pub start: usize,
    pub len: usize,
}

impl SubLine {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

pub fn is_multi_line(text: &str) -> bool {
    text.contains('\n')
}

/// 改行で区切ったサブ行（改行文字自体は含まない）
pub fn sub_lines(text: &str) -> Vec<SubLine> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut len = 0;
    for ch in text.chars() {
        if ch == '\n' {
            lines.push(SubLine { start, len });
            start += len + 1;
            len = 0;
        } else {
            len += 1;
        }
    }
    lines.push(SubLine { start, len });
    lines
}

/// オフセットが属するサブ行と、その中の列
pub fn sub_line_at(text: &str, offset: usize) -> (usize, usize) {
    let lines = sub_lines(text);
    for (index, line) in lines.iter().enumerate() {
        if offset <= line.end() {
            return (index, offset.saturating_sub(line.start));
        }
    }
    let last = lines.len() - 1;
    (last, lines[last].len)
}

/// サブ行内の列（単一行なら offset そのもの）
pub fn column_of(text: &str, offset: usize) -> usize {
    sub_line_at(text, offset).1
}

/// 垂直移動でリージョンに入る方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalEntry {
    /// 下の行から上へ（最後のサブ行に入る）
    Upward,
    /// 上の行から下へ（最初のサブ行に入る）
    Downward,
}

/// 垂直移動でリージョンに入ったときのオフセット
pub fn entry_offset(text: &str, desired_column: usize, entry: VerticalEntry) -> usize {
    let lines = sub_lines(text);
    let line = match entry {
        VerticalEntry::Upward => lines[lines.len() - 1],
        VerticalEntry::Downward => lines[0],
    };
    line.start + desired_column.min(line.len)
}

/// 複数行リージョン内でサブ行を移動する（端のサブ行なら `None`）
pub fn vertical_within(text: &str, offset: usize, desired_column: usize, down: bool) -> Option<usize> {
    let lines = sub_lines(text);
    let (current, _) = sub_line_at(text, offset);
    let target = if down {
        current + 1
    } else {
        current.checked_sub(1)?
    };
    let line = lines.get(target)?;
    Some(line.start + desired_column.min(line.len))
}
