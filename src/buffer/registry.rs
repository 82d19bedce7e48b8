//! 行レジストリ
//!
//! 文書順に並んだ編集可能リージョンのキャッシュ。ホストの構造変化のたびに
//! 丸ごと作り直すが、アクティブ行は古いインデックスではなくハンドルの同一性で
//! 探し直す。

use crate::host::{Host, RegionId};
use std::collections::HashSet;

/// レジストリの1行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEntry {
    pub position: usize,
    pub region: RegionId,
}

#[derive(Debug, Clone, Default)]
pub struct LineRegistry {
    entries: Vec<LineEntry>,
    /// 入力リスナーを取り付け済みのリージョン
    listening: HashSet<RegionId>,
}

impl LineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// ホストのリージョン集合から作り直す
    ///
    /// 新たに見つかったリージョンにだけ入力リスナーを付ける。
    /// 戻り値は `active` の新しいインデックス（消えていれば `None`）。
    pub fn refresh<H: Host + ?Sized>(&mut self, host: &mut H, active: Option<RegionId>) -> Option<usize> {
        let regions = host.regions();
        self.entries = regions
            .iter()
            .enumerate()
            .map(|(position, region)| LineEntry {
                position,
                region: *region,
            })
            .collect();

        for region in regions {
            if self.listening.insert(region) {
                host.attach_input_listener(region);
            }
        }

        active.and_then(|region| self.index_of(region))
    }

    /// すべてのリスナーを外す（セッション終了時）
    pub fn detach_all<H: Host + ?Sized>(&mut self, host: &mut H) {
        for region in self.listening.drain() {
            host.detach_input_listener(region);
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LineEntry] {
        &self.entries
    }

    pub fn region(&self, index: usize) -> Option<RegionId> {
        self.entries.get(index).map(|entry| entry.region)
    }

    pub fn index_of(&self, region: RegionId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.region == region)
    }

    pub fn contains(&self, region: RegionId) -> bool {
        self.index_of(region).is_some()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.entries.len().checked_sub(1)
    }

    /// `[0, len-1]` にクランプ（空なら `None`）
    pub fn clamp(&self, index: usize) -> Option<usize> {
        self.last_index().map(|last| index.min(last))
    }

    pub fn is_listening(&self, region: RegionId) -> bool {
        self.listening.contains(&region)
    }
}
