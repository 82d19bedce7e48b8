//! ビューポート
//!
//! ページ単位のスクロール量と、スクロール後にキャレットを画面内へ追従させる計算。

use crate::host::{Rect, ScrollRequest};

/// スクロール量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollAmount {
    /// `C-d`
    HalfPageDown,
    /// `C-u`
    HalfPageUp,
    /// `C-f`
    PageDown,
    /// `C-b`
    PageUp,
}

impl ScrollAmount {
    /// ビューポート高さに対する割合（上方向は負）
    pub fn fraction(self, half_page: f64) -> f64 {
        match self {
            ScrollAmount::HalfPageDown => half_page,
            ScrollAmount::HalfPageUp => -half_page,
            ScrollAmount::PageDown => 1.0,
            ScrollAmount::PageUp => -1.0,
        }
    }

    pub fn request(self, half_page: f64) -> ScrollRequest {
        ScrollRequest::Fraction(self.fraction(half_page))
    }
}

/// スクロール後にキャレットを移す行
///
/// アクティブ行が見えていれば `None`。画面より上に外れたら最初の可視行、
/// 下に外れたら最後の可視行を返す。
pub fn follow_scroll(rects: &[Option<Rect>], active: usize, viewport: &Rect) -> Option<usize> {
    let visible = |rect: &Option<Rect>| rect.map_or(false, |rect| rect.intersects(viewport));

    let current = rects.get(active).copied().flatten();
    if let Some(rect) = current {
        if rect.intersects(viewport) {
            return None;
        }
    }

    let above = current.map_or(true, |rect| rect.bottom() <= viewport.y);
    if above {
        rects.iter().position(visible)
    } else {
        rects.iter().rposition(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(count: usize) -> Vec<Option<Rect>> {
        (0..count)
            .map(|index| Some(Rect::new(0.0, index as f64 * 20.0, 100.0, 20.0)))
            .collect()
    }

    #[test]
    fn fractions() {
        assert_eq!(ScrollAmount::HalfPageUp.fraction(0.5), -0.5);
        assert_eq!(ScrollAmount::PageDown.request(0.5), ScrollRequest::Fraction(1.0));
    }

    #[test]
    fn visible_caret_stays() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(follow_scroll(&rows(10), 3, &viewport), None);
    }

    #[test]
    fn caret_above_viewport_moves_to_first_visible() {
        let viewport = Rect::new(0.0, 100.0, 100.0, 100.0);
        assert_eq!(follow_scroll(&rows(20), 0, &viewport), Some(5));
    }

    #[test]
    fn caret_below_viewport_moves_to_last_visible() {
        let viewport = Rect::new(0.0, 100.0, 100.0, 100.0);
        assert_eq!(follow_scroll(&rows(20), 15, &viewport), Some(9));
    }

    #[test]
    fn nothing_visible() {
        let viewport = Rect::new(0.0, 1_000.0, 100.0, 100.0);
        assert_eq!(follow_scroll(&rows(3), 0, &viewport), None);
    }
}
