//! ブロックキャレットの配置計算
//!
//! 描画はホストの仕事。ここでは矩形だけを決める。

use crate::host::Rect;
use crate::input::mode::Mode;

/// キャレットオーバーレイの矩形（`None` なら非表示）
///
/// - キャレット下に文字があればその矩形（最小幅まで広げる）
/// - 行末なら直前の文字の右隣
/// - 空のリージョンならリージョンの左端
pub fn overlay_rect(
    mode: Mode,
    char_rect: Option<Rect>,
    prev_char_rect: Option<Rect>,
    region_rect: Option<Rect>,
    min_width: f64,
) -> Option<Rect> {
    if matches!(mode, Mode::Insert | Mode::LinkHint) {
        return None;
    }
    if let Some(rect) = char_rect {
        return Some(Rect::new(rect.x, rect.y, rect.width.max(min_width), rect.height));
    }
    if let Some(prev) = prev_char_rect {
        return Some(Rect::new(prev.right(), prev.y, min_width, prev.height));
    }
    region_rect.map(|region| Rect::new(region.x, region.y, min_width, region.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_in_insert_and_link_hint() {
        let rect = Some(Rect::new(0.0, 0.0, 8.0, 20.0));
        assert_eq!(overlay_rect(Mode::Insert, rect, None, None, 8.0), None);
        assert_eq!(overlay_rect(Mode::LinkHint, rect, None, None, 8.0), None);
    }

    #[test]
    fn narrow_glyph_is_widened() {
        let rect = Some(Rect::new(16.0, 40.0, 3.0, 20.0));
        assert_eq!(
            overlay_rect(Mode::Normal, rect, None, None, 8.0),
            Some(Rect::new(16.0, 40.0, 8.0, 20.0))
        );
    }

    #[test]
    fn end_of_line_follows_previous_char() {
        let prev = Some(Rect::new(16.0, 40.0, 8.0, 20.0));
        assert_eq!(
            overlay_rect(Mode::Visual, None, prev, None, 8.0),
            Some(Rect::new(24.0, 40.0, 8.0, 20.0))
        );
    }

    #[test]
    fn empty_region_uses_left_edge() {
        let region = Some(Rect::new(0.0, 60.0, 800.0, 20.0));
        assert_eq!(
            overlay_rect(Mode::Normal, None, None, region, 8.0),
            Some(Rect::new(0.0, 60.0, 8.0, 20.0))
        );
        assert_eq!(overlay_rect(Mode::Normal, None, None, None, 8.0), None);
    }
}
