//! Relative placement to absolute PDF coordinates
//!
//! Placement requests are expressed as percentages of the page, with the PDF
//! convention for the vertical axis: `y_percent = 0` is the bottom edge and
//! `y_percent = 100` the top edge. Horizontal placement is centred on the
//! chosen percentage; vertical placement anchors the bottom of the image.
//!
//! Nothing here clamps to the page: extreme percentages produce boxes that
//! hang off the page, and that is accepted as-is.

use serde::{Deserialize, Serialize};

use crate::document::PageSize;

/// Where, on which page and how large a signature should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementRequest {
    /// 0-based page index
    pub page_index: usize,
    pub x_percent: f64,
    pub y_percent: f64,
    pub scale: f64,
}

/// Reference box the signature is drawn into before scaling, in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseBox {
    pub width: f64,
    pub height: f64,
}

impl Default for BaseBox {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 100.0,
        }
    }
}

/// Absolute drawing box on a page, bottom-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
}

impl PlacementRequest {
    /// Resolve against a page size and reference box
    pub fn resolve(&self, page: PageSize, base: BaseBox) -> Placement {
        resolve(
            page.width,
            page.height,
            self.x_percent,
            self.y_percent,
            self.scale,
            base.width,
            base.height,
        )
    }
}

/// Convert percentage coordinates and a scale factor into an absolute box
pub fn resolve(
    page_width: f64,
    page_height: f64,
    x_percent: f64,
    y_percent: f64,
    scale: f64,
    base_width: f64,
    base_height: f64,
) -> Placement {
    let draw_width = base_width * scale;
    let draw_height = base_height * scale;

    Placement {
        x: (page_width * x_percent / 100.0) - (draw_width / 2.0),
        y: page_height * y_percent / 100.0,
        draw_width,
        draw_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_letter_page_scenario() {
        let placement = resolve(612.0, 792.0, 50.0, 10.0, 1.0, 200.0, 100.0);
        assert!(approx(placement.x, 206.0));
        assert!(approx(placement.y, 79.2));
        assert_eq!(placement.draw_width, 200.0);
        assert_eq!(placement.draw_height, 100.0);
    }

    #[test]
    fn test_request_resolve_matches_free_function() {
        let request = PlacementRequest {
            page_index: 1,
            x_percent: 25.0,
            y_percent: 80.0,
            scale: 1.5,
        };
        let placement = request.resolve(PageSize::a4(), BaseBox::default());
        assert_eq!(
            placement,
            resolve(595.0, 842.0, 25.0, 80.0, 1.5, 200.0, 100.0)
        );
        assert_eq!(placement.draw_width, 300.0);
        assert_eq!(placement.draw_height, 150.0);
    }

    #[test]
    fn test_bottom_is_zero_top_is_height() {
        let bottom = resolve(612.0, 792.0, 0.0, 0.0, 1.0, 200.0, 100.0);
        let top = resolve(612.0, 792.0, 0.0, 100.0, 1.0, 200.0, 100.0);
        assert_eq!(bottom.y, 0.0);
        assert_eq!(top.y, 792.0);
    }

    #[test]
    fn test_left_edge_hangs_off_page() {
        // Centring at x = 0 puts half the signature left of the page
        let placement = resolve(612.0, 792.0, 0.0, 50.0, 1.0, 200.0, 100.0);
        assert_eq!(placement.x, -100.0);
    }

    #[test]
    fn test_out_of_range_percent_is_not_clamped() {
        let placement = resolve(612.0, 792.0, 150.0, -10.0, 1.0, 200.0, 100.0);
        assert!(approx(placement.x, 918.0 - 100.0));
        assert!(approx(placement.y, -79.2));
    }

    #[test]
    fn test_scale_does_not_move_vertical_anchor() {
        let small = resolve(612.0, 792.0, 50.0, 40.0, 0.5, 200.0, 100.0);
        let large = resolve(612.0, 792.0, 50.0, 40.0, 2.0, 200.0, 100.0);
        assert_eq!(small.y, large.y);
        assert!(approx(small.x + small.draw_width / 2.0, large.x + large.draw_width / 2.0));
    }
}
