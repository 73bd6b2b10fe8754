//! Letterbox / pillarbox placement of an image inside a fixed viewport.
//!
//! ```text
//!                      Portrait
//!     Landscape        +------+
//!     +-+------+-+     +------+
//!     | |      | |     |      |
//!     | |      | |     |      |
//!     +-+------+-+     +------+
//!                      +------+
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{Pixel, Point2, Size, Source};

/// Where a source image lands in the viewport, in whole pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FitRect {
    pub fn to_pixels(&self, p: Point2<Source>) -> Point2<Pixel> {
        Point2::new(
            p.x * self.width as f32 + self.x as f32,
            p.y * self.height as f32 + self.y as f32,
        )
    }
}

/// Largest rectangle with the texture's aspect ratio that fits the viewport,
/// centred along the axis that does not fill. Equal aspects take the
/// width-constrained branch. Both sizes must be positive.
pub fn fit_to_viewport(texture: Size, viewport: Size) -> FitRect {
    let win_aspect = viewport.aspect();
    let tex_aspect = texture.aspect();

    let (scaled_w, scaled_h, offset_x, offset_y) = if win_aspect > tex_aspect {
        let scale = viewport.height / texture.height;
        let scaled_w = scale * texture.width;
        let scaled_h = scale * texture.height;
        (scaled_w, scaled_h, (viewport.width - scaled_w) * 0.5, 0.0)
    } else {
        let scale = viewport.width / texture.width;
        let scaled_w = scale * texture.width;
        let scaled_h = scale * texture.height;
        (scaled_w, scaled_h, 0.0, (viewport.height - scaled_h) * 0.5)
    };

    FitRect {
        x: offset_x as i32,
        y: offset_y as i32,
        width: scaled_w as i32,
        height: scaled_h as i32,
    }
}
