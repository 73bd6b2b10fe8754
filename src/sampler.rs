use image::{Rgb, RgbImage};

use crate::region::{Corner, RegionQuad};
use crate::types::SourcePoint;

/// Order in which the destination rectangle's corners are listed for a
/// textured draw. Corner `i` of the destination samples
/// `region.corners[permutation()[i]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationOrder {
    /// Bottom-left, top-left, bottom-right, top-right. Used for the
    /// landmark estimator input, which is read back bottom-up.
    LandmarkInput,
    /// Top-left, bottom-left, top-right, bottom-right. Used for the on-screen
    /// preview of the cropped face.
    Preview,
}

impl DestinationOrder {
    pub fn permutation(self) -> [Corner; 4] {
        match self {
            DestinationOrder::LandmarkInput => [
                Corner::BottomLeft,
                Corner::TopLeft,
                Corner::BottomRight,
                Corner::TopRight,
            ],
            DestinationOrder::Preview => [
                Corner::TopLeft,
                Corner::BottomLeft,
                Corner::TopRight,
                Corner::BottomRight,
            ],
        }
    }
}

/// Four `(u, v)` texture coordinates, one per destination corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexQuad {
    pub order: DestinationOrder,
    pub coords: [SourcePoint; 4],
}

impl TexQuad {
    /// Texture coordinate at a named corner of the destination rectangle.
    /// Both orders list destination corners under the same name as the
    /// source corner they sample.
    pub fn at(&self, corner: Corner) -> SourcePoint {
        let slot = self
            .order
            .permutation()
            .iter()
            .position(|c| *c == corner)
            .unwrap_or(corner.index());
        self.coords[slot]
    }

    /// Texture coordinate seen at normalized destination `(u, v)`, top-left origin.
    pub fn sample_position(&self, u: f32, v: f32) -> SourcePoint {
        let top = self.at(Corner::TopLeft).lerp(self.at(Corner::TopRight), u);
        let bottom = self.at(Corner::BottomLeft).lerp(self.at(Corner::BottomRight), u);
        top.lerp(bottom, v)
    }

    /// The interleaved `u0 v0 u1 v1 ...` layout a texturing primitive takes.
    pub fn flat(&self) -> [f32; 8] {
        let mut out = [0.0; 8];
        for (i, p) in self.coords.iter().enumerate() {
            out[i * 2] = p.x;
            out[i * 2 + 1] = p.y;
        }
        out
    }
}

/// Texture coordinates that resample `region` into an upright crop.
pub fn sample_quad(region: &RegionQuad, order: DestinationOrder) -> TexQuad {
    TexQuad {
        order,
        coords: order.permutation().map(|corner| region.corner(corner)),
    }
}

/// Texture coordinates used when no face was detected: the whole source,
/// in the landmark input order.
pub fn full_frame_quad() -> TexQuad {
    TexQuad {
        order: DestinationOrder::LandmarkInput,
        coords: [
            SourcePoint::new(0.0, 1.0),
            SourcePoint::new(0.0, 0.0),
            SourcePoint::new(1.0, 1.0),
            SourcePoint::new(1.0, 0.0),
        ],
    }
}

/// Source position seen by the crop at normalized `(u, v)`, top-left origin.
pub fn crop_sample_position(region: &RegionQuad, u: f32, v: f32) -> SourcePoint {
    sample_quad(region, DestinationOrder::LandmarkInput).sample_position(u, v)
}

/// Resamples the rotated region of `image` into an upright `width x height`
/// crop. Pixels that fall outside the source come out black.
pub fn warp_region(image: &RgbImage, region: &RegionQuad, width: u32, height: u32) -> RgbImage {
    warp_quad(image, &sample_quad(region, DestinationOrder::LandmarkInput), width, height)
}

/// Resamples `image` through any texture quad, top-left origin.
pub fn warp_quad(image: &RgbImage, quad: &TexQuad, width: u32, height: u32) -> RgbImage {
    let (src_w, src_h) = image.dimensions();
    let mut out = RgbImage::new(width, height);

    for y in 0..height {
        let v = (y as f32 + 0.5) / height as f32;
        for x in 0..width {
            let u = (x as f32 + 0.5) / width as f32;
            let p = quad.sample_position(u, v);
            let px = sample_bilinear(image, p.x * src_w as f32 - 0.5, p.y * src_h as f32 - 0.5);
            out.put_pixel(x, y, px);
        }
    }

    out
}

/// Bilinear lookup at pixel-centre coordinates, black outside the image.
pub fn sample_bilinear(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (w, h) = image.dimensions();
    if !(x.is_finite() && y.is_finite()) || w == 0 || h == 0 {
        return Rgb([0, 0, 0]);
    }
    if x < -0.5 || y < -0.5 || x > w as f32 - 0.5 || y > h as f32 - 0.5 {
        return Rgb([0, 0, 0]);
    }

    let x = x.clamp(0.0, (w - 1) as f32);
    let y = y.clamp(0.0, (h - 1) as f32);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = image.get_pixel(x0, y0);
    let p10 = image.get_pixel(x1, y0);
    let p01 = image.get_pixel(x0, y1);
    let p11 = image.get_pixel(x1, y1);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}
