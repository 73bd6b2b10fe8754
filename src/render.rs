use image::{imageops, Rgb, RgbImage};

use crate::fit::FitRect;
use crate::font;
use crate::mask::MaskFace;
use crate::mesh::{Segment, WarpMesh, WarpTriangle};
use crate::pipeline::FaceResult;
use crate::region::RegionQuad;
use crate::sampler::{sample_bilinear, sample_quad, DestinationOrder};
use crate::types::PixelPoint;

/// Colors and sizes for the debug overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub detection: Rgb<u8>,
    pub score: Rgb<u8>,
    pub outline: Rgb<u8>,
    pub outline_alpha: f32,
    pub frame: Rgb<u8>,
    pub font_scale: u32,
    pub preview_size: u32,
    pub thumbnail_size: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            detection: Rgb([255, 0, 0]),
            score: Rgb([0, 255, 0]),
            outline: Rgb([255, 255, 255]),
            outline_alpha: 0.3,
            frame: Rgb([255, 255, 255]),
            font_scale: 2,
            preview_size: 100,
            thumbnail_size: 200,
        }
    }
}

fn in_bounds(canvas: &RgbImage, x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height()
}

/// Mixes `color` over the pixel at `(x, y)`; out-of-canvas writes are dropped.
pub fn blend_pixel(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, alpha: f32) {
    if !in_bounds(canvas, x, y) {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        let mixed = dst[c] as f32 * (1.0 - alpha) + color[c] as f32 * alpha;
        dst[c] = mixed.round() as u8;
    }
}

pub fn fill_rect(canvas: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, color: Rgb<u8>) {
    for py in y..y + h {
        for px in x..x + w {
            if in_bounds(canvas, px, py) {
                canvas.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// Rectangle outline drawn inward from `(x, y, w, h)`.
pub fn draw_rect(canvas: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, color: Rgb<u8>, thickness: i32) {
    let t = thickness.max(1);
    fill_rect(canvas, x, y, w, t, color);
    fill_rect(canvas, x, y + h - t, w, t, color);
    fill_rect(canvas, x, y, t, h, color);
    fill_rect(canvas, x + w - t, y, t, h, color);
}

/// One-pixel line, stepped once per pixel along the longer axis.
pub fn draw_line(canvas: &mut RgbImage, from: PixelPoint, to: PixelPoint, color: Rgb<u8>, alpha: f32) {
    if !(from.x.is_finite() && from.y.is_finite() && to.x.is_finite() && to.y.is_finite()) {
        return;
    }
    let steps = (to.x - from.x).abs().max((to.y - from.y).abs()).ceil().max(1.0);
    // Lines far outside the canvas are clipped by the pixel test, but cap the walk.
    let steps = steps.min(8192.0) as u32;

    for i in 0..=steps {
        let p = from.lerp(to, i as f32 / steps as f32);
        blend_pixel(canvas, p.x.floor() as i32, p.y.floor() as i32, color, alpha);
    }
}

/// Text on a filled background box.
pub fn draw_label(canvas: &mut RgbImage, x: i32, y: i32, text: &str, fg: Rgb<u8>, bg: Rgb<u8>, scale: u32) {
    let w = font::measure_text_width(text, scale) as i32 + scale as i32;
    let h = font::line_height(scale) as i32 + scale as i32;
    fill_rect(canvas, x, y, w, h, bg);
    font::draw_text(canvas, x + scale as i32, y + scale as i32, text, fg, scale);
}

/// Scaled copy of `image` into the fitted rectangle.
pub fn blit_fitted(canvas: &mut RgbImage, image: &RgbImage, fit: &FitRect) {
    if fit.width <= 0 || fit.height <= 0 {
        return;
    }
    let (src_w, src_h) = image.dimensions();
    let sx = src_w as f32 / fit.width as f32;
    let sy = src_h as f32 / fit.height as f32;

    for dy in 0..fit.height {
        for dx in 0..fit.width {
            let (px, py) = (fit.x + dx, fit.y + dy);
            if !in_bounds(canvas, px, py) {
                continue;
            }
            let color = sample_bilinear(image, (dx as f32 + 0.5) * sx - 0.5, (dy as f32 + 0.5) * sy - 0.5);
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }
}

/// Raw detection boxes, score in percent and keypoints.
pub fn draw_detections(canvas: &mut RgbImage, fit: &FitRect, regions: &[RegionQuad], style: &OverlayStyle) {
    for region in regions {
        let tl = fit.to_pixels(region.topleft);
        let br = fit.to_pixels(region.btmright);
        let (x, y) = (tl.x as i32, tl.y as i32);

        draw_rect(canvas, x, y, (br.x - tl.x) as i32, (br.y - tl.y) as i32, style.detection, 2);

        let label = format!("{}", (region.score * 100.0) as i32);
        draw_label(canvas, x, y, &label, Rgb([255, 255, 255]), style.detection, style.font_scale);

        let r = 4;
        for key in &region.keypoints {
            let p = fit.to_pixels(*key);
            fill_rect(canvas, p.x as i32 - r / 2, p.y as i32 - r / 2, r, r, style.detection);
        }
    }
}

/// Upright preview of the face region at `(x, y)`, framed.
pub fn draw_preview(
    canvas: &mut RgbImage,
    image: &RgbImage,
    region: &RegionQuad,
    (x, y, w, h): (i32, i32, i32, i32),
    style: &OverlayStyle,
) {
    let quad = sample_quad(region, DestinationOrder::Preview);
    let (src_w, src_h) = image.dimensions();

    for dy in 0..h {
        for dx in 0..w {
            let (px, py) = (x + dx, y + dy);
            if !in_bounds(canvas, px, py) {
                continue;
            }
            let uv = quad.sample_position((dx as f32 + 0.5) / w as f32, (dy as f32 + 0.5) / h as f32);
            let color = sample_bilinear(image, uv.x * src_w as f32 - 0.5, uv.y * src_h as f32 - 0.5);
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }

    draw_rect(canvas, x, y, w, h, style.frame, 2);
}

/// Texture-mapped fill of one triangle. Both windings are filled; triangles
/// with no area or non-finite vertices produce no pixels.
pub fn fill_textured_triangle(canvas: &mut RgbImage, triangle: &WarpTriangle, texture: &RgbImage) {
    let area = triangle.signed_area();
    if area == 0.0 || !area.is_finite() {
        return;
    }

    let [a, b, c] = triangle.positions;
    let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as i32;
    let max_x = a.x.max(b.x).max(c.x).ceil().min(canvas.width() as f32) as i32;
    let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as i32;
    let max_y = a.y.max(b.y).max(c.y).ceil().min(canvas.height() as f32) as i32;

    let (tex_w, tex_h) = texture.dimensions();
    let [ta, tb, tc] = triangle.texcoords;

    for py in min_y..max_y {
        for px in min_x..max_x {
            let x = px as f32 + 0.5;
            let y = py as f32 + 0.5;

            // Barycentric weights, normalized by the signed area so both
            // windings give positive weights inside.
            let wa = ((b.x - x) * (c.y - y) - (c.x - x) * (b.y - y)) / area;
            let wb = ((c.x - x) * (a.y - y) - (a.x - x) * (c.y - y)) / area;
            let wc = 1.0 - wa - wb;
            if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                continue;
            }

            let u = wa * ta.x + wb * tb.x + wc * tc.x;
            let v = wa * ta.y + wb * tb.y + wc * tc.y;
            let color = sample_bilinear(texture, u * tex_w as f32 - 0.5, v * tex_h as f32 - 0.5);
            if in_bounds(canvas, px, py) {
                canvas.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

pub fn draw_segments(canvas: &mut RgbImage, segments: &[Segment], color: Rgb<u8>, alpha: f32) {
    for s in segments {
        draw_line(canvas, s.from, s.to, color, alpha);
    }
}

/// The mask texture warped onto the live face, then the wireframe if the
/// mesh carries one.
pub fn draw_warp_mesh(canvas: &mut RgbImage, mesh: &WarpMesh, texture: &RgbImage, style: &OverlayStyle) {
    for triangle in &mesh.triangles {
        fill_textured_triangle(canvas, triangle, texture);
    }
    draw_segments(canvas, &mesh.outline, style.outline, style.outline_alpha);
}

/// `score:NN.N` label at the top right of the canvas, `row` lines down.
pub fn draw_mesh_score(canvas: &mut RgbImage, row: usize, confidence: f32, style: &OverlayStyle) {
    let text = format!("score:{:4.1}", confidence * 100.0);
    let x = canvas.width() as i32 - font::measure_text_width(&text, style.font_scale) as i32 - 10;
    let y = row as i32 * (font::line_height(style.font_scale) + 2 * style.font_scale) as i32;
    draw_label(canvas, x, y, &text, Rgb([255, 255, 255]), style.score, style.font_scale);
}

/// Scaled copy of `texture` into a square thumbnail, framed.
pub fn draw_thumbnail(canvas: &mut RgbImage, texture: &RgbImage, x: i32, y: i32, size: i32, style: &OverlayStyle) {
    let rect = FitRect {
        x,
        y,
        width: size,
        height: size,
    };
    blit_fitted(canvas, texture, &rect);
    draw_rect(canvas, x, y, size, size, style.frame, 2);
}

/// Everything one output frame shows.
pub struct Scene<'a> {
    pub source: &'a RgbImage,
    pub fit: FitRect,
    pub detections: &'a [RegionQuad],
    pub faces: &'a [FaceResult],
    pub mask: &'a MaskFace,
    /// Drawn over the source on the left panel.
    pub overlay_meshes: &'a [WarpMesh],
    /// Drawn on black on the right panel, usually with outlines.
    pub wireframe_meshes: &'a [WarpMesh],
}

/// Two `width x height` panels side by side: the annotated source with the
/// mask applied, and the warped mask alone on black. Face previews are
/// stacked down the top right of the left panel, the score label sits on
/// both panels, and the active mask's thumbnail is on the right panel only.
pub fn compose_scene(scene: &Scene, width: u32, height: u32, style: &OverlayStyle) -> RgbImage {
    let mut left = RgbImage::new(width, height);
    blit_fitted(&mut left, scene.source, &scene.fit);
    draw_detections(&mut left, &scene.fit, scene.detections, style);

    let preview = style.preview_size as i32;
    for (face_id, region) in scene.detections.iter().enumerate() {
        let x = width as i32 - preview - 10;
        let y = preview * face_id as i32 + 10;
        draw_preview(&mut left, scene.source, region, (x, y, preview, preview), style);
    }

    for mesh in scene.overlay_meshes {
        draw_warp_mesh(&mut left, mesh, &scene.mask.texture, style);
    }

    let mut right = RgbImage::new(width, height);
    for mesh in scene.wireframe_meshes {
        draw_warp_mesh(&mut right, mesh, &scene.mask.texture, style);
    }

    for (row, face) in scene.faces.iter().enumerate() {
        draw_mesh_score(&mut left, row, face.landmarks.confidence, style);
        draw_mesh_score(&mut right, row, face.landmarks.confidence, style);
    }

    draw_thumbnail(&mut right, &scene.mask.texture, 10, 10, style.thumbnail_size as i32, style);

    let mut out = RgbImage::new(width * 2, height);
    imageops::replace(&mut out, &left, 0, 0);
    imageops::replace(&mut out, &right, width as i64, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshAssembler, MeshStyle, Triangulation};
    use crate::types::{LandmarkSet, Point2, Point3, ReprojectedLandmarkSet, Size, SourcePoint};
    use std::sync::Arc;

    fn triangle(points: [(f32, f32); 3], tex: [(f32, f32); 3]) -> WarpTriangle {
        WarpTriangle {
            positions: points.map(|(x, y)| Point3::new(x, y, 0.0)),
            texcoords: tex.map(|(u, v)| Point2::new(u, v)),
        }
    }

    #[test]
    fn blend_half_way() {
        let mut canvas = RgbImage::new(1, 1);
        blend_pixel(&mut canvas, 0, 0, Rgb([200, 100, 0]), 0.5);
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([100, 50, 0]));
        blend_pixel(&mut canvas, 5, 5, Rgb([255, 255, 255]), 1.0);
    }

    #[test]
    fn rect_outline_leaves_inside_untouched() {
        let mut canvas = RgbImage::new(10, 10);
        draw_rect(&mut canvas, 0, 0, 10, 10, Rgb([255, 0, 0]), 2);
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(canvas.get_pixel(8, 9), &Rgb([255, 0, 0]));
        assert_eq!(canvas.get_pixel(5, 5), &Rgb([0, 0, 0]));
    }

    #[test]
    fn line_reaches_both_ends() {
        let mut canvas = RgbImage::new(10, 10);
        draw_line(&mut canvas, Point2::new(1.0, 1.0), Point2::new(8.0, 5.0), Rgb([0, 255, 0]), 1.0);
        assert_eq!(canvas.get_pixel(1, 1), &Rgb([0, 255, 0]));
        assert_eq!(canvas.get_pixel(8, 5), &Rgb([0, 255, 0]));
        draw_line(&mut canvas, Point2::new(f32::NAN, 1.0), Point2::new(8.0, 5.0), Rgb([0, 0, 255]), 1.0);
    }

    #[test]
    fn textured_triangle_fills_either_winding() {
        let texture = RgbImage::from_pixel(4, 4, Rgb([10, 200, 30]));
        let cw = triangle([(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)], [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let ccw = triangle([(0.0, 0.0), (0.0, 20.0), (20.0, 0.0)], [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0)]);

        for t in [cw, ccw] {
            let mut canvas = RgbImage::new(20, 20);
            fill_textured_triangle(&mut canvas, &t, &texture);
            assert_eq!(canvas.get_pixel(2, 2), &Rgb([10, 200, 30]));
            assert_eq!(canvas.get_pixel(18, 18), &Rgb([0, 0, 0]));
        }
    }

    #[test]
    fn degenerate_triangle_draws_nothing() {
        let texture = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));
        let flat = triangle([(0.0, 0.0), (5.0, 5.0), (10.0, 10.0)], [(0.0, 0.0); 3]);
        let mut canvas = RgbImage::new(12, 12);
        fill_textured_triangle(&mut canvas, &flat, &texture);
        assert!(canvas.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn fitted_blit_stays_in_rect() {
        let image = RgbImage::from_pixel(4, 2, Rgb([50, 60, 70]));
        let mut canvas = RgbImage::new(8, 8);
        blit_fitted(&mut canvas, &image, &FitRect { x: 0, y: 2, width: 8, height: 4 });
        assert_eq!(canvas.get_pixel(0, 1), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(0, 2), &Rgb([50, 60, 70]));
        assert_eq!(canvas.get_pixel(7, 5), &Rgb([50, 60, 70]));
        assert_eq!(canvas.get_pixel(7, 6), &Rgb([0, 0, 0]));
    }

    #[test]
    fn preview_shows_region_content() {
        let image = RgbImage::from_fn(8, 8, |x, _| if x < 4 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) });
        let left = RegionQuad::from_rotated(SourcePoint::new(0.25, 0.5), Size::new(0.5, 1.0), 0.0);
        let mut canvas = RgbImage::new(20, 20);
        draw_preview(&mut canvas, &image, &left, (5, 5, 10, 10), &OverlayStyle::default());

        assert_eq!(canvas.get_pixel(10, 10), &Rgb([255, 0, 0]));
        assert_eq!(canvas.get_pixel(5, 5), &Rgb([255, 255, 255]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn score_label_sits_top_right() {
        let mut canvas = RgbImage::new(200, 40);
        draw_mesh_score(&mut canvas, 0, 0.935, &OverlayStyle::default());
        assert_eq!(canvas.get_pixel(199, 0), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert!((100..200).any(|x| *canvas.get_pixel(x, 0) == Rgb([0, 255, 0])));
    }

    #[test]
    fn scene_has_two_panels() {
        let joints = |pts: [(f32, f32); 3]| ReprojectedLandmarkSet {
            joints: pts.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect(),
            confidence: 0.9,
        };
        let live = joints([(0.2, 0.2), (0.8, 0.2), (0.2, 0.8)]);
        let mask = MaskFace {
            name: "green".to_string(),
            texture: RgbImage::from_pixel(4, 4, Rgb([0, 200, 0])),
            region: RegionQuad::from_rotated(SourcePoint::new(0.5, 0.5), Size::new(1.0, 1.0), 0.0),
            landmarks: joints([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]),
        };
        let face = FaceResult {
            face_id: 0,
            region: mask.region.clone(),
            landmarks: LandmarkSet::new(Vec::new(), 0.9),
            reprojected: live.clone(),
        };

        let triangulation = Arc::new(Triangulation::new(&[0, 1, 2], 3).unwrap());
        let fit = FitRect { x: 0, y: 0, width: 100, height: 100 };
        let plain = MeshAssembler::new(triangulation.clone(), MeshStyle { outline: false });
        let wired = MeshAssembler::new(triangulation, MeshStyle { outline: true });
        let overlay = [plain.assemble(&live, &fit, &mask.landmarks)];
        let wireframe = [wired.assemble(&live, &fit, &mask.landmarks)];

        let source = RgbImage::from_pixel(10, 10, Rgb([90, 90, 90]));
        let detections = [face.region.clone()];
        let faces = [face];
        let scene = Scene {
            source: &source,
            fit,
            detections: &detections,
            faces: &faces,
            mask: &mask,
            overlay_meshes: &overlay,
            wireframe_meshes: &wireframe,
        };
        let style = OverlayStyle {
            preview_size: 10,
            thumbnail_size: 8,
            ..OverlayStyle::default()
        };

        let out = compose_scene(&scene, 100, 100, &style);
        assert_eq!(out.dimensions(), (200, 100));
        // Mask warped over the source on the left, alone on the right.
        assert_eq!(out.get_pixel(30, 30), &Rgb([0, 200, 0]));
        assert_eq!(out.get_pixel(130, 30), &Rgb([0, 200, 0]));
        assert_eq!(out.get_pixel(60, 60), &Rgb([90, 90, 90]));
        assert_eq!(out.get_pixel(190, 90), &Rgb([0, 0, 0]));
        // Preview frame at the top right of the left panel.
        assert_eq!(out.get_pixel(80, 19), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(85, 15), &Rgb([90, 90, 90]));
        // Thumbnail frame on the right panel only.
        assert_eq!(out.get_pixel(110, 17), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(10, 17), &Rgb([90, 90, 90]));
        // Score label on both panels, top right.
        assert!((50..100).any(|x| *out.get_pixel(x, 0) == Rgb([0, 255, 0])));
        assert!((150..200).any(|x| *out.get_pixel(x, 0) == Rgb([0, 255, 0])));
    }
}
