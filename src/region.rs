use serde::{Deserialize, Serialize};

use crate::reproject::map_crop_point;
use crate::types::{Crop, Point2, Size, SourcePoint};

/// Smallest extent a region is treated as having when mapping into crop space.
pub const MIN_REGION_EXTENT: f32 = 1e-6;

/// Corner positions of a [`RegionQuad`], in winding order.
///
/// ```text
///    0--------1
///    |        |
///    |        |
///    3--------2
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Where this corner sits in crop space.
    pub fn crop_position(self) -> Point2<Crop> {
        match self {
            Corner::TopLeft => Point2::new(0.0, 0.0),
            Corner::TopRight => Point2::new(1.0, 0.0),
            Corner::BottomRight => Point2::new(1.0, 1.0),
            Corner::BottomLeft => Point2::new(0.0, 1.0),
        }
    }
}

/// A rotated face region produced by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionQuad {
    /// Indexed by [`Corner`].
    pub corners: [SourcePoint; 4],
    pub center: SourcePoint,
    pub size: Size,
    /// Radians, any real value.
    pub rotation: f32,
    /// Axis-aligned box, only used to draw the raw detection.
    pub topleft: SourcePoint,
    pub btmright: SourcePoint,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub keypoints: Vec<SourcePoint>,
}

impl RegionQuad {
    /// Builds a region whose corners are the crop corners pushed through the
    /// same map the landmark reprojection uses, so sampling and reprojection
    /// agree by construction.
    pub fn from_rotated(center: SourcePoint, size: Size, rotation: f32) -> Self {
        let corners = Corner::ALL.map(|corner| {
            let p = corner.crop_position();
            let (x, y) = map_crop_point(p.x, p.y, center, size, rotation);
            SourcePoint::new(x, y)
        });

        let (topleft, btmright) = bounding_box(&corners);

        Self {
            corners,
            center,
            size,
            rotation,
            topleft,
            btmright,
            score: 0.0,
            keypoints: Vec::new(),
        }
    }

    /// The whole source, upright. Used when no face was detected.
    pub fn full_frame() -> Self {
        Self::from_rotated(SourcePoint::new(0.5, 0.5), Size::new(1.0, 1.0), 0.0)
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn with_keypoints(mut self, keypoints: Vec<SourcePoint>) -> Self {
        self.keypoints = keypoints;
        self
    }

    pub fn corner(&self, corner: Corner) -> SourcePoint {
        self.corners[corner.index()]
    }

    /// Inverse of the landmark reprojection: source space back into crop space.
    /// Extents are clamped to [`MIN_REGION_EXTENT`] so a collapsed region
    /// yields huge but finite coordinates instead of dividing by zero.
    pub fn source_to_crop(&self, p: SourcePoint) -> Point2<Crop> {
        let w = self.size.width.max(MIN_REGION_EXTENT);
        let h = self.size.height.max(MIN_REGION_EXTENT);

        let x = (p.x - self.center.x) / w;
        let y = (p.y - self.center.y) / h;

        let (sin, cos) = self.rotation.sin_cos();
        let rx = x * cos + y * sin;
        let ry = -x * sin + y * cos;

        Point2::new(rx + 0.5, ry + 0.5)
    }
}

fn bounding_box(points: &[SourcePoint]) -> (SourcePoint, SourcePoint) {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;

    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    (SourcePoint::new(min_x, min_y), SourcePoint::new(max_x, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: SourcePoint, b: SourcePoint) -> bool {
        a.distance(b) < 1e-5
    }

    #[test]
    fn upright_region_corners() {
        let region = RegionQuad::from_rotated(SourcePoint::new(0.5, 0.5), Size::new(0.2, 0.4), 0.0);

        assert!(close(region.corner(Corner::TopLeft), SourcePoint::new(0.4, 0.3)));
        assert!(close(region.corner(Corner::TopRight), SourcePoint::new(0.6, 0.3)));
        assert!(close(region.corner(Corner::BottomRight), SourcePoint::new(0.6, 0.7)));
        assert!(close(region.corner(Corner::BottomLeft), SourcePoint::new(0.4, 0.7)));
        assert!(close(region.topleft, SourcePoint::new(0.4, 0.3)));
        assert!(close(region.btmright, SourcePoint::new(0.6, 0.7)));
    }

    #[test]
    fn quarter_turn_keeps_winding() {
        let region =
            RegionQuad::from_rotated(SourcePoint::new(0.5, 0.5), Size::new(0.2, 0.2), FRAC_PI_2);

        // Top-left of the crop swings to the top-right of the source.
        assert!(close(region.corner(Corner::TopLeft), SourcePoint::new(0.6, 0.4)));
        assert!(close(region.corner(Corner::TopRight), SourcePoint::new(0.6, 0.6)));
        assert!(close(region.corner(Corner::BottomRight), SourcePoint::new(0.4, 0.6)));
        assert!(close(region.corner(Corner::BottomLeft), SourcePoint::new(0.4, 0.4)));
    }

    #[test]
    fn source_to_crop_recovers_crop_corners() {
        let region =
            RegionQuad::from_rotated(SourcePoint::new(0.3, 0.6), Size::new(0.25, 0.15), 0.7);

        for corner in Corner::ALL {
            let back = region.source_to_crop(region.corner(corner));
            let expected = corner.crop_position();
            assert!((back.x - expected.x).abs() < 1e-4, "{:?}: {:?}", corner, back);
            assert!((back.y - expected.y).abs() < 1e-4, "{:?}: {:?}", corner, back);
        }
    }

    #[test]
    fn zero_size_region_stays_finite() {
        let region = RegionQuad::from_rotated(SourcePoint::new(0.5, 0.5), Size::new(0.0, 0.0), 0.3);

        let p = region.source_to_crop(SourcePoint::new(0.6, 0.4));
        assert!(p.x.is_finite());
        assert!(p.y.is_finite());

        let center = region.source_to_crop(region.center);
        assert_eq!((center.x, center.y), (0.5, 0.5));
    }

    #[test]
    fn deserializes_recorded_detection() {
        let json = r#"{
            "corners": [{"x":0.1,"y":0.1},{"x":0.3,"y":0.1},{"x":0.3,"y":0.3},{"x":0.1,"y":0.3}],
            "center": {"x":0.2,"y":0.2},
            "size": {"width":0.2,"height":0.2},
            "rotation": 0.0,
            "topleft": {"x":0.1,"y":0.1},
            "btmright": {"x":0.3,"y":0.3},
            "score": 0.93
        }"#;
        let region: RegionQuad = serde_json::from_str(json).unwrap();
        assert_eq!(region.corner(Corner::BottomLeft), SourcePoint::new(0.1, 0.3));
        assert!(region.keypoints.is_empty());
        assert_eq!(region.score, 0.93);
    }
}
