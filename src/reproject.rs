use serde::{Deserialize, Serialize};

use crate::fit::FitRect;
use crate::region::RegionQuad;
use crate::types::{
    Crop, LandmarkSet, Pixel, Point2, Point3, ReprojectedLandmarkSet, Size, Source, SourcePoint,
};

/// How landmark depth is carried through reprojection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthMode {
    /// z is left in the estimator's units.
    #[default]
    Passthrough,
    /// z is scaled by `sqrt(w * h)` of the region, keeping depth
    /// proportional to the reprojected x/y.
    GeometricMean,
}

/// Crop-space `(x, y)` into source space: recentre, rotate, scale, translate.
///
/// Both rotated components are computed from the same pre-rotation pair.
pub(crate) fn map_crop_point(
    x: f32,
    y: f32,
    center: SourcePoint,
    size: Size,
    rotation: f32,
) -> (f32, f32) {
    let x = x - 0.5;
    let y = y - 0.5;

    let (sin, cos) = rotation.sin_cos();
    let rx = x * cos - y * sin;
    let ry = x * sin + y * cos;

    (rx * size.width + center.x, ry * size.height + center.y)
}

pub fn crop_to_source(p: Point2<Crop>, region: &RegionQuad) -> Point2<Source> {
    let (x, y) = map_crop_point(p.x, p.y, region.center, region.size, region.rotation);
    Point2::new(x, y)
}

/// Maps landmark estimator output from crop space back into the source
/// image, using the region that produced the crop.
#[derive(Debug, Clone, Copy, Default)]
pub struct LandmarkReprojector {
    depth: DepthMode,
}

impl LandmarkReprojector {
    pub fn new(depth: DepthMode) -> Self {
        Self { depth }
    }

    pub fn depth_mode(&self) -> DepthMode {
        self.depth
    }

    pub fn reproject(&self, landmarks: &LandmarkSet, region: &RegionQuad) -> ReprojectedLandmarkSet {
        let depth_scale = match self.depth {
            DepthMode::Passthrough => 1.0,
            DepthMode::GeometricMean => (region.size.width * region.size.height).sqrt(),
        };

        let joints = landmarks
            .joints
            .iter()
            .map(|j| {
                let (x, y) = map_crop_point(j.x, j.y, region.center, region.size, region.rotation);
                Point3::new(x, y, j.z * depth_scale)
            })
            .collect();

        ReprojectedLandmarkSet {
            joints,
            confidence: landmarks.confidence,
        }
    }
}

impl ReprojectedLandmarkSet {
    /// Places the landmarks on screen, using the rectangle the source image
    /// was fitted into.
    pub fn to_pixels(&self, fit: &FitRect) -> Vec<Point3<Pixel>> {
        self.joints
            .iter()
            .map(|j| {
                let p = fit.to_pixels(j.xy());
                p.with_z(j.z)
            })
            .collect()
    }
}
