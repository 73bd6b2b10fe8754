use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::mask::MaskFace;
use crate::preprocess::{InputTensor, DETECTOR_INPUT, LANDMARK_INPUT};
use crate::region::RegionQuad;
use crate::reproject::LandmarkReprojector;
use crate::sampler::{full_frame_quad, warp_quad, warp_region};
use crate::types::{LandmarkSet, ReprojectedLandmarkSet, Size, SourcePoint};

/// Finds oriented face regions in a normalized detector input.
pub trait FaceDetector {
    fn name(&self) -> String;
    /// Width and height the detector expects.
    fn input_size(&self) -> (u32, u32);
    /// Regions in the detector's own order.
    fn detect(&mut self, input: &InputTensor) -> Result<Vec<RegionQuad>>;
}

/// Estimates the face mesh inside an upright, normalized crop.
pub trait LandmarkEstimator {
    fn name(&self) -> String;
    fn input_size(&self) -> (u32, u32);
    /// `face_id` is the detector-order index of the face the crop came from.
    fn estimate(&mut self, input: &InputTensor, face_id: usize) -> Result<LandmarkSet>;
}

/// A detection as written by hand or by a recorder: either the full region,
/// or just its centre, size and rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordedFace {
    Full(RegionQuad),
    Rotated {
        center: SourcePoint,
        size: Size,
        #[serde(default)]
        rotation: f32,
        #[serde(default)]
        score: f32,
        #[serde(default)]
        keypoints: Vec<SourcePoint>,
    },
}

impl From<RecordedFace> for RegionQuad {
    fn from(face: RecordedFace) -> Self {
        match face {
            RecordedFace::Full(region) => region,
            RecordedFace::Rotated {
                center,
                size,
                rotation,
                score,
                keypoints,
            } => RegionQuad::from_rotated(center, size, rotation)
                .with_score(score)
                .with_keypoints(keypoints),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(default)]
    pub faces: Vec<RecordedFace>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkRecord {
    #[serde(default)]
    pub faces: Vec<LandmarkSet>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Replays detector output recorded to JSON.
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    faces: Vec<RegionQuad>,
    input_size: (u32, u32),
}

impl ReplayDetector {
    pub fn new(faces: Vec<RegionQuad>, input_size: (u32, u32)) -> Self {
        Self { faces, input_size }
    }

    pub fn load(path: impl AsRef<Path>, input_size: (u32, u32)) -> Result<Self> {
        let path = path.as_ref();
        let record: DetectionRecord = read_json(path)?;
        tracing::info!("Loaded {} recorded detections from {}", record.faces.len(), path.display());
        let faces = record.faces.into_iter().map(RegionQuad::from).collect();
        Ok(Self::new(faces, input_size))
    }
}

impl FaceDetector for ReplayDetector {
    fn name(&self) -> String {
        "Face Detection (replay)".to_string()
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn detect(&mut self, _input: &InputTensor) -> Result<Vec<RegionQuad>> {
        Ok(self.faces.clone())
    }
}

/// Replays landmark estimator output recorded to JSON, one set per face id.
#[derive(Debug, Clone)]
pub struct ReplayEstimator {
    faces: Vec<LandmarkSet>,
    input_size: (u32, u32),
}

impl ReplayEstimator {
    pub fn new(faces: Vec<LandmarkSet>, input_size: (u32, u32)) -> Self {
        Self { faces, input_size }
    }

    pub fn load(path: impl AsRef<Path>, input_size: (u32, u32)) -> Result<Self> {
        let path = path.as_ref();
        let record: LandmarkRecord = read_json(path)?;
        tracing::info!("Loaded {} recorded landmark sets from {}", record.faces.len(), path.display());
        Ok(Self::new(record.faces, input_size))
    }
}

impl LandmarkEstimator for ReplayEstimator {
    fn name(&self) -> String {
        "Face Mesh (replay)".to_string()
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn estimate(&mut self, _input: &InputTensor, face_id: usize) -> Result<LandmarkSet> {
        self.faces.get(face_id).cloned().ok_or(Error::NoFace {
            face_id,
            detected: self.faces.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceResult {
    pub face_id: usize,
    pub region: RegionQuad,
    pub landmarks: LandmarkSet,
    pub reprojected: ReprojectedLandmarkSet,
}

/// Detect, crop, estimate and reproject every face of one image.
pub struct FacePipeline<D, E> {
    detector: D,
    estimator: E,
    reprojector: LandmarkReprojector,
    face_id: Option<usize>,
    full_frame_fallback: bool,
}

impl<D: FaceDetector, E: LandmarkEstimator> FacePipeline<D, E> {
    pub fn new(detector: D, estimator: E, reprojector: LandmarkReprojector) -> Self {
        Self {
            detector,
            estimator,
            reprojector,
            face_id: None,
            full_frame_fallback: false,
        }
    }

    /// Only estimate landmarks for one face.
    pub fn with_face(mut self, face_id: usize) -> Self {
        self.face_id = Some(face_id);
        self
    }

    /// When the requested face was not detected, estimate landmarks on the
    /// whole frame instead of returning nothing.
    pub fn with_full_frame_fallback(mut self, enabled: bool) -> Self {
        self.full_frame_fallback = enabled;
        self
    }

    pub fn name(&self) -> String {
        format!("{} + {}", self.detector.name(), self.estimator.name())
    }

    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<RegionQuad>> {
        let (w, h) = self.detector.input_size();
        let input = InputTensor::from_image_resized(image, w, h, DETECTOR_INPUT)?;
        self.detector.detect(&input)
    }

    /// Landmarks for one already detected region.
    pub fn estimate(&mut self, image: &RgbImage, region: &RegionQuad, face_id: usize) -> Result<FaceResult> {
        let (w, h) = self.estimator.input_size();
        // Upright, top-left origin, so no readback flip is needed.
        let crop = warp_region(image, region, w, h);
        let input = InputTensor::from_image(&crop, LANDMARK_INPUT)?;

        let landmarks = self.estimator.estimate(&input, face_id)?;
        let reprojected = self.reprojector.reproject(&landmarks, region);

        tracing::debug!(
            "face {}: score {:.2}, rotation {:.1} deg, {} joints, confidence {:.2}",
            face_id,
            region.score,
            region.rotation.to_degrees(),
            landmarks.len(),
            landmarks.confidence
        );

        Ok(FaceResult {
            face_id,
            region: region.clone(),
            landmarks,
            reprojected,
        })
    }

    /// Landmarks for the whole frame, sampled upright without any rotation.
    pub fn estimate_full_frame(&mut self, image: &RgbImage, face_id: usize) -> Result<FaceResult> {
        let (w, h) = self.estimator.input_size();
        let crop = warp_quad(image, &full_frame_quad(), w, h);
        let input = InputTensor::from_image(&crop, LANDMARK_INPUT)?;

        let region = RegionQuad::full_frame();
        let landmarks = self.estimator.estimate(&input, face_id)?;
        let reprojected = self.reprojector.reproject(&landmarks, &region);

        tracing::debug!("face {}: full frame, {} joints", face_id, landmarks.len());

        Ok(FaceResult {
            face_id,
            region,
            landmarks,
            reprojected,
        })
    }

    pub fn process(&mut self, image: &RgbImage) -> Result<Vec<FaceResult>> {
        let regions = self.detect(image)?;
        self.estimate_all(image, &regions)
    }

    /// Landmarks for already detected regions, honouring the face filter and
    /// the full frame fallback.
    pub fn estimate_all(&mut self, image: &RgbImage, regions: &[RegionQuad]) -> Result<Vec<FaceResult>> {
        let selected: Vec<usize> = match self.face_id {
            Some(id) if id < regions.len() => vec![id],
            Some(id) => {
                tracing::debug!("face {} requested, {} detected", id, regions.len());
                Vec::new()
            }
            None => (0..regions.len()).collect(),
        };

        if selected.is_empty() {
            if self.full_frame_fallback {
                let face_id = self.face_id.unwrap_or(0);
                return Ok(vec![self.estimate_full_frame(image, face_id)?]);
            }
            return Ok(Vec::new());
        }

        selected
            .into_iter()
            .map(|id| self.estimate(image, &regions[id], id))
            .collect()
    }

    /// Runs the pipeline on a donor image and keeps its first face as a mask.
    pub fn prepare_mask(&mut self, name: &str, texture: RgbImage) -> Result<MaskFace> {
        let regions = self.detect(&texture)?;
        let region = regions.first().ok_or(Error::NoFace {
            face_id: 0,
            detected: 0,
        })?;
        let face = self.estimate(&texture, region, 0)?;

        tracing::info!("Prepared mask {} ({} joints)", name, face.reprojected.len());

        Ok(MaskFace {
            name: name.to_string(),
            texture,
            region: face.region,
            landmarks: face.reprojected,
        })
    }
}
