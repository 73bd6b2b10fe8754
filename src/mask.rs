use image::RgbImage;

use crate::error::{Error, Result};
use crate::region::RegionQuad;
use crate::types::ReprojectedLandmarkSet;

/// How many frames each mask stays active before the next one is used.
pub const DEFAULT_MASK_CYCLE_FRAMES: u64 = 100;

/// A precomputed donor face: its texture and its landmarks in the
/// texture's normalized space.
#[derive(Debug, Clone)]
pub struct MaskFace {
    pub name: String,
    pub texture: RgbImage,
    pub region: RegionQuad,
    pub landmarks: ReprojectedLandmarkSet,
}

#[derive(Debug, Clone)]
pub struct MaskLibrary {
    masks: Vec<MaskFace>,
    cycle_frames: u64,
}

impl MaskLibrary {
    pub fn new(masks: Vec<MaskFace>, cycle_frames: u64) -> Result<Self> {
        if masks.is_empty() {
            return Err(Error::EmptyMaskLibrary);
        }
        Ok(Self {
            masks,
            cycle_frames: cycle_frames.max(1),
        })
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn masks(&self) -> &[MaskFace] {
        &self.masks
    }

    /// Index of the mask shown at `frame_index`.
    pub fn index_for_frame(&self, frame_index: u64) -> usize {
        ((frame_index / self.cycle_frames) % self.masks.len() as u64) as usize
    }

    pub fn select(&self, frame_index: u64) -> &MaskFace {
        &self.masks[self.index_for_frame(frame_index)]
    }
}
