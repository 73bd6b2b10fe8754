use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::mask::DEFAULT_MASK_CYCLE_FRAMES;
use crate::mesh::{MeshStyle, FACE_MESH_JOINTS};
use crate::render::OverlayStyle;
use crate::reproject::DepthMode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub viewport: ViewportConfig,
    pub models: ModelConfig,
    pub mesh: MeshConfig,
    pub ui: UiConfig,
}

/// Size of one panel of the output; the composed image is two panels wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub detector_width: u32,
    pub detector_height: u32,
    pub landmark_width: u32,
    pub landmark_height: u32,
    pub joint_count: usize,
    /// Estimate on the whole frame when the requested face is not detected.
    pub full_frame_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub mask_cycle_frames: u64,
    pub outline: bool,
    pub outline_alpha: f32,
    pub depth_mode: DepthMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub preview_size: u32,
    pub mask_thumbnail_size: u32,
    pub font_scale: u32,
    pub detection_color_hex: String, // e.g. "#FF0000"
    pub score_color_hex: String,
    pub outline_color_hex: String,
    pub frame_color_hex: String,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            detector_width: 128,
            detector_height: 128,
            landmark_width: 192,
            landmark_height: 192,
            joint_count: FACE_MESH_JOINTS,
            full_frame_fallback: true,
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            mask_cycle_frames: DEFAULT_MASK_CYCLE_FRAMES,
            outline: false,
            outline_alpha: 0.3,
            depth_mode: DepthMode::Passthrough,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            preview_size: 100,
            mask_thumbnail_size: 200,
            font_scale: 2,
            detection_color_hex: "#FF0000".to_string(),
            score_color_hex: "#00FF00".to_string(),
            outline_color_hex: "#FFFFFF".to_string(),
            frame_color_hex: "#FFFFFF".to_string(),
        }
    }
}

impl ModelConfig {
    pub fn detector_input(&self) -> (u32, u32) {
        (self.detector_width, self.detector_height)
    }

    pub fn landmark_input(&self) -> (u32, u32) {
        (self.landmark_width, self.landmark_height)
    }
}

impl MeshConfig {
    /// Style of the overlay mesh; the wireframe is on if either the file or
    /// the command line asks for it.
    pub fn overlay_style(&self, outline_flag: bool) -> MeshStyle {
        MeshStyle {
            outline: self.outline || outline_flag,
        }
    }
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "rusty_mask.json";

    /// Loads the config at `path`. Missing fields take their defaults and the
    /// result is written back so new fields show up in the file. A file that
    /// does not parse is left alone and the defaults are used.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("Configuration file not found. Creating default at {}", path.display());
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = fs::read_to_string(path)?;
        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", path.display());
                config.save(path)?;
                Ok(config)
            }
            Err(e) => {
                tracing::warn!("Error parsing config {}: {}. Loading defaults.", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn overlay_style(&self) -> OverlayStyle {
        OverlayStyle {
            detection: self.ui.detection_color(),
            score: self.ui.score_color(),
            outline: self.ui.outline_color(),
            outline_alpha: self.mesh.outline_alpha,
            frame: self.ui.frame_color(),
            font_scale: self.ui.font_scale.max(1),
            preview_size: self.ui.preview_size,
            thumbnail_size: self.ui.mask_thumbnail_size,
        }
    }
}

impl UiConfig {
    pub fn detection_color(&self) -> Rgb<u8> {
        parse_hex(&self.detection_color_hex)
    }

    pub fn score_color(&self) -> Rgb<u8> {
        parse_hex(&self.score_color_hex)
    }

    pub fn outline_color(&self) -> Rgb<u8> {
        parse_hex(&self.outline_color_hex)
    }

    pub fn frame_color(&self) -> Rgb<u8> {
        parse_hex(&self.frame_color_hex)
    }
}

/// `#RRGGBB` to a color, red when the string is malformed.
pub fn parse_hex(hex: &str) -> Rgb<u8> {
    if hex.len() == 7 && hex.starts_with('#') {
        let r = u8::from_str_radix(&hex[1..3], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[3..5], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[5..7], 16).unwrap_or(0);
        Rgb([r, g, b])
    } else {
        Rgb([255, 0, 0])
    }
}
