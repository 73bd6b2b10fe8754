use anyhow::{bail, Context};
use clap::Parser;
use colored::*;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use rusty_mask::config::AppConfig;
use rusty_mask::fit::fit_to_viewport;
use rusty_mask::mask::{MaskFace, MaskLibrary};
use rusty_mask::mesh::{MeshAssembler, MeshStyle, Triangulation};
use rusty_mask::pipeline::{FacePipeline, ReplayDetector, ReplayEstimator};
use rusty_mask::render::{compose_scene, Scene};
use rusty_mask::reproject::LandmarkReprojector;
use rusty_mask::types::Size;

mod args;

use args::Args;

fn open_rgb(path: &Path) -> anyhow::Result<image::RgbImage> {
    let image = image::open(path).with_context(|| format!("failed to open image {}", path.display()))?;
    Ok(image.to_rgb8())
}

fn replay_pipeline(
    config: &AppConfig,
    detections: &Path,
    landmarks: &Path,
) -> anyhow::Result<FacePipeline<ReplayDetector, ReplayEstimator>> {
    let detector = ReplayDetector::load(detections, config.models.detector_input())
        .with_context(|| format!("failed to load detections {}", detections.display()))?;
    let estimator = ReplayEstimator::load(landmarks, config.models.landmark_input())
        .with_context(|| format!("failed to load landmarks {}", landmarks.display()))?;
    Ok(FacePipeline::new(
        detector,
        estimator,
        LandmarkReprojector::new(config.mesh.depth_mode),
    ))
}

fn load_masks(args: &Args, config: &AppConfig) -> anyhow::Result<Vec<MaskFace>> {
    if args.mask_detections.len() != args.mask_images.len() || args.mask_landmarks.len() != args.mask_images.len() {
        bail!(
            "{} mask images need as many --mask-detections and --mask-landmarks (got {} and {})",
            args.mask_images.len(),
            args.mask_detections.len(),
            args.mask_landmarks.len()
        );
    }

    let mut masks = Vec::with_capacity(args.mask_images.len());
    for ((image, detections), landmarks) in args
        .mask_images
        .iter()
        .zip(&args.mask_detections)
        .zip(&args.mask_landmarks)
    {
        let name = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| image.display().to_string());
        let texture = open_rgb(image)?;
        let mut pipeline = replay_pipeline(config, detections, landmarks)?;
        let mask = pipeline
            .prepare_mask(&name, texture)
            .with_context(|| format!("failed to prepare mask {}", name))?;
        masks.push(mask);
    }
    Ok(masks)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // 0. Load Config
    let config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    let (win_w, win_h) = (config.viewport.width, config.viewport.height);

    // 1. Source image and its placement
    let source = open_rgb(&args.image)?;
    let fit = fit_to_viewport(
        Size::from_dimensions(source.dimensions()),
        Size::new(win_w as f32, win_h as f32),
    );
    println!(
        "{}",
        format!(
            "{}x{} in {}x{}: x={} y={} w={} h={}",
            source.width(),
            source.height(),
            win_w,
            win_h,
            fit.x,
            fit.y,
            fit.width,
            fit.height
        )
        .cyan()
    );
    if args.fit_only {
        return Ok(());
    }

    // 2. Mesh topology, shared by every face
    let joint_count = config.models.joint_count;
    let triangulation = Arc::new(
        Triangulation::load(&args.triangulation, joint_count)
            .with_context(|| format!("failed to load triangulation {}", args.triangulation.display()))?,
    );

    // 3. Masks
    let library = MaskLibrary::new(load_masks(&args, &config)?, config.mesh.mask_cycle_frames)
        .context("at least one --mask-image is required")?;
    for mask in library.masks() {
        triangulation
            .check_joint_count(mask.landmarks.len())
            .with_context(|| format!("mask {}", mask.name))?;
    }
    let mask = library.select(args.frame);
    println!(
        "Active mask: {} ({} of {}, frame {})",
        mask.name.green(),
        library.index_for_frame(args.frame) + 1,
        library.len(),
        args.frame
    );

    // 4. Live face
    let mut pipeline = replay_pipeline(&config, &args.detections, &args.landmarks)?
        .with_face(args.face)
        .with_full_frame_fallback(config.models.full_frame_fallback);
    tracing::info!("Active pipeline: {}", pipeline.name());
    let detections = pipeline.detect(&source)?;
    let faces = pipeline.estimate_all(&source, &detections)?;
    if faces.is_empty() {
        println!("{}", format!("No face {} among {} detections", args.face, detections.len()).yellow());
    }
    for face in &faces {
        triangulation
            .check_joint_count(face.reprojected.len())
            .with_context(|| format!("face {}", face.face_id))?;
    }

    // 5. Meshes
    let overlay = MeshAssembler::new(triangulation.clone(), config.mesh.overlay_style(args.outline));
    let wireframe = MeshAssembler::new(triangulation, MeshStyle { outline: true });
    let overlay_meshes: Vec<_> = faces
        .iter()
        .map(|f| overlay.assemble(&f.reprojected, &fit, &mask.landmarks))
        .collect();
    let wireframe_meshes: Vec<_> = faces
        .iter()
        .map(|f| wireframe.assemble(&f.reprojected, &fit, &mask.landmarks))
        .collect();

    // 6. Compose and save
    let scene = Scene {
        source: &source,
        fit,
        detections: &detections,
        faces: &faces,
        mask,
        overlay_meshes: &overlay_meshes,
        wireframe_meshes: &wireframe_meshes,
    };
    let frame = compose_scene(&scene, win_w, win_h, &config.overlay_style());
    frame
        .save(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    for face in &faces {
        println!(
            "Face {}: score {:.1}%, rotation {:.1} deg, landmark confidence {:.1}%",
            face.face_id,
            face.region.score * 100.0,
            face.region.rotation.to_degrees(),
            face.landmarks.confidence * 100.0
        );
    }
    println!("{}", format!("Saved {}", args.out.display()).green());

    Ok(())
}
