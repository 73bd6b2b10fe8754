use image::{Rgb, RgbImage};
use rusty_mask::fit::fit_to_viewport;
use rusty_mask::mask::MaskLibrary;
use rusty_mask::mesh::{MeshAssembler, MeshStyle, Triangulation};
use rusty_mask::pipeline::{FacePipeline, ReplayDetector, ReplayEstimator};
use rusty_mask::render::{compose_scene, OverlayStyle, Scene};
use rusty_mask::reproject::{DepthMode, LandmarkReprojector};
use rusty_mask::types::Size;
use rusty_mask::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

const DETECTIONS: &str = r#"{
    "faces": [
        { "center": { "x": 0.5, "y": 0.5 }, "size": { "width": 0.5, "height": 0.5 }, "rotation": 0.3, "score": 0.97,
          "keypoints": [ { "x": 0.4, "y": 0.45 }, { "x": 0.6, "y": 0.45 } ] }
    ]
}"#;

const LANDMARKS: &str = r#"{
    "faces": [
        { "joints": [
            { "x": 0.2, "y": 0.2, "z": 0.0 },
            { "x": 0.8, "y": 0.2, "z": 0.1 },
            { "x": 0.5, "y": 0.8, "z": -0.1 },
            { "x": 0.5, "y": 0.4, "z": 0.05 }
          ],
          "confidence": 0.88 }
    ]
}"#;

struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("rusty_mask_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("det.json"), DETECTIONS).unwrap();
        fs::write(dir.join("lm.json"), LANDMARKS).unwrap();
        fs::write(dir.join("mesh.txt"), "0 1 3\n1 2 3\n2 0 3\n").unwrap();
        Self { dir }
    }

    fn pipeline(&self) -> FacePipeline<ReplayDetector, ReplayEstimator> {
        FacePipeline::new(
            ReplayDetector::load(self.dir.join("det.json"), (16, 16)).unwrap(),
            ReplayEstimator::load(self.dir.join("lm.json"), (16, 16)).unwrap(),
            LandmarkReprojector::new(DepthMode::Passthrough),
        )
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn gradient(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| Rgb([(x * 255 / w) as u8, (y * 255 / h) as u8, 128]))
}

#[test]
fn repeated_processing_is_identical() {
    let fixture = Fixture::new("idempotent");
    let image = gradient(64, 48);
    let mut pipeline = fixture.pipeline();

    let first = pipeline.process(&image).unwrap();
    let second = pipeline.process(&image).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);

    let face = &first[0];
    assert_eq!(face.reprojected.len(), 4);
    assert_eq!(face.reprojected.confidence, 0.88);
    // Depth passes through untouched.
    assert_eq!(face.reprojected.joints[2].z, -0.1);
    // The crop centre lands on the region centre.
    let centre = rusty_mask::reproject::crop_to_source(rusty_mask::types::Point2::new(0.5, 0.5), &face.region);
    assert!(centre.distance(face.region.center) < 1e-6);
}

#[test]
fn missing_face_is_an_error() {
    let fixture = Fixture::new("missing");
    let image = gradient(32, 32);
    let mut pipeline = fixture.pipeline();
    let region = pipeline.detect(&image).unwrap().remove(0);

    match pipeline.estimate(&image, &region, 3) {
        Err(Error::NoFace { face_id, detected }) => {
            assert_eq!(face_id, 3);
            assert_eq!(detected, 1);
        }
        other => panic!("expected NoFace, got {:?}", other.map(|f| f.face_id)),
    }

    let mut only_second = fixture.pipeline().with_face(1);
    assert!(only_second.process(&image).unwrap().is_empty());
}

#[test]
fn mask_over_live_face_end_to_end() {
    let fixture = Fixture::new("end_to_end");
    let source = gradient(120, 60);
    let donor = RgbImage::from_pixel(40, 40, Rgb([250, 20, 20]));

    let mask = fixture.pipeline().prepare_mask("red", donor).unwrap();
    let library = MaskLibrary::new(vec![mask], 100).unwrap();
    let mask = library.select(12345);

    let faces = fixture.pipeline().process(&source).unwrap();
    let detections = fixture.pipeline().detect(&source).unwrap();

    let triangulation = Arc::new(Triangulation::load(fixture.dir.join("mesh.txt"), 4).unwrap());
    triangulation.check_joint_count(faces[0].reprojected.len()).unwrap();
    assert_eq!(triangulation.len(), 3);

    let (win_w, win_h) = (200, 200);
    let fit = fit_to_viewport(Size::from_dimensions(source.dimensions()), Size::new(200.0, 200.0));
    assert_eq!((fit.x, fit.y, fit.width, fit.height), (0, 50, 200, 100));

    let overlay = MeshAssembler::new(triangulation.clone(), MeshStyle::default());
    let wireframe = MeshAssembler::new(triangulation, MeshStyle { outline: true });
    let overlay_meshes = vec![overlay.assemble(&faces[0].reprojected, &fit, &mask.landmarks)];
    let wireframe_meshes = vec![wireframe.assemble(&faces[0].reprojected, &fit, &mask.landmarks)];
    assert_eq!(overlay_meshes[0].triangles.len(), 3);
    assert!(overlay_meshes[0].outline.is_empty());
    assert_eq!(wireframe_meshes[0].outline.len(), 9);

    let scene = Scene {
        source: &source,
        fit,
        detections: &detections,
        faces: &faces,
        mask,
        overlay_meshes: &overlay_meshes,
        wireframe_meshes: &wireframe_meshes,
    };
    let style = OverlayStyle {
        thumbnail_size: 20,
        preview_size: 20,
        ..OverlayStyle::default()
    };
    let out = compose_scene(&scene, win_w, win_h, &style);
    assert_eq!(out.dimensions(), (400, 200));

    // The donor is uniformly red, so every warped pixel on the right panel is
    // either that red, black background, or touched by the wireframe.
    let red = out
        .enumerate_pixels()
        .filter(|(x, y, p)| *x >= 240 && *y >= 40 && **p == Rgb([250, 20, 20]))
        .count();
    assert!(red > 100, "only {} mask pixels on the right panel", red);

    let path = fixture.dir.join("out.png");
    out.save(&path).unwrap();
    assert!(path.exists());
}
