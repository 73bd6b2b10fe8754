use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid triangulation: {0}")]
    InvalidTriangulation(String),

    #[error("Triangulation index {index} at position {position} out of bounds for {joint_count} joints")]
    IndexOutOfBounds {
        index: u32,
        position: usize,
        joint_count: usize,
    },

    #[error("Landmark set has {actual} joints, triangulation expects {expected}")]
    JointCountMismatch { expected: usize, actual: usize },

    #[error("Input buffer holds {actual} values, {expected} required for {width}x{height} RGB")]
    BufferSize {
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
    },

    #[error("No face {face_id} in detection result ({detected} detected)")]
    NoFace { face_id: usize, detected: usize },

    #[error("Mask library is empty")]
    EmptyMaskLibrary,
}

pub type Result<T> = std::result::Result<T, Error>;
