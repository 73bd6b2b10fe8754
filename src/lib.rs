pub mod config;
pub mod error;
pub mod fit;
pub mod font;
pub mod mask;
pub mod mesh;
pub mod pipeline;
pub mod preprocess;
pub mod region;
pub mod render;
pub mod reproject;
pub mod sampler;
pub mod types;

pub use error::{Error, Result};
