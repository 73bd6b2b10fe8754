use clap::Parser;
use rusty_mask::config::AppConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Source image to put the mask on
    #[arg(short, long)]
    pub image: PathBuf,

    /// Recorded face detections for the source image (JSON)
    #[arg(short, long)]
    pub detections: PathBuf,

    /// Recorded face landmarks for the source image (JSON)
    #[arg(short, long)]
    pub landmarks: PathBuf,

    /// Donor face image, repeat once per mask
    #[arg(long = "mask-image")]
    pub mask_images: Vec<PathBuf>,

    /// Recorded detections for each donor image, same order as --mask-image
    #[arg(long = "mask-detections")]
    pub mask_detections: Vec<PathBuf>,

    /// Recorded landmarks for each donor image, same order as --mask-image
    #[arg(long = "mask-landmarks")]
    pub mask_landmarks: Vec<PathBuf>,

    /// Face mesh index table (JSON array, {"indices": [...]}, or plain integers)
    #[arg(short, long)]
    pub triangulation: PathBuf,

    /// Frame index, picks the active mask
    #[arg(long, default_value_t = 0)]
    pub frame: u64,

    /// Draw the mesh wireframe on the left panel too (also `mesh.outline` in the config)
    #[arg(long, default_value_t = false)]
    pub outline: bool,

    /// Only process this face (default 0)
    #[arg(long, default_value_t = 0)]
    pub face: usize,

    /// Config file
    #[arg(short, long, default_value = AppConfig::DEFAULT_PATH)]
    pub config: PathBuf,

    /// Output PNG
    #[arg(short, long, default_value = "rusty_mask.png")]
    pub out: PathBuf,

    /// Print where the source lands in the viewport and exit
    #[arg(long)]
    pub fit_only: bool,
}
