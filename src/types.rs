use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Marker for a coordinate space. Points tagged with different spaces
/// cannot be mixed without an explicit conversion.
pub trait Space: Copy + Default + fmt::Debug + PartialEq {
    const NAME: &'static str;
}

/// Normalized `[0,1]²` frame of the upright face crop fed to the landmark estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Crop;

/// Normalized `[0,1]²` frame of a source image (also its texture coordinates).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Source;

/// Screen / viewport pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pixel;

impl Space for Crop {
    const NAME: &'static str = "crop";
}

impl Space for Source {
    const NAME: &'static str = "source";
}

impl Space for Pixel {
    const NAME: &'static str = "pixel";
}

/// A 2D point in coordinate space `S`.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2<S: Space> {
    pub x: f32,
    pub y: f32,
    #[serde(skip)]
    space: PhantomData<S>,
}

/// A 3D point in coordinate space `S`. Only x/y carry the space; z is
/// the estimator's relative depth.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3<S: Space> {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(skip)]
    space: PhantomData<S>,
}

pub type CropPoint = Point3<Crop>;
pub type SourcePoint = Point2<Source>;
pub type PixelPoint = Point2<Pixel>;

impl<S: Space> Point2<S> {
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }

    pub fn with_z(self, z: f32) -> Point3<S> {
        Point3::new(self.x, self.y, z)
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn distance(self, other: Self) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl<S: Space> Point3<S> {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            space: PhantomData,
        }
    }

    pub fn xy(self) -> Point2<S> {
        Point2::new(self.x, self.y)
    }
}

impl<S: Space> fmt::Debug for Point2<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", S::NAME, self.x, self.y)
    }
}

impl<S: Space> fmt::Debug for Point3<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {}, {})", S::NAME, self.x, self.y, self.z)
    }
}

/// Width/height pair. Dimensionless: fractions of the source for a region,
/// pixels for images and viewports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_dimensions((width, height): (u32, u32)) -> Self {
        Self::new(width as f32, height as f32)
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// Raw landmark estimator output for one face, in crop space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub joints: Vec<CropPoint>,
    #[serde(default)]
    pub confidence: f32,
}

impl LandmarkSet {
    pub fn new(joints: Vec<CropPoint>, confidence: f32) -> Self {
        Self { joints, confidence }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Landmarks mapped back into the normalized space of the source image.
/// Index `i` always corresponds to joint `i` of the originating [`LandmarkSet`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReprojectedLandmarkSet {
    pub joints: Vec<Point3<Source>>,
    pub confidence: f32,
}

impl ReprojectedLandmarkSet {
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}
