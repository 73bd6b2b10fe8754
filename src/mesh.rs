use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fit::FitRect;
use crate::types::{Pixel, PixelPoint, Point2, Point3, ReprojectedLandmarkSet, Source};

/// Joint count of the face mesh landmark model.
pub const FACE_MESH_JOINTS: usize = 468;

/// Fixed mesh topology shared by every face: index triples into a landmark set.
/// Validated once on construction and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triangulation {
    triangles: Vec<[u32; 3]>,
    joint_count: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexTable {
    Flat(Vec<u32>),
    Counted {
        indices: Vec<u32>,
        #[serde(default)]
        count: Option<usize>,
    },
}

impl Triangulation {
    pub fn new(indices: &[u32], joint_count: usize) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidTriangulation(format!(
                "{} indices is not a whole number of triangles",
                indices.len()
            )));
        }
        if let Some((position, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, &i)| i as usize >= joint_count)
        {
            return Err(Error::IndexOutOfBounds {
                index,
                position,
                joint_count,
            });
        }

        let triangles = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();

        Ok(Self {
            triangles,
            joint_count,
        })
    }

    /// Parses an index table: a JSON array, a JSON object with `indices`
    /// (and optionally `count`), or plain integers separated by whitespace
    /// or commas.
    pub fn parse(text: &str, joint_count: usize) -> Result<Self> {
        let trimmed = text.trim_start();
        let indices = if trimmed.starts_with('[') || trimmed.starts_with('{') {
            match serde_json::from_str::<IndexTable>(trimmed)? {
                IndexTable::Flat(indices) => indices,
                IndexTable::Counted { indices, count } => {
                    if let Some(count) = count {
                        if count != indices.len() {
                            return Err(Error::InvalidTriangulation(format!(
                                "declared {} indices, found {}",
                                count,
                                indices.len()
                            )));
                        }
                    }
                    indices
                }
            }
        } else {
            text.split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<u32>().map_err(|e| {
                        Error::InvalidTriangulation(format!("bad index {:?}: {}", s, e))
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        Self::new(&indices, joint_count)
    }

    pub fn load(path: impl AsRef<Path>, joint_count: usize) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let triangulation = Self::parse(&text, joint_count)?;
        tracing::info!(
            "Loaded triangulation from {}: {} triangles over {} joints",
            path.display(),
            triangulation.len(),
            joint_count
        );
        Ok(triangulation)
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Number of triangles (index count / 3).
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn index_count(&self) -> usize {
        self.triangles.len() * 3
    }

    pub fn joint_count(&self) -> usize {
        self.joint_count
    }

    /// Rejects landmark data that does not fit this topology.
    pub fn check_joint_count(&self, actual: usize) -> Result<()> {
        if actual != self.joint_count {
            return Err(Error::JointCountMismatch {
                expected: self.joint_count,
                actual,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStyle {
    /// Also emit each triangle's edges for a wireframe.
    pub outline: bool,
}

/// One mesh triangle: where it is drawn, and where the mask texture is read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpTriangle {
    pub positions: [Point3<Pixel>; 3],
    pub texcoords: [Point2<Source>; 3],
}

impl WarpTriangle {
    /// Twice the signed screen area; zero for collinear vertices.
    pub fn signed_area(&self) -> f32 {
        let [a, b, c] = self.positions;
        (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: PixelPoint,
    pub to: PixelPoint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarpMesh {
    /// In triangulation order, one per index triple.
    pub triangles: Vec<WarpTriangle>,
    /// Three segments per triangle when outlining, empty otherwise.
    pub outline: Vec<Segment>,
}

/// Pairs the live face geometry with a mask face's texture coordinates.
#[derive(Debug, Clone)]
pub struct MeshAssembler {
    triangulation: Arc<Triangulation>,
    style: MeshStyle,
}

impl MeshAssembler {
    pub fn new(triangulation: Arc<Triangulation>, style: MeshStyle) -> Self {
        Self {
            triangulation,
            style,
        }
    }

    pub fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    /// Emits exactly one triangle per index triple, degenerate ones included.
    ///
    /// # Panics
    /// If either landmark set does not have the triangulation's joint count.
    /// Data from outside the program is checked with
    /// [`Triangulation::check_joint_count`] before it gets here.
    pub fn assemble(
        &self,
        live: &ReprojectedLandmarkSet,
        fit: &FitRect,
        mask: &ReprojectedLandmarkSet,
    ) -> WarpMesh {
        let joints = self.triangulation.joint_count();
        assert_eq!(live.len(), joints, "live landmark count");
        assert_eq!(mask.len(), joints, "mask landmark count");

        let positions = live.to_pixels(fit);

        let triangles: Vec<WarpTriangle> = self
            .triangulation
            .triangles()
            .iter()
            .map(|&[i0, i1, i2]| {
                let (i0, i1, i2) = (i0 as usize, i1 as usize, i2 as usize);
                WarpTriangle {
                    positions: [positions[i0], positions[i1], positions[i2]],
                    texcoords: [
                        mask.joints[i0].xy(),
                        mask.joints[i1].xy(),
                        mask.joints[i2].xy(),
                    ],
                }
            })
            .collect();

        let outline = if self.style.outline {
            triangles
                .iter()
                .flat_map(|t| {
                    let [a, b, c] = t.positions.map(|p| p.xy());
                    [
                        Segment { from: a, to: b },
                        Segment { from: b, to: c },
                        Segment { from: c, to: a },
                    ]
                })
                .collect()
        } else {
            Vec::new()
        };

        tracing::debug!(
            "Assembled {} triangles ({} outline segments)",
            triangles.len(),
            outline.len()
        );

        WarpMesh { triangles, outline }
    }
}
