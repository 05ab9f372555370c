//! Geometry providers and raw attribute data.
//!
//! The core depends only on the [`GeometryProvider`] capability: something
//! that can hand over parallel attribute arrays for one primitive shape.
//! [`Cube`] is the concrete provider used by the benchmark scenes.

use log::{error, warn};

use crate::config::DrawStyle;

/// Raw per-object attribute data, vertex- or face-granular.
///
/// Positions are always present. Normals and colors are optional: `None`
/// (or an empty array) means "feature not present" and the corresponding
/// buffer is neither populated nor bound. Index-based sets carry a compact
/// corner-vertex stream plus an unsigned-byte index array referencing it.
#[derive(Debug, Clone)]
pub struct AttributeSet {
    pub positions: Vec<f32>,
    pub normals: Option<Vec<f32>>,
    pub colors: Option<Vec<f32>>,
    pub indices: Option<Vec<u8>>,
    pub vertex_count: u32,
}

/// Shape of an [`AttributeSet`]: which attributes are present and how wide
/// each one is. This is all the layout planner needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSetDesc {
    pub vertex_count: u32,
    pub position_components: u32,
    pub normal_components: Option<u32>,
    pub color_components: Option<u32>,
    pub index_count: Option<u32>,
}

impl AttributeSet {
    /// Describe this set for the planner, applying the shape-defect
    /// policy: a length-mismatched optional attribute degrades to
    /// "feature absent" with a diagnostic, while an inconsistent position
    /// array is a caller error reported loudly (the set is still
    /// describable so the run can continue).
    pub fn describe(&self) -> AttributeSetDesc {
        let n = self.vertex_count;
        debug_assert!(n > 0, "attribute set with no vertices");

        let position_components = if n > 0 && self.positions.len() % n as usize == 0 {
            (self.positions.len() / n as usize) as u32
        } else {
            error!(
                "position array length {} does not divide vertex count {}",
                self.positions.len(),
                n
            );
            3
        };

        let normal_components = component_width("normal", self.normals.as_deref(), n);
        let color_components = component_width("color", self.colors.as_deref(), n);

        let index_count = match &self.indices {
            Some(indices) if !indices.is_empty() => Some(indices.len() as u32),
            Some(_) => {
                error!("index-based attribute set carries an empty index array");
                None
            }
            None => None,
        };

        AttributeSetDesc {
            vertex_count: n,
            position_components,
            normal_components,
            color_components,
            index_count,
        }
    }
}

fn component_width(name: &str, data: Option<&[f32]>, vertex_count: u32) -> Option<u32> {
    let data = data?;
    if data.is_empty() {
        return None;
    }
    if vertex_count > 0 && data.len() % vertex_count as usize == 0 {
        Some((data.len() / vertex_count as usize) as u32)
    } else {
        warn!(
            "{} array length {} does not divide vertex count {}; treating feature as absent",
            name,
            data.len(),
            vertex_count
        );
        None
    }
}

/// Capability contract: supplies the attribute arrays for one primitive
/// shape, in the granularity required by the draw style.
pub trait GeometryProvider {
    fn attribute_set(&self, draw: DrawStyle) -> AttributeSet;
}

// ----------------------------------------------------------------------
// Cube tables
// ----------------------------------------------------------------------

/// Duplicated-corner vertex count for the flattened stream.
pub const CUBE_VERTEX_COUNT: u32 = 36;

/// Compact corner-vertex count for the indexed stream.
pub const CUBE_CORNER_COUNT: u32 = 8;

/// Per-face-duplicated positions: 12 triangles, 36 vertices. Corners are
/// named [lr][bt][nf] for left/right, bottom/top, near/far.
#[rustfmt::skip]
const CUBE_POSITIONS: [f32; 108] = [
    // right face: rbn, rbf, rtf and rbn, rtf, rtn
    0.5, -0.5, 0.5,   0.5, -0.5, -0.5,   0.5, 0.5, -0.5,
    0.5, -0.5, 0.5,   0.5, 0.5, -0.5,    0.5, 0.5, 0.5,
    // top face: ltn, rtn, rtf and ltn, rtf, ltf
    -0.5, 0.5, 0.5,   0.5, 0.5, 0.5,     0.5, 0.5, -0.5,
    -0.5, 0.5, 0.5,   0.5, 0.5, -0.5,    -0.5, 0.5, -0.5,
    // back face: rbf, lbf, ltf and rbf, ltf, rtf
    0.5, -0.5, -0.5,  -0.5, -0.5, -0.5,  -0.5, 0.5, -0.5,
    0.5, -0.5, -0.5,  -0.5, 0.5, -0.5,   0.5, 0.5, -0.5,
    // left face: lbf, lbn, ltn and lbf, ltn, ltf
    -0.5, -0.5, -0.5, -0.5, -0.5, 0.5,   -0.5, 0.5, 0.5,
    -0.5, -0.5, -0.5, -0.5, 0.5, 0.5,    -0.5, 0.5, -0.5,
    // bottom face: lbf, rbf, rbn and lbf, rbn, lbn
    -0.5, -0.5, -0.5, 0.5, -0.5, -0.5,   0.5, -0.5, 0.5,
    -0.5, -0.5, -0.5, 0.5, -0.5, 0.5,    -0.5, -0.5, 0.5,
    // front face: lbn, rbn, rtn and lbn, rtn, ltn
    -0.5, -0.5, 0.5,  0.5, -0.5, 0.5,    0.5, 0.5, 0.5,
    -0.5, -0.5, 0.5,  0.5, 0.5, 0.5,     -0.5, 0.5, 0.5,
];

/// One normal per vertex, normal to the plane of its face.
#[rustfmt::skip]
const CUBE_FACE_NORMALS: [f32; 108] = [
    // right
    1.0, 0.0, 0.0,  1.0, 0.0, 0.0,  1.0, 0.0, 0.0,
    1.0, 0.0, 0.0,  1.0, 0.0, 0.0,  1.0, 0.0, 0.0,
    // top
    0.0, 1.0, 0.0,  0.0, 1.0, 0.0,  0.0, 1.0, 0.0,
    0.0, 1.0, 0.0,  0.0, 1.0, 0.0,  0.0, 1.0, 0.0,
    // back
    0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0,
    0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0,
    // left
    -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0,
    -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0,
    // bottom
    0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0,
    0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0,
    // front
    0.0, 0.0, 1.0,  0.0, 0.0, 1.0,  0.0, 0.0, 1.0,
    0.0, 0.0, 1.0,  0.0, 0.0, 1.0,  0.0, 0.0, 1.0,
];

/// One rgba color per vertex, constant across each face.
#[rustfmt::skip]
const CUBE_FACE_COLORS: [f32; 144] = [
    // right face: red
    1.0, 0.0, 0.0, 1.0,  1.0, 0.0, 0.0, 1.0,  1.0, 0.0, 0.0, 1.0,
    1.0, 0.0, 0.0, 1.0,  1.0, 0.0, 0.0, 1.0,  1.0, 0.0, 0.0, 1.0,
    // top face: green
    0.0, 1.0, 0.0, 1.0,  0.0, 1.0, 0.0, 1.0,  0.0, 1.0, 0.0, 1.0,
    0.0, 1.0, 0.0, 1.0,  0.0, 1.0, 0.0, 1.0,  0.0, 1.0, 0.0, 1.0,
    // back face: magenta
    1.0, 0.0, 1.0, 1.0,  1.0, 0.0, 1.0, 1.0,  1.0, 0.0, 1.0, 1.0,
    1.0, 0.0, 1.0, 1.0,  1.0, 0.0, 1.0, 1.0,  1.0, 0.0, 1.0, 1.0,
    // left face: cyan
    0.0, 1.0, 1.0, 1.0,  0.0, 1.0, 1.0, 1.0,  0.0, 1.0, 1.0, 1.0,
    0.0, 1.0, 1.0, 1.0,  0.0, 1.0, 1.0, 1.0,  0.0, 1.0, 1.0, 1.0,
    // bottom face: yellow
    1.0, 1.0, 0.0, 1.0,  1.0, 1.0, 0.0, 1.0,  1.0, 1.0, 0.0, 1.0,
    1.0, 1.0, 0.0, 1.0,  1.0, 1.0, 0.0, 1.0,  1.0, 1.0, 0.0, 1.0,
    // front face: blue
    0.0, 0.0, 1.0, 1.0,  0.0, 0.0, 1.0, 1.0,  0.0, 0.0, 1.0, 1.0,
    0.0, 0.0, 1.0, 1.0,  0.0, 0.0, 1.0, 1.0,  0.0, 0.0, 1.0, 1.0,
];

/// One rgba color per vertex, distinct per cube corner:
/// lbn red, lbf green, ltn blue, ltf cyan,
/// rbn pink, rbf magenta, rtn pale blue, rtf yellow.
#[rustfmt::skip]
const CUBE_VERTEX_COLORS: [f32; 144] = [
    // right face: rbn, rbf, rtf and rbn, rtf, rtn
    1.0, 0.5, 0.5, 1.0,  1.0, 0.0, 1.0, 1.0,  1.0, 1.0, 0.0, 1.0,
    1.0, 0.5, 0.5, 1.0,  1.0, 1.0, 0.0, 1.0,  0.5, 0.5, 1.0, 1.0,
    // top face: ltn, rtn, rtf and ltn, rtf, ltf
    0.0, 0.0, 1.0, 1.0,  0.5, 0.5, 1.0, 1.0,  1.0, 1.0, 0.0, 1.0,
    0.0, 0.0, 1.0, 1.0,  1.0, 1.0, 0.0, 1.0,  0.0, 1.0, 1.0, 1.0,
    // back face: rbf, lbf, ltf and rbf, ltf, rtf
    1.0, 0.0, 1.0, 1.0,  0.0, 1.0, 0.0, 1.0,  0.0, 1.0, 1.0, 1.0,
    1.0, 0.0, 1.0, 1.0,  0.0, 1.0, 1.0, 1.0,  1.0, 1.0, 0.0, 1.0,
    // left face: lbf, lbn, ltn and lbf, ltn, ltf
    0.0, 1.0, 0.0, 1.0,  1.0, 0.0, 0.0, 1.0,  0.0, 0.0, 1.0, 1.0,
    0.0, 1.0, 0.0, 1.0,  0.0, 0.0, 1.0, 1.0,  0.0, 1.0, 1.0, 1.0,
    // bottom face: lbf, rbf, rbn and lbf, rbn, lbn
    0.0, 1.0, 0.0, 1.0,  1.0, 0.0, 1.0, 1.0,  1.0, 0.5, 0.5, 1.0,
    0.0, 1.0, 0.0, 1.0,  1.0, 0.5, 0.5, 1.0,  1.0, 0.0, 0.0, 1.0,
    // front face: lbn, rbn, rtn and lbn, rtn, ltn
    1.0, 0.0, 0.0, 1.0,  1.0, 0.5, 0.5, 1.0,  0.5, 0.5, 1.0, 1.0,
    1.0, 0.0, 0.0, 1.0,  0.5, 0.5, 1.0, 1.0,  0.0, 0.0, 1.0, 1.0,
];

/// Compact corner vertices, near face first: lbn rbn rtn ltn, then
/// lbf rbf rtf ltf.
#[rustfmt::skip]
const CUBE_CORNERS: [f32; 24] = [
    -0.5, -0.5, 0.5,   0.5, -0.5, 0.5,   0.5, 0.5, 0.5,   -0.5, 0.5, 0.5,
    -0.5, -0.5, -0.5,  0.5, -0.5, -0.5,  0.5, 0.5, -0.5,  -0.5, 0.5, -0.5,
];

/// Unsigned-byte indices into [`CUBE_CORNERS`], two triangles per face.
#[rustfmt::skip]
const CUBE_INDICES: [u8; 36] = [
    1, 5, 6,  1, 6, 2, // right
    3, 2, 6,  3, 6, 7, // top
    5, 4, 7,  5, 7, 6, // far
    4, 0, 3,  4, 3, 7, // left
    4, 5, 1,  4, 1, 0, // bottom
    0, 1, 2,  0, 2, 3, // front
];

/// One rgb color per corner, same ordering as [`CUBE_CORNERS`].
#[rustfmt::skip]
const CUBE_CORNER_COLORS: [f32; 24] = [
    1.0, 0.0, 0.0,  0.0, 1.0, 0.0,  0.0, 0.0, 1.0,  0.0, 1.0, 1.0,
    1.0, 0.5, 0.5,  1.0, 0.0, 1.0,  0.5, 0.5, 1.0,  0.0, 1.0, 1.0,
];

/// A unit cube centered at the origin.
#[derive(Debug, Clone, Copy)]
pub struct Cube {
    /// true: every vertex takes its face's color; false: per-corner colors.
    pub face_colors: bool,
    /// true: vertex normals are face normals; false: vertex normals are
    /// the average of the shared face normals (the corner direction,
    /// deliberately not unit length — the shader normalizes).
    pub face_normals: bool,
}

impl Cube {
    pub fn new(face_colors: bool, face_normals: bool) -> Self {
        Self {
            face_colors,
            face_normals,
        }
    }
}

impl GeometryProvider for Cube {
    fn attribute_set(&self, draw: DrawStyle) -> AttributeSet {
        match draw {
            DrawStyle::Elements => AttributeSet {
                positions: CUBE_CORNERS.to_vec(),
                // Corner positions double as (non-unit) averaged normals.
                normals: Some(CUBE_CORNERS.to_vec()),
                colors: Some(CUBE_CORNER_COLORS.to_vec()),
                indices: Some(CUBE_INDICES.to_vec()),
                vertex_count: CUBE_CORNER_COUNT,
            },
            DrawStyle::Arrays | DrawStyle::Strips => {
                let normals = if self.face_normals {
                    CUBE_FACE_NORMALS.to_vec()
                } else {
                    CUBE_POSITIONS.to_vec()
                };
                let colors = if self.face_colors {
                    CUBE_FACE_COLORS.to_vec()
                } else {
                    CUBE_VERTEX_COLORS.to_vec()
                };
                AttributeSet {
                    positions: CUBE_POSITIONS.to_vec(),
                    normals: Some(normals),
                    colors: Some(colors),
                    indices: None,
                    vertex_count: CUBE_VERTEX_COUNT,
                }
            }
        }
    }
}
