//! Math type aliases and volume bounds.
//!
//! Volume grids carry their bounds in double precision, the same way the
//! files store them.

pub use nalgebra;

/// 3D vector (f64).
pub type Vec3d = nalgebra::Vector3<f64>;

/// 4x4 matrix (f64).
pub type Mat4d = nalgebra::Matrix4<f64>;

/// Axis-aligned range. Empty when any `min` component exceeds `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range3d {
    /// Minimum corner.
    pub min: Vec3d,
    /// Maximum corner.
    pub max: Vec3d,
}

impl Range3d {
    /// Create a range from its corners.
    pub fn new(min: Vec3d, max: Vec3d) -> Self {
        Self { min, max }
    }

    /// The empty range.
    pub fn empty() -> Self {
        Self {
            min: Vec3d::repeat(f64::MAX),
            max: Vec3d::repeat(f64::MIN),
        }
    }

    /// Returns true if the range contains no point.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3d {
        self.max - self.min
    }
}

impl Default for Range3d {
    fn default() -> Self {
        Self::empty()
    }
}

/// A range in a local frame plus the matrix mapping that frame to world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox3d {
    /// Range in the local frame.
    pub range: Range3d,
    /// Local-to-world transform.
    pub matrix: Mat4d,
}

impl BBox3d {
    /// Create a box from a local range and a local-to-world transform.
    pub fn new(range: Range3d, matrix: Mat4d) -> Self {
        Self { range, matrix }
    }

    /// Axis-aligned box with an identity transform.
    pub fn from_range(range: Range3d) -> Self {
        Self::new(range, Mat4d::identity())
    }
}

impl Default for BBox3d {
    fn default() -> Self {
        Self::from_range(Range3d::empty())
    }
}

/// Matrix mapping world-space points inside `bbox` to `[0, 1]^3`.
///
/// Empty boxes map to the identity. Degenerate axes are not scaled.
pub fn compute_sampling_transform(bbox: &BBox3d) -> Mat4d {
    if bbox.range.is_empty() {
        return Mat4d::identity();
    }

    let world_to_local = match bbox.matrix.try_inverse() {
        Some(inverse) => inverse,
        None => {
            log::warn!("Volume bounding box transform is singular, sampling in local space");
            Mat4d::identity()
        }
    };

    let size = bbox.range.size();
    let scale = Vec3d::new(
        if size.x > 0.0 { 1.0 / size.x } else { 1.0 },
        if size.y > 0.0 { 1.0 / size.y } else { 1.0 },
        if size.z > 0.0 { 1.0 / size.z } else { 1.0 },
    );

    Mat4d::new_nonuniform_scaling(&scale) * Mat4d::new_translation(&(-bbox.range.min)) * world_to_local
}

/// Column-major f32 copy of a matrix, as shaders consume it.
pub fn mat4d_to_cols_array(m: &Mat4d) -> [f32; 16] {
    let mut result = [0.0f32; 16];
    for (dst, src) in result.iter_mut().zip(m.iter()) {
        *dst = *src as f32;
    }
    result
}
