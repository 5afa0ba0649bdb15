use glam::{Mat3, Mat4, Quat, Vec3};
use thiserror::Error;

/// Error raised when a matrix violates a transform contract.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum TransformError {
    #[error("model matrix applies non-uniform scale ({x:.4}, {y:.4}, {z:.4})")]
    NonUniformScale { x: f32, y: f32, z: f32 },
}

/// Projection and view matrices shared by every vertex in a draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub projection: Mat4,
    pub view: Mat4,
}

impl CameraTransform {
    pub const IDENTITY: Self = Self {
        projection: Mat4::IDENTITY,
        view: Mat4::IDENTITY,
    };

    pub fn new(projection: Mat4, view: Mat4) -> Self {
        Self { projection, view }
    }

    /// Combined view-projection matrix, applied after the model transform.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Model-to-world transform restricted to rigid motion plus uniform scale.
///
/// The vertex stage reuses the matrix's upper-left 3x3 block to transform
/// normals and tangents instead of computing an inverse-transpose, which is
/// only correct when all three axes carry the same scale. The constructors
/// uphold that contract; [`ModelTransform::from_mat4_unchecked`] is the
/// escape hatch for callers that accept skewed normals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform(Mat4);

impl ModelTransform {
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);

    /// Rigid transform: rotation followed by translation.
    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        Self(Mat4::from_rotation_translation(rotation, translation))
    }

    /// Uniform scale, then rotation, then translation.
    pub fn from_scale_rotation_translation(scale: f32, rotation: Quat, translation: Vec3) -> Self {
        Self(Mat4::from_scale_rotation_translation(
            Vec3::splat(scale),
            rotation,
            translation,
        ))
    }

    /// Accepts an arbitrary matrix after checking that its basis columns
    /// carry the same length.
    pub fn try_from_mat4(matrix: Mat4) -> Result<Self, TransformError> {
        let x = matrix.x_axis.truncate().length();
        let y = matrix.y_axis.truncate().length();
        let z = matrix.z_axis.truncate().length();
        let max = x.max(y).max(z);
        let min = x.min(y).min(z);
        if max - min > max.max(f32::EPSILON) * 1e-4 {
            return Err(TransformError::NonUniformScale { x, y, z });
        }
        Ok(Self(matrix))
    }

    /// Wraps a matrix without checking the uniform-scale contract.
    pub fn from_mat4_unchecked(matrix: Mat4) -> Self {
        Self(matrix)
    }

    pub fn matrix(&self) -> Mat4 {
        self.0
    }

    /// Upper-left 3x3 block, used for direction transforms.
    pub fn linear(&self) -> Mat3 {
        Mat3::from_mat4(self.0)
    }
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
