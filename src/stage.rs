//! The two programmable stages of the forward ripple effect.
//!
//! Both stages are pure functions over explicit parameter structs: the
//! external rasterization pipeline (or the CPU path in [`crate::preview`])
//! invokes the vertex stage once per vertex and the fragment stage once per
//! covered fragment, with no shared state between invocations. The embedded
//! WGSL in [`crate::pipeline`] is a line-for-line translation of the math
//! here.

use glam::{Mat3, Vec2, Vec3, Vec4};

use crate::transform::{CameraTransform, ModelTransform};

/// Maximum number of light records in the per-draw light block.
pub const MAX_LIGHTS: usize = 16;

/// Per-vertex input attributes.
///
/// Normals and tangents must be unit length; a degenerate vector propagates
/// NaN through normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexAttributes {
    pub position: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub texcoord: Vec2,
}

/// Values interpolated across a primitive and handed to the fragment stage.
///
/// The tangent basis columns are (tangent, bitangent, normal) where the
/// bitangent is `cross(normal, tangent)`, left unnormalized: it is exactly
/// orthogonal to the other two columns but only unit length when the source
/// mesh keeps its tangents perpendicular to the normals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Varyings {
    pub world_position: Vec4,
    pub normal: Vec3,
    pub tangent_basis: Mat3,
    pub texcoord: Vec2,
}

impl Varyings {
    /// Barycentric interpolation, the CPU stand-in for the hardware
    /// interpolator between the two stages.
    pub fn interpolate(a: &Self, b: &Self, c: &Self, bary: Vec3) -> Self {
        Self {
            world_position: a.world_position * bary.x
                + b.world_position * bary.y
                + c.world_position * bary.z,
            normal: a.normal * bary.x + b.normal * bary.y + c.normal * bary.z,
            tangent_basis: a.tangent_basis * bary.x
                + b.tangent_basis * bary.y
                + c.tangent_basis * bary.z,
            texcoord: a.texcoord * bary.x + b.texcoord * bary.y + c.texcoord * bary.z,
        }
    }
}

/// Everything the vertex stage produces for one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    pub clip_position: Vec4,
    pub varyings: Varyings,
}

/// Material parameters for the ripple effect.
///
/// Only `effect.x` (intensity gate) and `effect.y` (phase) are consumed;
/// the remaining components are reserved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    pub emissive: Vec4,
    pub effect: Vec4,
}

/// One record of the per-draw light block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub propagation: Vec4,
    pub center: Vec4,
    pub color: Vec4,
}

impl Light {
    pub const OFF: Self = Self {
        propagation: Vec4::ZERO,
        center: Vec4::ZERO,
        color: Vec4::ZERO,
    };
}

/// Fixed-capacity light block shared by all fragments of a draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLights {
    count: u32,
    lights: [Light; MAX_LIGHTS],
}

impl Default for FrameLights {
    fn default() -> Self {
        Self {
            count: 0,
            lights: [Light::OFF; MAX_LIGHTS],
        }
    }
}

impl FrameLights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a light record, returning `false` once the block is full.
    pub fn push(&mut self, light: Light) -> bool {
        let index = self.count as usize;
        if index >= MAX_LIGHTS {
            return false;
        }
        self.lights[index] = light;
        self.count += 1;
        true
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// The active records, in insertion order.
    pub fn active(&self) -> &[Light] {
        &self.lights[..self.count as usize]
    }

    pub(crate) fn records(&self) -> &[Light; MAX_LIGHTS] {
        &self.lights
    }
}

/// Lighting contribution added on top of the emissive ripple term.
///
/// The fragment formula declares the light block but does not consume it;
/// this is the extension point where a future accumulation model plugs in.
pub trait LightingModel {
    fn contribution(&self, varyings: &Varyings, lights: &FrameLights) -> Vec4;
}

/// The shipped lighting model: contributes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlit;

impl LightingModel for Unlit {
    fn contribution(&self, _varyings: &Varyings, _lights: &FrameLights) -> Vec4 {
        Vec4::ZERO
    }
}

/// Transforms one vertex into world space and builds its tangent basis.
pub fn vertex_stage(
    camera: &CameraTransform,
    model: &ModelTransform,
    vertex: &VertexAttributes,
) -> VertexOutput {
    let world_position = model.matrix() * vertex.position.extend(1.0);
    let linear = model.linear();
    let normal = (linear * vertex.normal).normalize();
    let tangent = (linear * vertex.tangent).normalize();
    let bitangent = normal.cross(tangent);
    VertexOutput {
        clip_position: camera.projection * (camera.view * world_position),
        varyings: Varyings {
            world_position,
            normal,
            tangent_basis: Mat3::from_cols(tangent, bitangent, normal),
            texcoord: vertex.texcoord,
        },
    }
}

/// Computes the emissive ripple color for one fragment.
///
/// The texture coordinate is clamped to [0, 1] per axis before being
/// remapped to a centered [-1, 1] range, and the radial distance squared
/// saturates at the unit circle.
pub fn fragment_stage(varyings: &Varyings, material: &MaterialParams) -> Vec4 {
    let centered = 2.0 * varyings.texcoord.clamp(Vec2::ZERO, Vec2::ONE) - Vec2::ONE;
    let radial = centered.length_squared().min(1.0);
    let gate = (material.effect.x * 2.0).clamp(0.0, 1.0);
    let ripple = ((radial - material.effect.y).cos()
        + (centered.y - 2.0 * material.effect.y).sin())
    .abs()
    .clamp(0.0, 1.0);
    material.emissive * ripple * gate
}

/// Full fragment shade: the ripple term plus the lighting contribution.
pub fn shade<L: LightingModel>(
    varyings: &Varyings,
    material: &MaterialParams,
    lights: &FrameLights,
    lighting: &L,
) -> Vec4 {
    fragment_stage(varyings, material) + lighting.contribution(varyings, lights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn quad_vertex(texcoord: Vec2) -> VertexAttributes {
        VertexAttributes {
            position: Vec3::new(texcoord.x * 2.0 - 1.0, texcoord.y * 2.0 - 1.0, 0.0),
            normal: Vec3::Z,
            tangent: Vec3::X,
            texcoord,
        }
    }

    fn varyings_at(texcoord: Vec2) -> Varyings {
        vertex_stage(
            &CameraTransform::IDENTITY,
            &ModelTransform::IDENTITY,
            &quad_vertex(texcoord),
        )
        .varyings
    }

    #[test]
    fn rigid_transform_preserves_unit_directions() {
        let model = ModelTransform::from_rotation_translation(
            Quat::from_euler(glam::EulerRot::ZYX, 0.7, -0.4, 1.3),
            Vec3::new(5.0, -1.0, 2.0),
        );
        let output = vertex_stage(
            &CameraTransform::IDENTITY,
            &model,
            &quad_vertex(Vec2::new(0.25, 0.75)),
        );
        let basis = output.varyings.tangent_basis;
        assert!((output.varyings.normal.length() - 1.0).abs() < 1e-5);
        assert!((basis.x_axis.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn bitangent_is_orthogonal_to_both_columns() {
        let model = ModelTransform::from_scale_rotation_translation(
            3.0,
            Quat::from_rotation_x(0.9),
            Vec3::ZERO,
        );
        let basis = vertex_stage(
            &CameraTransform::IDENTITY,
            &model,
            &quad_vertex(Vec2::new(0.0, 0.0)),
        )
        .varyings
        .tangent_basis;
        let (tangent, bitangent, normal) = (basis.x_axis, basis.y_axis, basis.z_axis);
        assert!(bitangent.dot(normal).abs() < 1e-5);
        assert!(bitangent.dot(tangent).abs() < 1e-5);
        assert!((normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn world_position_feeds_clip_position() {
        let camera = CameraTransform::new(
            glam::Mat4::perspective_rh(1.2, 1.0, 0.1, 50.0),
            glam::Mat4::from_translation(Vec3::new(0.0, 0.0, -4.0)),
        );
        let model = ModelTransform::from_rotation_translation(Quat::IDENTITY, Vec3::X);
        let output = vertex_stage(&camera, &model, &quad_vertex(Vec2::new(0.5, 0.5)));
        let expected = camera.projection * (camera.view * output.varyings.world_position);
        assert_eq!(output.clip_position, expected);
    }

    #[test]
    fn centered_texcoord_reproduces_the_emissive_color() {
        let material = MaterialParams {
            emissive: Vec4::new(0.8, 0.4, 0.2, 1.0),
            effect: Vec4::new(0.5, 0.0, 0.0, 0.0),
        };
        let color = fragment_stage(&varyings_at(Vec2::new(0.5, 0.5)), &material);
        assert_eq!(color, material.emissive);
    }

    #[test]
    fn radial_distance_saturates_at_the_unit_circle() {
        let material = MaterialParams {
            emissive: Vec4::ONE,
            effect: Vec4::new(0.5, 0.3, 0.0, 0.0),
        };
        // (0.5, 1.0) sits exactly on the unit circle; the corners overshoot
        // to r = 2 and must clamp back to the same radial input.
        let on_circle = fragment_stage(&varyings_at(Vec2::new(0.5, 1.0)), &material);
        let corner_a = fragment_stage(&varyings_at(Vec2::new(0.0, 1.0)), &material);
        let corner_b = fragment_stage(&varyings_at(Vec2::new(1.0, 1.0)), &material);
        assert_eq!(on_circle, corner_a);
        assert_eq!(on_circle, corner_b);
    }

    #[test]
    fn zero_intensity_gate_forces_black() {
        let material = MaterialParams {
            emissive: Vec4::new(2.0, 1.5, 1.0, 1.0),
            effect: Vec4::new(0.0, 0.7, 0.0, 0.0),
        };
        for texcoord in [
            Vec2::new(0.5, 0.5),
            Vec2::new(0.1, 0.9),
            Vec2::new(1.0, 0.0),
        ] {
            assert_eq!(fragment_stage(&varyings_at(texcoord), &material), Vec4::ZERO);
        }
    }

    #[test]
    fn fragment_formula_is_idempotent() {
        let varyings = varyings_at(Vec2::new(0.3, 0.8));
        let material = MaterialParams {
            emissive: Vec4::new(1.0, 0.6, 0.25, 1.0),
            effect: Vec4::new(0.4, 1.7, 0.0, 0.0),
        };
        let first = fragment_stage(&varyings, &material);
        let second = fragment_stage(&varyings, &material);
        assert_eq!(first.to_array(), second.to_array());
    }

    #[test]
    fn overshooting_texcoords_clamp_before_the_remap() {
        let material = MaterialParams {
            emissive: Vec4::ONE,
            effect: Vec4::new(0.5, 0.2, 0.0, 0.0),
        };
        let clamped = fragment_stage(&varyings_at(Vec2::new(-0.5, 1.5)), &material);
        let edge = fragment_stage(&varyings_at(Vec2::new(0.0, 1.0)), &material);
        assert_eq!(clamped, edge);
    }

    #[test]
    fn unlit_model_leaves_the_ripple_term_unchanged() {
        let varyings = varyings_at(Vec2::new(0.6, 0.4));
        let material = MaterialParams {
            emissive: Vec4::new(0.9, 0.9, 0.9, 1.0),
            effect: Vec4::new(0.3, 0.1, 0.0, 0.0),
        };
        let mut lights = FrameLights::new();
        lights.push(Light {
            propagation: Vec4::new(1.0, 0.09, 0.032, 0.0),
            center: Vec4::new(0.0, 2.0, 0.0, 1.0),
            color: Vec4::ONE,
        });
        assert_eq!(
            shade(&varyings, &material, &lights, &Unlit),
            fragment_stage(&varyings, &material)
        );
    }

    #[test]
    fn light_block_rejects_records_past_capacity() {
        let mut lights = FrameLights::new();
        for _ in 0..MAX_LIGHTS {
            assert!(lights.push(Light::OFF));
        }
        assert!(!lights.push(Light::OFF));
        assert_eq!(lights.count(), MAX_LIGHTS as u32);
    }

    #[test]
    fn interpolation_blends_varyings_barycentrically() {
        let a = varyings_at(Vec2::new(0.0, 0.0));
        let b = varyings_at(Vec2::new(1.0, 0.0));
        let c = varyings_at(Vec2::new(0.0, 1.0));
        let at_a = Varyings::interpolate(&a, &b, &c, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(at_a, a);
        let mid = Varyings::interpolate(&a, &b, &c, Vec3::new(0.5, 0.25, 0.25));
        assert!((mid.texcoord - Vec2::new(0.25, 0.25)).length() < 1e-6);
    }
}
