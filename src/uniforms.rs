//! Byte-exact uniform block layouts shared with the caller-side buffers.
//!
//! Field order and padding must match the packing expected by the GPU
//! pipeline; the tests below pin the sizes so layout drift fails loudly.

use bytemuck::{Pod, Zeroable};

use crate::stage::{FrameLights, Light, MaterialParams, MAX_LIGHTS};
use crate::transform::{CameraTransform, ModelTransform};

/// Interleaved vertex stride: position(3) normal(3) tangent(3) texcoord(2).
pub const VERTEX_STRIDE: usize = 11 * std::mem::size_of::<f32>();

/// Camera block: projection then view.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl From<&CameraTransform> for CameraUniform {
    fn from(camera: &CameraTransform) -> Self {
        Self {
            projection: camera.projection.to_cols_array_2d(),
            view: camera.view.to_cols_array_2d(),
        }
    }
}

/// Model block: a single model matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
}

impl From<&ModelTransform> for ModelUniform {
    fn from(model: &ModelTransform) -> Self {
        Self {
            model: model.matrix().to_cols_array_2d(),
        }
    }
}

/// Fragment-args block: the light count in a full 16-byte slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FragmentArgsUniform {
    pub light_count: u32,
    _pad: [u32; 3],
}

impl FragmentArgsUniform {
    pub fn new(light_count: u32) -> Self {
        Self {
            light_count,
            _pad: [0; 3],
        }
    }
}

impl From<&FrameLights> for FragmentArgsUniform {
    fn from(lights: &FrameLights) -> Self {
        Self::new(lights.count())
    }
}

/// One packed light record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub propagation: [f32; 4],
    pub center: [f32; 4],
    pub color: [f32; 4],
}

impl From<&Light> for LightUniform {
    fn from(light: &Light) -> Self {
        Self {
            propagation: light.propagation.to_array(),
            center: light.center.to_array(),
            color: light.color.to_array(),
        }
    }
}

/// Lights block: the full fixed-capacity record array.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightsUniform {
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl From<&FrameLights> for LightsUniform {
    fn from(lights: &FrameLights) -> Self {
        let mut packed = [LightUniform::zeroed(); MAX_LIGHTS];
        for (slot, light) in packed.iter_mut().zip(lights.records()) {
            *slot = light.into();
        }
        Self { lights: packed }
    }
}

/// Material block: emissive color then effect parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub emissive: [f32; 4],
    pub effect: [f32; 4],
}

impl From<&MaterialParams> for MaterialUniform {
    fn from(material: &MaterialParams) -> Self {
        Self {
            emissive: material.emissive.to_array(),
            effect: material.effect.to_array(),
        }
    }
}
