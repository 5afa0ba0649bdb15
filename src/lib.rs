//! Forward shading stage for an emissive ripple effect.
//!
//! The shading math itself — the world-space transforms, the tangent-basis
//! construction and the fragment falloff formula — lives in pure functions
//! that run identically on the CPU and, through the embedded WGSL
//! translation, on the GPU. Window and swapchain management are
//! intentionally kept outside of the crate so that the code remains
//! testable and easy to embed in headless tools.

pub mod environment;
pub mod material;
pub mod pipeline;
pub mod preview;
pub mod stage;
pub mod transform;
pub mod uniforms;

pub use environment::{Cycle, Environment, EnvironmentState};
pub use material::{MaterialDef, MaterialLibrary};
pub use pipeline::ShadingPipeline;
pub use preview::{render_preview, PreviewOptions};
pub use stage::{
    fragment_stage, shade, vertex_stage, FrameLights, Light, LightingModel, MaterialParams, Unlit,
    Varyings, VertexAttributes, VertexOutput, MAX_LIGHTS,
};
pub use transform::{CameraTransform, ModelTransform, TransformError};
pub use uniforms::{
    CameraUniform, FragmentArgsUniform, LightUniform, LightsUniform, MaterialUniform,
    ModelUniform, VERTEX_STRIDE,
};
