//! GPU binding surface for the shading stage.
//!
//! The WGSL below is the authoritative GPU translation of the stage
//! functions in [`crate::stage`]; the Rust structs in [`crate::uniforms`]
//! pin its uniform block layouts byte for byte.

use std::num::NonZeroU64;

use bytemuck::bytes_of;

use crate::stage::{FrameLights, MaterialParams};
use crate::transform::{CameraTransform, ModelTransform};
use crate::uniforms::{
    CameraUniform, FragmentArgsUniform, LightsUniform, MaterialUniform, ModelUniform,
    VERTEX_STRIDE,
};

pub const SHADER: &str = r#"
struct CameraBlock {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
}

struct ModelBlock {
    model: mat4x4<f32>,
}

struct MaterialBlock {
    emissive: vec4<f32>,
    effect: vec4<f32>,
}

struct FragmentArgs {
    light_count: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

struct Light {
    propagation: vec4<f32>,
    center: vec4<f32>,
    color: vec4<f32>,
}

struct LightsBlock {
    lights: array<Light, 16u>,
}

@group(0) @binding(0)
var<uniform> camera: CameraBlock;

@group(1) @binding(0)
var<uniform> model: ModelBlock;

@group(2) @binding(0)
var<uniform> material: MaterialBlock;

@group(2) @binding(1)
var<uniform> fragment_args: FragmentArgs;

@group(2) @binding(2)
var<uniform> lights: LightsBlock;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tangent: vec3<f32>,
    @location(3) texcoord: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec4<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tangent: vec3<f32>,
    @location(3) bitangent: vec3<f32>,
    @location(4) texcoord: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    let world_position = model.model * vec4<f32>(input.position, 1.0);
    let linear = mat3x3<f32>(model.model[0].xyz, model.model[1].xyz, model.model[2].xyz);
    let normal = normalize(linear * input.normal);
    let tangent = normalize(linear * input.tangent);
    output.clip_position = camera.projection * (camera.view * world_position);
    output.world_position = world_position;
    output.normal = normal;
    output.tangent = tangent;
    output.bitangent = cross(normal, tangent);
    output.texcoord = input.texcoord;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let centered = 2.0 * clamp(input.texcoord, vec2<f32>(0.0), vec2<f32>(1.0)) - vec2<f32>(1.0);
    let radial = min(dot(centered, centered), 1.0);
    let gate = clamp(material.effect.x * 2.0, 0.0, 1.0);
    let ripple = clamp(abs(cos(radial - material.effect.y) + sin(centered.y - 2.0 * material.effect.y)), 0.0, 1.0);
    return material.emissive * ripple * gate;
}
"#;

/// Render pipeline hosting the two stages, plus the uniform buffers that
/// back its bind groups. Vertex buffers and the draw call stay with the
/// caller.
pub struct ShadingPipeline {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    model_buffer: wgpu::Buffer,
    material_buffer: wgpu::Buffer,
    fragment_args_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    model_bind_group: wgpu::BindGroup,
    shading_bind_group: wgpu::BindGroup,
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    },
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 12,
        shader_location: 1,
    },
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 24,
        shader_location: 2,
    },
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 36,
        shader_location: 3,
    },
];

impl ShadingPipeline {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ripple-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera-bind-layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                std::mem::size_of::<CameraUniform>(),
            )],
        });
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("model-bind-layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                std::mem::size_of::<ModelUniform>(),
            )],
        });
        let shading_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shading-bind-layout"),
            entries: &[
                uniform_entry(
                    0,
                    wgpu::ShaderStages::FRAGMENT,
                    std::mem::size_of::<MaterialUniform>(),
                ),
                uniform_entry(
                    1,
                    wgpu::ShaderStages::FRAGMENT,
                    std::mem::size_of::<FragmentArgsUniform>(),
                ),
                uniform_entry(
                    2,
                    wgpu::ShaderStages::FRAGMENT,
                    std::mem::size_of::<LightsUniform>(),
                ),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ripple-pipeline-layout"),
            bind_group_layouts: &[&camera_layout, &model_layout, &shading_layout],
            push_constant_ranges: &[],
        });

        let camera_buffer = uniform_buffer::<CameraUniform>(device, "camera-uniform");
        let model_buffer = uniform_buffer::<ModelUniform>(device, "model-uniform");
        let material_buffer = uniform_buffer::<MaterialUniform>(device, "material-uniform");
        let fragment_args_buffer =
            uniform_buffer::<FragmentArgsUniform>(device, "fragment-args-uniform");
        let lights_buffer = uniform_buffer::<LightsUniform>(device, "lights-uniform");

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera-bind-group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });
        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model-bind-group"),
            layout: &model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });
        let shading_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shading-bind-group"),
            layout: &shading_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: material_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: fragment_args_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: lights_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ripple-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Self::vertex_layout()],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            camera_buffer,
            model_buffer,
            material_buffer,
            fragment_args_buffer,
            lights_buffer,
            camera_bind_group,
            model_bind_group,
            shading_bind_group,
        }
    }

    /// Layout of the interleaved attribute stream consumed by `vs_main`.
    pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: VERTEX_STRIDE as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &VERTEX_ATTRIBUTES,
        }
    }

    pub fn write_camera(&self, queue: &wgpu::Queue, camera: &CameraTransform) {
        queue.write_buffer(&self.camera_buffer, 0, bytes_of(&CameraUniform::from(camera)));
    }

    pub fn write_model(&self, queue: &wgpu::Queue, model: &ModelTransform) {
        queue.write_buffer(&self.model_buffer, 0, bytes_of(&ModelUniform::from(model)));
    }

    pub fn write_material(&self, queue: &wgpu::Queue, material: &MaterialParams) {
        queue.write_buffer(
            &self.material_buffer,
            0,
            bytes_of(&MaterialUniform::from(material)),
        );
    }

    pub fn write_lights(&self, queue: &wgpu::Queue, lights: &FrameLights) {
        queue.write_buffer(
            &self.fragment_args_buffer,
            0,
            bytes_of(&FragmentArgsUniform::from(lights)),
        );
        queue.write_buffer(&self.lights_buffer, 0, bytes_of(&LightsUniform::from(lights)));
    }

    /// Sets the pipeline and its three bind groups on a render pass.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_bind_group(1, &self.model_bind_group, &[]);
        pass.set_bind_group(2, &self.shading_bind_group, &[]);
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: Some(NonZeroU64::new(size as u64).unwrap()),
        },
        count: None,
    }
}

fn uniform_buffer<T>(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<T>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
