//! CPU reference path: rasterizes a full-screen quad through the stage
//! functions, standing in for the GPU pipeline in headless tools and tests.

use glam::{Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};

use crate::stage::{
    fragment_stage, vertex_stage, MaterialParams, Varyings, VertexAttributes, VertexOutput,
};
use crate::transform::{CameraTransform, ModelTransform};

/// Options for the CPU preview rasterizer.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOptions {
    pub width: u32,
    pub height: u32,
    pub background: Vec4,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            background: crate::environment::BACKGROUNDS[0],
        }
    }
}

/// Renders the effect on a full-screen quad and blends it over the
/// background, mirroring the GPU pipeline's alpha blending.
pub fn render_preview(options: &PreviewOptions, material: &MaterialParams) -> RgbaImage {
    let camera = CameraTransform::IDENTITY;
    let model = ModelTransform::IDENTITY;
    let corners = [
        quad_corner(-1.0, -1.0, 0.0, 0.0),
        quad_corner(1.0, -1.0, 1.0, 0.0),
        quad_corner(1.0, 1.0, 1.0, 1.0),
        quad_corner(-1.0, 1.0, 0.0, 1.0),
    ];
    let transformed: Vec<VertexOutput> = corners
        .iter()
        .map(|vertex| vertex_stage(&camera, &model, vertex))
        .collect();
    let triangles = [[0usize, 1, 2], [0, 2, 3]];

    let mut image = RgbaImage::new(options.width, options.height);
    for y in 0..options.height {
        for x in 0..options.width {
            let ndc = Vec2::new(
                (x as f32 + 0.5) / options.width as f32 * 2.0 - 1.0,
                1.0 - (y as f32 + 0.5) / options.height as f32 * 2.0,
            );
            let mut color = options.background;
            for triangle in &triangles {
                let a = &transformed[triangle[0]];
                let b = &transformed[triangle[1]];
                let c = &transformed[triangle[2]];
                if let Some(bary) =
                    barycentric(ndc, a.clip_position, b.clip_position, c.clip_position)
                {
                    let varyings =
                        Varyings::interpolate(&a.varyings, &b.varyings, &c.varyings, bary);
                    color = blend_over(fragment_stage(&varyings, material), options.background);
                    break;
                }
            }
            image.put_pixel(x, y, to_rgba8(color));
        }
    }
    image
}

fn quad_corner(x: f32, y: f32, u: f32, v: f32) -> VertexAttributes {
    VertexAttributes {
        position: Vec3::new(x, y, 0.0),
        normal: Vec3::Z,
        tangent: Vec3::X,
        texcoord: Vec2::new(u, v),
    }
}

fn barycentric(point: Vec2, a: Vec4, b: Vec4, c: Vec4) -> Option<Vec3> {
    let a = Vec2::new(a.x, a.y);
    let b = Vec2::new(b.x, b.y);
    let c = Vec2::new(c.x, c.y);
    let area = edge(a, b, c);
    if area.abs() <= f32::EPSILON {
        return None;
    }
    let w0 = edge(b, c, point) / area;
    let w1 = edge(c, a, point) / area;
    let w2 = edge(a, b, point) / area;
    (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0).then_some(Vec3::new(w0, w1, w2))
}

fn edge(a: Vec2, b: Vec2, point: Vec2) -> f32 {
    (b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x)
}

/// Source-over blending with straight alpha, matching the GPU blend state.
fn blend_over(source: Vec4, destination: Vec4) -> Vec4 {
    let rgb = source.truncate() * source.w + destination.truncate() * (1.0 - source.w);
    let alpha = source.w + destination.w * (1.0 - source.w);
    rgb.extend(alpha)
}

fn to_rgba8(color: Vec4) -> Rgba<u8> {
    Rgba(color.to_array().map(|channel| {
        (channel.clamp(0.0, 1.0) * 255.0).round() as u8
    }))
}
