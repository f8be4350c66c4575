use std::f32::consts::TAU;
use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use gltf::buffer;
use itertools::izip;

use crate::math::bounds::BoundingSphere;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    position: Vec3,
    normal: Vec3,
    /// Stored as a plain array; `Vec4` is 16-byte aligned and would pad
    /// the struct, which `Pod` forbids.
    color: [f32; 4],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, color: Vec4) -> Self {
        Self {
            position,
            normal,
            color: color.to_array(),
        }
    }
}

pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<Model> {
        let mut model = Model {
            name: name.into(),
            primitives: Vec::new(),
        };

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(anyhow::anyhow!(
                    "Unsupported primitive mode: {:?}",
                    primitive.mode()
                ));
            }

            let base_color = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_factor();
            let color = Vec4::from_array(base_color);

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let position_reader = reader
                .read_positions()
                .ok_or_else(|| anyhow::anyhow!("Primitive without positions: {}", model.name))?;
            let normal_reader = reader
                .read_normals()
                .ok_or_else(|| anyhow::anyhow!("Primitive without normals: {}", model.name))?;

            let vertices = izip!(position_reader, normal_reader)
                .map(|(pos, normal)| Vertex::new(Vec3::from(pos), Vec3::from(normal), color))
                .collect::<Vec<Vertex>>();

            let index_reader = reader
                .read_indices()
                .ok_or_else(|| anyhow::anyhow!("Primitive without indices: {}", model.name))?;
            let indices = index_reader.into_u32().collect::<Vec<u32>>();

            model.primitives.push(ModelPrimitive {
                index: primitive.index(),
                vertices,
                indices,
            });
        }

        if model.primitives.is_empty() {
            return Err(anyhow::anyhow!("Mesh without primitives: {}", model.name));
        }

        Ok(model)
    }

    /// Offsets every vertex. Used when merging primitives into one model.
    pub fn translated(mut self, offset: Vec3) -> Model {
        for primitive in &mut self.primitives {
            for vertex in &mut primitive.vertices {
                vertex.position += offset;
            }
        }
        self
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::from_points(
            self.primitives
                .iter()
                .flat_map(|primitive| primitive.vertices.iter().map(|v| v.position)),
        )
    }

    /// Flat disc in the XZ plane, facing up. Used for the ground.
    pub fn disc(name: impl Into<String>, radius: f32, segments: u32, color: Vec4) -> Model {
        let mut vertices = vec![Vertex::new(Vec3::ZERO, Vec3::Y, color)];
        let mut indices = Vec::with_capacity(segments as usize * 3);

        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let position = Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);
            vertices.push(Vertex::new(position, Vec3::Y, color));
        }

        for i in 1..=segments {
            indices.extend_from_slice(&[0, i + 1, i]);
        }

        Model {
            name: name.into(),
            primitives: vec![ModelPrimitive {
                index: 0,
                vertices,
                indices,
            }],
        }
    }

    pub fn uv_sphere(
        name: impl Into<String>,
        radius: f32,
        rings: u32,
        segments: u32,
        color: Vec4,
    ) -> Model {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let polar = v * std::f32::consts::PI;
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let azimuth = u * TAU;
                let normal = Vec3::new(
                    polar.sin() * azimuth.cos(),
                    polar.cos(),
                    polar.sin() * azimuth.sin(),
                );
                vertices.push(Vertex::new(normal * radius, normal, color));
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }

        Model {
            name: name.into(),
            primitives: vec![ModelPrimitive {
                index: 0,
                vertices,
                indices,
            }],
        }
    }

    /// Cone with its base on the XZ plane and apex at `height`.
    pub fn cone(
        name: impl Into<String>,
        radius: f32,
        height: f32,
        segments: u32,
        color: Vec4,
    ) -> Model {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        let apex = Vec3::new(0.0, height, 0.0);
        let slope = (radius / height).atan();

        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let dir = Vec3::new(angle.cos(), 0.0, angle.sin());
            let normal = (dir * slope.cos() + Vec3::Y * slope.sin()).normalize();
            vertices.push(Vertex::new(dir * radius, normal, color));
            vertices.push(Vertex::new(apex, normal, color));
        }

        for i in 0..segments {
            let base = i * 2;
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        Model {
            name: name.into(),
            primitives: vec![ModelPrimitive {
                index: 0,
                vertices,
                indices,
            }],
        }
    }

    /// Open cylinder along +Y. Used for tree trunks.
    pub fn cylinder(
        name: impl Into<String>,
        radius: f32,
        height: f32,
        segments: u32,
        color: Vec4,
    ) -> Model {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let normal = Vec3::new(angle.cos(), 0.0, angle.sin());
            vertices.push(Vertex::new(normal * radius, normal, color));
            vertices.push(Vertex::new(
                normal * radius + Vec3::Y * height,
                normal,
                color,
            ));
        }

        for i in 0..segments {
            let base = i * 2;
            indices.extend_from_slice(&[base, base + 2, base + 1, base + 1, base + 2, base + 3]);
        }

        Model {
            name: name.into(),
            primitives: vec![ModelPrimitive {
                index: 0,
                vertices,
                indices,
            }],
        }
    }
}

pub const MODEL_VBL: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, color) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x4,
        },
    ],
};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Instance {
    pub model: Mat4,
    pub tint: Vec4,
    pub emissive: Vec4,
}

impl Instance {
    pub fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: offset_of!(Instance, tint) as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: offset_of!(Instance, emissive) as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_packed_without_padding() {
        // The GPU reads vertices at the field offsets in MODEL_VBL, so
        // the struct must be exactly its fields laid end to end.
        assert_eq!(std::mem::size_of::<Vertex>(), 40);
        assert_eq!(offset_of!(Vertex, position), 0);
        assert_eq!(offset_of!(Vertex, normal), 12);
        assert_eq!(offset_of!(Vertex, color), 24);
    }

    #[test]
    fn disc_is_centered_and_flat() {
        let disc = Model::disc("Ground", 20.0, 32, Vec4::ONE);
        let bounds = disc.bounding_sphere();
        assert!(bounds.center.length() < 1e-5);
        assert!((bounds.radius - 20.0).abs() < 1e-3);
        for vertex in &disc.primitives[0].vertices {
            assert_eq!(vertex.position.y, 0.0);
        }
    }

    #[test]
    fn sphere_vertices_sit_on_radius() {
        let sphere = Model::uv_sphere("Moon", 2.5, 8, 12, Vec4::ONE);
        for vertex in &sphere.primitives[0].vertices {
            assert!((vertex.position.length() - 2.5).abs() < 1e-4);
        }
    }
}
