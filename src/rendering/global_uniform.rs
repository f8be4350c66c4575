use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::state::SceneState;

/// Everything the shaders read per frame, packed into one uniform. The
/// `w` lanes carry the scalar that belongs with each vector; the WGSL
/// structs mirror this layout field for field.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GlobalUniformState {
    pub view_proj: Mat4,
    /// xyz: eye position, w: elapsed time in seconds.
    pub camera_pos: Vec4,
    /// Billboard basis for the particle quads.
    pub camera_right: Vec4,
    pub camera_up: Vec4,
    /// rgb: fog color, w: exp2 fog density.
    pub fog: Vec4,
    /// rgb: ambient color, w: intensity.
    pub ambient: Vec4,
    /// xyz: moonlight direction, w: intensity.
    pub moon_dir: Vec4,
    /// rgb: moonlight color (blood tinted), w: lightning flash intensity.
    pub moon_color: Vec4,
    /// xyz: ember light position, w: falloff radius.
    pub ember_pos: Vec4,
    /// rgb: ember color, w: flickering intensity.
    pub ember_color: Vec4,
    /// xyz: torch position, w: cosine of the inner cone angle.
    pub torch_pos: Vec4,
    /// xyz: torch direction, w: cosine of the outer cone angle.
    pub torch_dir: Vec4,
    /// rgb: torch color, w: intensity.
    pub torch_color: Vec4,
}

impl GlobalUniformState {
    pub fn new(state: &SceneState, resolution: Vec2) -> Self {
        let eye = state.camera.eye();
        let forward = state.camera.forward();
        let right = Vec3::Y.cross(forward).normalize_or(Vec3::X);
        let up = forward.cross(right);

        let lights = &state.lights;
        let flash = state.lightning.flash_intensity();

        Self {
            view_proj: state.camera.view_proj(resolution),
            camera_pos: eye.extend(state.time),
            camera_right: right.extend(0.0),
            camera_up: up.extend(0.0),
            fog: state.fog(),
            ambient: lights.ambient.color.extend(lights.ambient.intensity),
            moon_dir: lights
                .moonlight
                .direction
                .extend(lights.moonlight.intensity),
            moon_color: lights.moonlight.color.extend(flash),
            ember_pos: lights.ember.position.extend(lights.ember.radius),
            ember_color: lights.ember.color.extend(lights.ember.intensity),
            torch_pos: lights.torch.position.extend(lights.torch.inner_cutoff),
            torch_dir: lights.torch.direction.extend(lights.torch.outer_cutoff),
            torch_color: lights.torch.color.extend(lights.torch.intensity),
        }
    }
}

pub struct GlobalUniform {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl GlobalUniform {
    pub fn new(device: &wgpu::Device, initial_state: GlobalUniformState) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Global uniform buffer"),
            contents: bytemuck::cast_slice(&[initial_state]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Global uniform bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global uniform bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, state: GlobalUniformState) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[state]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    #[test]
    fn uniform_layout_matches_the_wgsl_struct() {
        // mat4x4 plus twelve vec4s, no implicit padding.
        assert_eq!(std::mem::size_of::<GlobalUniformState>(), 64 + 12 * 16);
    }

    #[test]
    fn billboard_basis_is_orthonormal() {
        let mut state = SceneState::new(SceneConfig::default()).unwrap();
        state.update(1.0 / 60.0);

        let uniform = GlobalUniformState::new(&state, Vec2::new(1280.0, 720.0));
        let right = uniform.camera_right.truncate();
        let up = uniform.camera_up.truncate();

        assert!((right.length() - 1.0).abs() < 1e-4);
        assert!((up.length() - 1.0).abs() < 1e-4);
        assert!(right.dot(up).abs() < 1e-4);
    }
}
