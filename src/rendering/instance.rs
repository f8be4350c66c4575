use id_arena::Arena;
use wgpu::BufferUsages;

use crate::model::Instance;
use crate::rendering::render_model::RenderModel;
use crate::scene_graph::scene::Scene;

pub struct Instances {
    instances: Vec<Instance>,
}

impl Instances {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
        }
    }

    pub fn add(&mut self, instance: Instance) {
        if self.instances.len() as u64 >= InstanceBuffer::MAX_INSTANCES {
            log::warn!("Instance buffer full, dropping instance");
            return;
        }
        self.instances.push(instance);
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn write_to_buffer(&self, queue: &wgpu::Queue, instance_buffer: &InstanceBuffer) {
        queue.write_buffer(
            instance_buffer.buffer(),
            0,
            bytemuck::cast_slice(&self.instances),
        );
    }

    pub fn should_render(&self) -> bool {
        !self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

pub struct InstanceBuffer(wgpu::Buffer);

impl InstanceBuffer {
    const MAX_INSTANCES: u64 = 128;

    pub fn new(device: &wgpu::Device, name: impl Into<String>) -> Self {
        let name: String = name.into();

        let descriptor = Self::descriptor(&name);
        let buffer = device.create_buffer(&descriptor);

        Self(buffer)
    }

    fn descriptor(name: &str) -> wgpu::BufferDescriptor<'static> {
        // Damned lifetimes! Nothing a nice controlled memory leak can't fix.
        let label = format!("Instance buffer ({})", name);
        let label = label.into_boxed_str();
        let label = Box::leak(label);

        wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<Instance>() as u64 * Self::MAX_INSTANCES,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.0
    }

    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(1, self.buffer().slice(..));
    }
}

/// Rebuilds every model's instance list from the scene graph. Runs once
/// per frame, after the world matrices have been resolved.
pub fn gather_instances(scene: &Scene, render_models: &mut Arena<RenderModel>) {
    for (_id, render_model) in render_models.iter_mut() {
        render_model.instances.clear();
    }

    for (_id, object) in scene.objects.iter() {
        if !object.visible {
            continue;
        }

        let Some(model_id) = object.model_id else {
            continue;
        };

        let Some(render_model_id) = scene
            .models
            .get(model_id)
            .and_then(|scene_model| scene_model.render_model)
        else {
            continue;
        };

        let Some(render_model) = render_models.get_mut(render_model_id) else {
            continue;
        };

        render_model.instances.add(Instance {
            model: *object.transform.get_world_matrix(),
            tint: object.tint,
            emissive: object.emissive,
        });
    }
}
