use std::sync::Arc;

use glam::Vec2;
use id_arena::Arena;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    rendering::{
        global_uniform::{GlobalUniform, GlobalUniformState},
        instance::gather_instances,
        passes::{
            bloom_pass::BloomPass,
            mesh_pass::{MeshPass, MeshPassTextureViews},
            particle_pass::ParticlePass,
        },
        render_model::{render_model_instances, RenderModel},
        texture::{ColorTarget, DepthTexture},
    },
    scene_graph::scene::Scene,
    state::SceneState,
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    depth_texture: DepthTexture,
    scene_target: ColorTarget,
    global_uniform: GlobalUniform,
    render_models: Arena<RenderModel>,

    mesh_pass: MeshPass,
    particle_pass: ParticlePass,
    bloom_pass: BloomPass,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, state: &SceneState) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let depth_texture = DepthTexture::new(&device, &config, "Depth Texture");
        let scene_target = ColorTarget::new(
            &device,
            config.width,
            config.height,
            "Scene HDR target",
            ColorTarget::HDR_FORMAT,
        );

        let resolution = Vec2::new(config.width as f32, config.height as f32);
        let global_uniform =
            GlobalUniform::new(&device, GlobalUniformState::new(state, resolution));

        let mesh_pass = MeshPass::create(&device, &global_uniform);
        let particle_pass = ParticlePass::create(&device, &global_uniform);
        let bloom_pass = BloomPass::create(&device, &config, scene_target.view(), state.config.bloom);

        Ok(Self {
            window: window.clone(),
            size,
            surface,
            device,
            queue,
            config,
            depth_texture,
            scene_target,
            global_uniform,
            render_models: Arena::new(),
            mesh_pass,
            particle_pass,
            bloom_pass,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture.resize(&self.device, &self.config);
        self.scene_target
            .resize(&self.device, new_size.width, new_size.height);
        self.bloom_pass.resize(
            &self.device,
            &self.queue,
            &self.config,
            self.scene_target.view(),
        );
    }

    /// Creates GPU buffers for any scene model that does not have them
    /// yet. Props stream in from the loader mid-run, so this runs every
    /// frame and is a no-op once everything is uploaded.
    fn upload_new_models(&mut self, scene: &mut Scene) {
        for (_id, scene_model) in &mut scene.models {
            if scene_model.render_model.is_some() {
                continue;
            }

            let render_model = RenderModel::from_model(&self.device, &scene_model.model);
            let render_model_id = self.render_models.alloc(render_model);
            scene_model.render_model = Some(render_model_id);

            log::debug!(
                "Uploaded model {} with {} primitives",
                scene_model.name,
                scene_model.model.primitives.len()
            );
        }
    }

    pub fn render(&mut self, state: &mut SceneState) -> Result<(), wgpu::SurfaceError> {
        self.upload_new_models(&mut state.scene);

        let resolution = Vec2::new(self.size.width as f32, self.size.height as f32);
        self.global_uniform
            .update(&self.queue, GlobalUniformState::new(state, resolution));

        gather_instances(&state.scene, &mut self.render_models);
        self.particle_pass
            .update_instances(&self.queue, &state.particles);

        let output = self.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // The sky is just the fog color; distant geometry fades into it.
        let fog = state.fog();
        let clear_color = wgpu::Color {
            r: fog.x as f64,
            g: fog.y as f64,
            b: fog.z as f64,
            a: 1.0,
        };

        let texture_views = MeshPassTextureViews {
            color: self.scene_target.view().clone(),
            depth: self.depth_texture.view().clone(),
        };

        self.mesh_pass.render(
            &texture_views,
            &mut encoder,
            &self.global_uniform.bind_group,
            clear_color,
            |render_pass| {
                for (_id, render_model) in self.render_models.iter() {
                    if !render_model.instances.should_render() {
                        continue;
                    }

                    render_model_instances(render_pass, &self.queue, render_model);
                }
            },
        );

        self.particle_pass
            .render(&texture_views, &mut encoder, &self.global_uniform.bind_group);

        self.bloom_pass.render(&mut encoder, &surface_view);

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}
