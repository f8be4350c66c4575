use glam::Vec4;
use wgpu::util::DeviceExt;
use wgpu::{
    MultisampleState, PipelineCompilationOptions, RenderPassDescriptor, ShaderSource,
};

use crate::rendering::texture::ColorTarget;

const BRIGHT_CUTOFF: f32 = 1.0;
const BLOOM_STRENGTH: f32 = 0.8;
/// Widens the gaussian footprint beyond one texel per tap.
const BLUR_SPREAD: f32 = 1.5;

/// Bright-pass + separable blur + composite. The blur chain runs at half
/// resolution; the composite always runs since it also tonemaps the HDR
/// scene into the swapchain.
pub struct BloomPass {
    enabled: bool,

    threshold_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,

    sampler: wgpu::Sampler,
    filter_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,

    threshold_params: wgpu::Buffer,
    blur_h_params: wgpu::Buffer,
    blur_v_params: wgpu::Buffer,
    composite_params: wgpu::Buffer,

    bloom_a: ColorTarget,
    bloom_b: ColorTarget,

    threshold_bind_group: wgpu::BindGroup,
    blur_h_bind_group: wgpu::BindGroup,
    blur_v_bind_group: wgpu::BindGroup,
    composite_bind_group: wgpu::BindGroup,
}

fn half(extent: u32) -> u32 {
    (extent / 2).max(1)
}

impl BloomPass {
    pub fn create(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        scene_view: &wgpu::TextureView,
        enabled: bool,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom shader"),
            source: ShaderSource::Wgsl(include_str!("../shaders/bloom.wgsl").into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };
        let params_entry = wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let filter_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom filter bind group layout"),
            entries: &[texture_entry(0), sampler_entry, params_entry],
        });

        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom composite bind group layout"),
            entries: &[texture_entry(0), sampler_entry, params_entry, texture_entry(3)],
        });

        let make_params = |label: &str, data: Vec4| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&[data]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };

        let threshold_params = make_params(
            "Bloom threshold params",
            Vec4::new(BRIGHT_CUTOFF, 0.0, 0.0, 0.0),
        );
        let (step_h, step_v) = Self::blur_steps(config.width, config.height);
        let blur_h_params = make_params("Bloom blur params (horizontal)", step_h);
        let blur_v_params = make_params("Bloom blur params (vertical)", step_v);
        let strength = if enabled { BLOOM_STRENGTH } else { 0.0 };
        let composite_params = make_params(
            "Bloom composite params",
            Vec4::new(strength, 0.0, 0.0, 0.0),
        );

        let make_filter_pipeline = |label: &'static str, entry: &'static str, format| {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[if entry == "fs_composite" {
                    &composite_layout
                } else {
                    &filter_layout
                }],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_fullscreen"),
                    buffers: &[],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let threshold_pipeline = make_filter_pipeline(
            "Bloom threshold pipeline",
            "fs_threshold",
            ColorTarget::HDR_FORMAT,
        );
        let blur_pipeline =
            make_filter_pipeline("Bloom blur pipeline", "fs_blur", ColorTarget::HDR_FORMAT);
        let composite_pipeline =
            make_filter_pipeline("Bloom composite pipeline", "fs_composite", config.format);

        let bloom_a = ColorTarget::new(
            device,
            half(config.width),
            half(config.height),
            "Bloom target A",
            ColorTarget::HDR_FORMAT,
        );
        let bloom_b = ColorTarget::new(
            device,
            half(config.width),
            half(config.height),
            "Bloom target B",
            ColorTarget::HDR_FORMAT,
        );

        let threshold_bind_group = Self::filter_bind_group(
            device,
            &filter_layout,
            "Bloom threshold bind group",
            scene_view,
            &sampler,
            &threshold_params,
        );
        let blur_h_bind_group = Self::filter_bind_group(
            device,
            &filter_layout,
            "Bloom blur bind group (horizontal)",
            bloom_a.view(),
            &sampler,
            &blur_h_params,
        );
        let blur_v_bind_group = Self::filter_bind_group(
            device,
            &filter_layout,
            "Bloom blur bind group (vertical)",
            bloom_b.view(),
            &sampler,
            &blur_v_params,
        );
        let composite_bind_group = Self::composite_bind_group(
            device,
            &composite_layout,
            scene_view,
            bloom_a.view(),
            &sampler,
            &composite_params,
        );

        BloomPass {
            enabled,
            threshold_pipeline,
            blur_pipeline,
            composite_pipeline,
            sampler,
            filter_layout,
            composite_layout,
            threshold_params,
            blur_h_params,
            blur_v_params,
            composite_params,
            bloom_a,
            bloom_b,
            threshold_bind_group,
            blur_h_bind_group,
            blur_v_bind_group,
            composite_bind_group,
        }
    }

    fn filter_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        source: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        params: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.as_entire_binding(),
                },
            ],
        })
    }

    fn composite_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        scene_view: &wgpu::TextureView,
        bloom_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        params: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom composite bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(bloom_view),
                },
            ],
        })
    }

    /// One texel at the half-res bloom targets, scaled by the spread.
    fn blur_steps(width: u32, height: u32) -> (Vec4, Vec4) {
        let texel_x = BLUR_SPREAD / half(width) as f32;
        let texel_y = BLUR_SPREAD / half(height) as f32;
        (
            Vec4::new(texel_x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, texel_y, 0.0, 0.0),
        )
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &wgpu::SurfaceConfiguration,
        scene_view: &wgpu::TextureView,
    ) {
        self.bloom_a
            .resize(device, half(config.width), half(config.height));
        self.bloom_b
            .resize(device, half(config.width), half(config.height));

        let (step_h, step_v) = Self::blur_steps(config.width, config.height);
        queue.write_buffer(&self.blur_h_params, 0, bytemuck::cast_slice(&[step_h]));
        queue.write_buffer(&self.blur_v_params, 0, bytemuck::cast_slice(&[step_v]));

        self.threshold_bind_group = Self::filter_bind_group(
            device,
            &self.filter_layout,
            "Bloom threshold bind group",
            scene_view,
            &self.sampler,
            &self.threshold_params,
        );
        self.blur_h_bind_group = Self::filter_bind_group(
            device,
            &self.filter_layout,
            "Bloom blur bind group (horizontal)",
            self.bloom_a.view(),
            &self.sampler,
            &self.blur_h_params,
        );
        self.blur_v_bind_group = Self::filter_bind_group(
            device,
            &self.filter_layout,
            "Bloom blur bind group (vertical)",
            self.bloom_b.view(),
            &self.sampler,
            &self.blur_v_params,
        );
        self.composite_bind_group = Self::composite_bind_group(
            device,
            &self.composite_layout,
            scene_view,
            self.bloom_a.view(),
            &self.sampler,
            &self.composite_params,
        );
    }

    fn fullscreen_pass(
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        target: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
    ) {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        if self.enabled {
            Self::fullscreen_pass(
                encoder,
                "Bloom Threshold Pass",
                self.bloom_a.view(),
                &self.threshold_pipeline,
                &self.threshold_bind_group,
            );
            Self::fullscreen_pass(
                encoder,
                "Bloom Blur Pass (horizontal)",
                self.bloom_b.view(),
                &self.blur_pipeline,
                &self.blur_h_bind_group,
            );
            Self::fullscreen_pass(
                encoder,
                "Bloom Blur Pass (vertical)",
                self.bloom_a.view(),
                &self.blur_pipeline,
                &self.blur_v_bind_group,
            );
        }

        Self::fullscreen_pass(
            encoder,
            "Composite Pass",
            surface_view,
            &self.composite_pipeline,
            &self.composite_bind_group,
        );
    }
}
