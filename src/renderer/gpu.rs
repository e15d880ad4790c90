// renderer/gpu.rs
use glam::Mat4;

use crate::asset::AssetCache;
use crate::renderer::arena::{ArenaBuffers, BufferArena};
use crate::renderer::backend::{BatchBackend, PreparedFrame};
use crate::renderer::command::DrawIndexedIndirectArgs;
use crate::renderer::texture_slots::{TextureId, MAX_TEXTURE_SLOTS};
use crate::renderer::uniforms::FrameUniform;
use crate::renderer::{Depth, Texture};
use crate::settings::BatchLimits;

const SAMPLER_BINDING: u32 = MAX_TEXTURE_SLOTS as u32;

/// Attachments the batches of the current frame are drawn into.
struct FrameTarget {
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
    /// Set after the first pass, which clears; later passes load.
    cleared: bool,
}

/// [`BatchBackend`] that draws through wgpu with one
/// `multi_draw_indexed_indirect` per render.
pub struct GpuBatchBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,

    frame_buf: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: AssetCache<Texture>,
    white: Texture,

    arena: ArenaBuffers,
    indirect_buf: wgpu::Buffer,
    max_draw_commands: usize,
    indirect_first_instance: bool,

    clear_color: wgpu::Color,
    target: Option<FrameTarget>,
}

impl GpuBatchBackend {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        limits: BatchLimits,
        clear_color: wgpu::Color,
    ) -> Self {
        let frame_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FrameUniformBuffer"),
            size: FrameUniform::SIZE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&frame_buf, 0, bytemuck::bytes_of(&FrameUniform::new()));

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("FrameBindLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(FrameUniform::SIZE),
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("FrameBindGroup"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buf.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("TextureSlotsLayout"),
            entries: &texture_layout_entries(),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("BatchSampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("BatchShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/batch.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("BatchPipelineLayout"),
            bind_group_layouts: &[&frame_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = create_pipeline(device, &pipeline_layout, &shader, color_format);

        let arena = ArenaBuffers::new(device, limits.max_vertex_count, limits.max_index_count);

        let indirect_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("IndirectBuffer"),
            size: limits.max_draw_commands.max(1) as wgpu::BufferAddress
                * DrawIndexedIndirectArgs::SIZE,
            usage: wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let indirect_first_instance = device
            .features()
            .contains(wgpu::Features::INDIRECT_FIRST_INSTANCE);
        if !indirect_first_instance {
            log::info!("INDIRECT_FIRST_INSTANCE unavailable, first_instance forced to 0");
        }

        let white = Texture::white(device, queue);

        Self {
            device: device.clone(),
            queue: queue.clone(),
            pipeline,
            frame_buf,
            frame_bind_group,
            texture_layout,
            sampler,
            textures: AssetCache::new(),
            white,
            arena,
            indirect_buf,
            max_draw_commands: limits.max_draw_commands,
            indirect_first_instance,
            clear_color,
            target: None,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Registers a texture for use with `SceneRenderer::texture_slot`.
    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.insert(texture)
    }

    /// Points subsequent draws at `color` / `depth`. The first draw of the frame
    /// clears both.
    pub fn begin_frame(&mut self, color: wgpu::TextureView, depth: &wgpu::TextureView) {
        self.target = Some(FrameTarget {
            color,
            depth: depth.clone(),
            cleared: false,
        });
    }

    /// Releases the frame target. A frame that drew nothing is still cleared.
    pub fn end_frame(&mut self) {
        let Some(target) = self.target.take() else {
            return;
        };
        if target.cleared {
            return;
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ClearEncoder"),
            });
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ClearPass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.queue.submit(Some(encoder.finish()));
    }

    fn texture_bind_group(&self, slots: &[Option<TextureId>]) -> wgpu::BindGroup {
        let views: Vec<&wgpu::TextureView> = (0..MAX_TEXTURE_SLOTS)
            .map(|slot| {
                slots
                    .get(slot)
                    .copied()
                    .flatten()
                    .and_then(|id| self.textures.get(id))
                    .map_or(&self.white.view, |texture| &texture.view)
            })
            .collect();

        let mut entries: Vec<wgpu::BindGroupEntry> = views
            .iter()
            .enumerate()
            .map(|(binding, view)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: SAMPLER_BINDING,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("TextureSlotsBindGroup"),
            layout: &self.texture_layout,
            entries: &entries,
        })
    }
}

impl BatchBackend for GpuBatchBackend {
    fn upload_view_projection(&mut self, view_proj: Mat4) {
        let uniform = FrameUniform::from_matrix(view_proj);
        self.queue
            .write_buffer(&self.frame_buf, 0, bytemuck::bytes_of(&uniform));
    }

    fn draw(&mut self, frame: &PreparedFrame<'_>) {
        if frame.is_empty() {
            return;
        }
        if self.target.is_none() {
            log::warn!("Batch rendered without a frame target; discarding it");
            return;
        }

        let count = frame.commands.len().min(self.max_draw_commands);
        if count < frame.commands.len() {
            log::warn!(
                "Indirect buffer holds {} commands, dropping {}",
                self.max_draw_commands,
                frame.commands.len() - count
            );
        }

        self.arena.upload(
            &self.queue,
            bytemuck::cast_slice(frame.vertices),
            bytemuck::cast_slice(frame.indices),
        );

        if self.indirect_first_instance {
            self.queue.write_buffer(
                &self.indirect_buf,
                0,
                bytemuck::cast_slice(&frame.commands[..count]),
            );
        } else {
            let args: Vec<DrawIndexedIndirectArgs> = frame.commands[..count]
                .iter()
                .map(|args| DrawIndexedIndirectArgs {
                    first_instance: 0,
                    ..*args
                })
                .collect();
            self.queue
                .write_buffer(&self.indirect_buf, 0, bytemuck::cast_slice(&args));
        }

        let texture_bind_group = self.texture_bind_group(frame.textures);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("BatchEncoder"),
            });

        let Some(target) = self.target.as_mut() else {
            return;
        };
        let (color_load, depth_load) = if target.cleared {
            (wgpu::LoadOp::Load, wgpu::LoadOp::Load)
        } else {
            (
                wgpu::LoadOp::Clear(self.clear_color),
                wgpu::LoadOp::Clear(1.0),
            )
        };
        target.cleared = true;

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("BatchPass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.frame_bind_group, &[]);
            rpass.set_bind_group(1, &texture_bind_group, &[]);
            rpass.set_vertex_buffer(0, self.arena.vertex.slice(..));
            rpass.set_index_buffer(self.arena.index.slice(..), wgpu::IndexFormat::Uint32);
            rpass.multi_draw_indexed_indirect(&self.indirect_buf, 0, count as u32);
        }

        self.queue.submit(Some(encoder.finish()));
        log::trace!(
            "multi-draw of {} commands ({} vertices, {} indices)",
            count,
            frame.vertices.len(),
            frame.indices.len()
        );
    }
}

/// Alpha-blended, depth-tested triangle lists. Culling is off because
/// generated panels are seen from both sides.
fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("BatchPipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[BufferArena::vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            front_face: wgpu::FrontFace::Ccw,
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Depth::FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn texture_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..MAX_TEXTURE_SLOTS as u32)
        .map(|binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        })
        .collect();
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: SAMPLER_BINDING,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_layout_has_one_binding_per_slot_plus_sampler() {
        let entries = texture_layout_entries();
        assert_eq!(entries.len(), MAX_TEXTURE_SLOTS + 1);
        assert!(entries
            .iter()
            .enumerate()
            .all(|(i, entry)| entry.binding == i as u32));
        assert!(matches!(
            entries[MAX_TEXTURE_SLOTS].ty,
            wgpu::BindingType::Sampler(_)
        ));
    }

    // This test requires a GPU
    #[test]
    #[ignore]
    fn backend_draws_into_offscreen_target() {
        use crate::renderer::vertex::v;

        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .expect("Failed to find adapter");
            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .expect("Failed to create device");

            let format = wgpu::TextureFormat::Rgba8UnormSrgb;
            let color = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Offscreen"),
                size: wgpu::Extent3d {
                    width: 64,
                    height: 64,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let depth = Depth::new(&device, winit::dpi::PhysicalSize::new(64, 64));

            let mut backend = GpuBatchBackend::new(
                &device,
                &queue,
                format,
                BatchLimits::default(),
                wgpu::Color::BLACK,
            );
            backend.begin_frame(
                color.create_view(&wgpu::TextureViewDescriptor::default()),
                &depth.view,
            );
            backend.upload_view_projection(Mat4::IDENTITY);

            let vertices = [
                v([0.0, 0.0, 0.0], [1.0; 4], [0.0, 0.0], 0.0),
                v([1.0, 0.0, 0.0], [1.0; 4], [1.0, 0.0], 0.0),
                v([0.0, 1.0, 0.0], [1.0; 4], [0.0, 1.0], 0.0),
            ];
            let commands = [DrawIndexedIndirectArgs {
                index_count: 3,
                instance_count: 1,
                ..Default::default()
            }];
            backend.draw(&PreparedFrame {
                vertices: &vertices,
                indices: &[0, 1, 2],
                commands: &commands,
                textures: &[],
            });
            backend.end_frame();
        });
    }
}
