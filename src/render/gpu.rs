use std::collections::HashMap;

use crate::{
    background::{descriptor::TextureId, source::BackgroundPixels},
    effects::{
        composite::{BlendLaw, CompositeParams},
        state_update::StateUpdateParams,
    },
    foundation::{
        core::{FrameSize, MaskPlane, VideoFrame},
        error::{MatteError, MatteResult},
    },
    render::{
        backend::{BackendStats, MatteBackend},
        ping_pong::PingPong,
        shaders::{self, CompositeUniforms, StateUniforms},
    },
    segmentation::SegmentationMasks,
};

const MASK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;
const PLANE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;
const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct GpuTexture {
    size: FrameSize,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct PassPipeline {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    params: wgpu::Buffer,
}

struct Gpu {
    device: wgpu::Device,
    queue: wgpu::Queue,
    sampler: wgpu::Sampler,
    state_update: PassPipeline,
    composite: PassPipeline,
    max_dimension: u32,
}

/// wgpu backend. The device and both pipelines are created on first use.
#[derive(Default)]
pub struct WgpuBackend {
    gpu: Option<Gpu>,
    targets: Option<PingPong<GpuTexture>>,
    backgrounds: HashMap<TextureId, GpuTexture>,
    output: Option<GpuTexture>,
    readback: Option<(u64, wgpu::Buffer)>,
    next_texture: u64,
    stats: BackendStats,
}

impl WgpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_gpu(&mut self) -> MatteResult<&Gpu> {
        if self.gpu.is_none() {
            self.gpu = Some(init_gpu()?);
        }
        self.gpu
            .as_ref()
            .ok_or_else(|| MatteError::resource("gpu backend not initialized"))
    }

    fn check_size(&mut self, size: FrameSize) -> MatteResult<()> {
        let max = self.ensure_gpu()?.max_dimension;
        if !fits_device(size, max) {
            return Err(MatteError::input(format!(
                "{}x{} is outside the device texture limits (1..={max})",
                size.width, size.height
            )));
        }
        Ok(())
    }

    fn read_texture(
        &mut self,
        texture: &wgpu::Texture,
        size: FrameSize,
        bytes_per_pixel: u32,
    ) -> MatteResult<Vec<u8>> {
        let gpu = self
            .gpu
            .as_ref()
            .ok_or_else(|| MatteError::resource("gpu backend not initialized"))?;

        let row_bytes = size
            .width
            .checked_mul(bytes_per_pixel)
            .ok_or_else(|| MatteError::resource("readback row overflow"))?;
        let padded_row_bytes = align_to(row_bytes, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let needed = u64::from(padded_row_bytes) * u64::from(size.height);

        let reuse = matches!(&self.readback, Some((capacity, _)) if *capacity >= needed);
        if !reuse {
            let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("segmatte_readback"),
                size: needed,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.readback = Some((needed, buffer));
        }
        let (_, readback) = self
            .readback
            .as_ref()
            .ok_or_else(|| MatteError::resource("readback buffer missing"))?;

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("segmatte_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: Some(size.height),
                },
            },
            extent(size),
        );
        gpu.queue.submit(Some(encoder.finish()));

        let slice = readback.slice(..needed);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        gpu.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| MatteError::resource(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| MatteError::resource("readback channel closed"))?
            .map_err(|e| MatteError::resource(format!("readback map failed: {e:?}")))?;

        let mapped = slice.get_mapped_range();
        let row_bytes = row_bytes as usize;
        let mut out = Vec::with_capacity(row_bytes * size.height as usize);
        for row in 0..size.height as usize {
            let start = row * padded_row_bytes as usize;
            out.extend_from_slice(&mapped[start..start + row_bytes]);
        }
        drop(mapped);
        readback.unmap();
        Ok(out)
    }
}

impl MatteBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn ensure_targets(&mut self, size: FrameSize) -> MatteResult<bool> {
        if let Some(targets) = &self.targets
            && targets.read().size == size
        {
            return Ok(false);
        }
        self.check_size(size)?;
        let gpu = self.ensure_gpu()?;

        let usage = wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_SRC;
        let a = create_texture(&gpu.device, "segmatte_mask_a", size, MASK_FORMAT, usage);
        let b = create_texture(&gpu.device, "segmatte_mask_b", size, MASK_FORMAT, usage);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("segmatte_mask_clear"),
            });
        for target in [&a, &b] {
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("segmatte_mask_clear_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        gpu.queue.submit(Some(encoder.finish()));

        self.targets = Some(PingPong::new(a, b));
        self.stats.target_allocations += 1;
        tracing::debug!(
            width = size.width,
            height = size.height,
            "allocated gpu mask targets"
        );
        Ok(true)
    }

    fn upload_background(&mut self, pixels: &BackgroundPixels) -> MatteResult<TextureId> {
        self.check_size(pixels.size())?;
        let gpu = self.ensure_gpu()?;
        let texture = upload_plane(
            gpu,
            "segmatte_background",
            pixels.size(),
            COLOR_FORMAT,
            4,
            pixels.data(),
        );
        self.next_texture += 1;
        let id = TextureId(self.next_texture);
        self.backgrounds.insert(id, texture);
        self.stats.background_uploads += 1;
        Ok(id)
    }

    fn refresh_background(
        &mut self,
        texture: TextureId,
        pixels: &BackgroundPixels,
    ) -> MatteResult<()> {
        self.ensure_gpu()?;
        let gpu = self
            .gpu
            .as_ref()
            .ok_or_else(|| MatteError::resource("gpu backend not initialized"))?;
        let slot = self.backgrounds.get(&texture).ok_or_else(|| {
            MatteError::resource(format!(
                "background texture {} is not resident",
                texture.as_u64()
            ))
        })?;
        if slot.size != pixels.size() {
            return Err(MatteError::asset(
                "streaming background changed size mid-stream",
            ));
        }
        write_plane(gpu, &slot.texture, slot.size, 4, pixels.data());
        self.stats.background_refreshes += 1;
        Ok(())
    }

    fn release_background(&mut self, texture: TextureId) {
        if let Some(tex) = self.backgrounds.remove(&texture) {
            tex.texture.destroy();
            self.stats.background_releases += 1;
        }
    }

    fn exec_state_update(
        &mut self,
        params: &StateUpdateParams,
        masks: &SegmentationMasks,
    ) -> MatteResult<()> {
        self.check_size(masks.size())?;
        let gpu = self
            .gpu
            .as_ref()
            .ok_or_else(|| MatteError::resource("gpu backend not initialized"))?;
        let targets = self
            .targets
            .as_mut()
            .ok_or_else(|| MatteError::input("mask targets are not allocated"))?;

        let plane_size = masks.size();
        let category = upload_plane(
            gpu,
            "segmatte_category",
            plane_size,
            PLANE_FORMAT,
            1,
            &masks.category().to_gray8(),
        );
        let confidence = upload_plane(
            gpu,
            "segmatte_confidence",
            plane_size,
            PLANE_FORMAT,
            1,
            &masks.confidence().to_gray8(),
        );

        let (previous, next) = targets.split();
        let size = previous.size;
        let uniforms = StateUniforms {
            resolution: [size.width as f32, size.height as f32],
            smoothing: params.smoothing,
            smoothstep_min: params.smoothstep_min,
            smoothstep_max: params.smoothstep_max,
            blur_radius: params.blur_radius.max(0.0),
            inverted: if params.polarity.is_inverted() { 1.0 } else { 0.0 },
            sticky_threshold: params.stickiness.threshold,
            sticky_slow: params.stickiness.slow_factor,
            sticky_slowest: params.stickiness.slowest_factor,
            _pad: [0.0; 2],
        };
        gpu.queue
            .write_buffer(&gpu.state_update.params, 0, bytemuck::bytes_of(&uniforms));

        let views = [&category.view, &confidence.view, &previous.view];
        scoped(&gpu.device, "state update", || {
            draw(gpu, &gpu.state_update, "segmatte_state_update", views, &next.view)
        })?;
        category.texture.destroy();
        confidence.texture.destroy();

        targets.swap();
        self.stats.state_updates += 1;
        Ok(())
    }

    fn exec_composite(
        &mut self,
        params: &CompositeParams,
        frame: &VideoFrame,
        background: TextureId,
    ) -> MatteResult<VideoFrame> {
        let size = frame.size();
        self.check_size(size)?;
        let gpu = self
            .gpu
            .as_ref()
            .ok_or_else(|| MatteError::resource("gpu backend not initialized"))?;
        let mask = self
            .targets
            .as_ref()
            .map(PingPong::read)
            .ok_or_else(|| MatteError::input("mask targets are not allocated"))?;
        if mask.size != size {
            return Err(MatteError::input("mask targets do not match the frame size"));
        }
        let bg = self.backgrounds.get(&background).ok_or_else(|| {
            MatteError::resource(format!(
                "background texture {} is not resident",
                background.as_u64()
            ))
        })?;

        if !matches!(&self.output, Some(out) if out.size == size) {
            self.output = Some(create_texture(
                &gpu.device,
                "segmatte_output",
                size,
                COLOR_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            ));
        }
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| MatteError::resource("output texture missing"))?;

        let src = upload_plane(gpu, "segmatte_frame", size, COLOR_FORMAT, 4, frame.data());
        let mut uniforms = CompositeUniforms {
            resolution: [size.width as f32, size.height as f32],
            bg_size: [bg.size.width as f32, bg.size.height as f32],
            blend_radius: params.blend_radius.max(0.0),
            ..bytemuck::Zeroable::zeroed()
        };
        match params.law {
            BlendLaw::BackgroundBlur {
                edge_lo,
                edge_hi,
                blur,
            } => {
                uniforms.edge_lo = edge_lo;
                uniforms.edge_hi = edge_hi;
                uniforms.mode = 0.0;
                uniforms.sigma = blur.sigma;
                uniforms.kernel_radius = blur.kernel_radius;
                uniforms.radius_step = blur.radius_step;
                uniforms.angle_steps = blur.angle_steps.max(1) as f32;
                uniforms.steps = blur.steps() as f32;
            }
            BlendLaw::VirtualBackground { edge_lo, edge_hi } => {
                uniforms.edge_lo = edge_lo;
                uniforms.edge_hi = edge_hi;
                uniforms.mode = 1.0;
            }
        }
        gpu.queue
            .write_buffer(&gpu.composite.params, 0, bytemuck::bytes_of(&uniforms));

        let views = [&src.view, &mask.view, &bg.view];
        scoped(&gpu.device, "composite", || {
            draw(gpu, &gpu.composite, "segmatte_composite", views, &output.view)
        })?;
        src.texture.destroy();

        let texture = output.texture.clone();
        let data = self.read_texture(&texture, size, 4)?;
        self.stats.composites += 1;
        VideoFrame::new(size.width, size.height, data)
    }

    fn exec_passthrough(&mut self, frame: VideoFrame) -> MatteResult<VideoFrame> {
        let size = frame.size();
        if size.is_empty() {
            return Ok(frame);
        }
        let max = self.ensure_gpu()?.max_dimension;
        if !fits_device(size, max) {
            tracing::debug!(
                width = size.width,
                height = size.height,
                max,
                "frame exceeds device texture limits, forwarded without upload"
            );
            self.stats.passthroughs += 1;
            return Ok(frame);
        }
        let gpu = self.ensure_gpu()?;
        let src = upload_plane(
            gpu,
            "segmatte_passthrough",
            size,
            COLOR_FORMAT,
            4,
            frame.data(),
        );
        let data = self.read_texture(&src.texture, size, 4)?;
        src.texture.destroy();
        self.stats.passthroughs += 1;
        VideoFrame::new(size.width, size.height, data)
    }

    fn mask_snapshot(&mut self) -> MatteResult<Option<MaskPlane>> {
        let Some((texture, size)) = self
            .targets
            .as_ref()
            .map(|t| (t.read().texture.clone(), t.read().size))
        else {
            return Ok(None);
        };
        let bytes = self.read_texture(&texture, size, 2)?;
        let values = bytes
            .chunks_exact(2)
            .map(|b| f16_to_f32(u16::from_le_bytes([b[0], b[1]])))
            .collect();
        Ok(Some(MaskPlane::new(size.width, size.height, values)?))
    }

    fn release(&mut self) {
        self.targets = None;
        self.output = None;
        self.readback = None;
        self.stats.background_releases += self.backgrounds.len() as u64;
        self.backgrounds.clear();
        self.gpu = None;
    }

    fn stats(&self) -> BackendStats {
        self.stats
    }
}

fn init_gpu() -> MatteResult<Gpu> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .map_err(|e| match e {
        wgpu::RequestAdapterError::NotFound { .. } => {
            MatteError::resource("no gpu adapter available")
        }
        other => MatteError::resource(format!("wgpu request_adapter failed: {other:?}")),
    })?;

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("segmatte_device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        experimental_features: wgpu::ExperimentalFeatures::default(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: wgpu::Trace::Off,
    }))
    .map_err(|e| MatteError::resource(format!("wgpu request_device failed: {e:?}")))?;

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("segmatte_linear_clamp"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let state_update = scoped(&device, "state update pipeline", || {
        build_pass(
            &device,
            "segmatte_state_update",
            shaders::state_update_wgsl(),
            MASK_FORMAT,
            std::mem::size_of::<StateUniforms>() as u64,
        )
    })?;
    let composite = scoped(&device, "composite pipeline", || {
        build_pass(
            &device,
            "segmatte_composite",
            shaders::composite_wgsl(),
            COLOR_FORMAT,
            std::mem::size_of::<CompositeUniforms>() as u64,
        )
    })?;

    let max_dimension = device.limits().max_texture_dimension_2d;
    tracing::debug!(adapter = ?adapter.get_info().name, "gpu backend initialized");
    Ok(Gpu {
        device,
        queue,
        sampler,
        state_update,
        composite,
        max_dimension,
    })
}

/// Run `f` inside a validation error scope; a captured error is fatal.
fn scoped<T>(device: &wgpu::Device, what: &str, f: impl FnOnce() -> T) -> MatteResult<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let out = f();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(MatteError::resource(format!("gpu {what} failed: {err}"))),
        None => Ok(out),
    }
}

fn build_pass(
    device: &wgpu::Device,
    label: &str,
    source: String,
    target: wgpu::TextureFormat,
    uniform_size: u64,
) -> PassPipeline {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            texture_entry(0),
            texture_entry(1),
            texture_entry(2),
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(uniform_size),
                },
                count: None,
            },
        ],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    let params = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: uniform_size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    PassPipeline {
        pipeline,
        layout,
        params,
    }
}

fn draw(
    gpu: &Gpu,
    pass: &PassPipeline,
    label: &str,
    views: [&wgpu::TextureView; 3],
    target: &wgpu::TextureView,
) {
    let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &pass.layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(views[0]),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(views[1]),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(views[2]),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(&gpu.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: pass.params.as_entire_binding(),
            },
        ],
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
    {
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rp.set_pipeline(&pass.pipeline);
        rp.set_bind_group(0, &bind_group, &[]);
        rp.draw(0..3, 0..1);
    }
    gpu.queue.submit(Some(encoder.finish()));
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    size: FrameSize,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> GpuTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(size),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        size,
        texture,
        view,
    }
}

fn upload_plane(
    gpu: &Gpu,
    label: &str,
    size: FrameSize,
    format: wgpu::TextureFormat,
    bytes_per_pixel: u32,
    data: &[u8],
) -> GpuTexture {
    let tex = create_texture(
        &gpu.device,
        label,
        size,
        format,
        wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC,
    );
    write_plane(gpu, &tex.texture, size, bytes_per_pixel, data);
    tex
}

fn write_plane(
    gpu: &Gpu,
    texture: &wgpu::Texture,
    size: FrameSize,
    bytes_per_pixel: u32,
    data: &[u8],
) {
    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(size.width * bytes_per_pixel),
            rows_per_image: Some(size.height),
        },
        extent(size),
    );
}

fn extent(size: FrameSize) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    }
}

fn fits_device(size: FrameSize, max_dimension: u32) -> bool {
    !size.is_empty() && size.width <= max_dimension && size.height <= max_dimension
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

fn f16_to_f32(bits: u16) -> f32 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = i32::from((bits >> 10) & 0x1f);
    let fraction = f32::from(bits & 0x03ff);
    match exponent {
        0 => sign * fraction * 2f32.powi(-24),
        0x1f if fraction == 0.0 => sign * f32::INFINITY,
        0x1f => f32::NAN,
        e => sign * (1.0 + fraction / 1024.0) * 2f32.powi(e - 15),
    }
}
