use std::sync::mpsc;

use glint_harness::{
    EffectiveConfiguration, Origin, PixelFormat, PresentMode, Readback, Surface, SurfaceError,
};

/// Format of the offscreen color target
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Offscreen wgpu render target owned by one test case
///
/// In [`PresentMode::Manual`] encoded work is staged and only submitted by
/// [`Surface::present`], so a readback shows the last presented frame. In
/// [`PresentMode::Auto`] work is submitted as soon as it is encoded.
pub struct WgpuSurface {
    profile: String,
    backend: wgpu::Backend,
    device: wgpu::Device,
    queue: wgpu::Queue,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    present_mode: PresentMode,
    pending: Vec<wgpu::CommandBuffer>,
}

impl WgpuSurface {
    /// Create a device and an offscreen target sized for `config`
    pub async fn new(
        title: &str,
        backends: wgpu::Backends,
        options: &wgpu::RequestAdapterOptions<'_, '_>,
        config: &EffectiveConfiguration,
    ) -> Result<Self, SurfaceError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(options)
            .await
            .ok_or_else(|| SurfaceError::AdapterNotFound(config.surface_profile.clone()))?;
        let info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some(title),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await
            .map_err(|e| SurfaceError::Device(e.to_string()))?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Glint Color Target"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        tracing::debug!(
            "Created surface '{}' {}x{} on {} ({:?})",
            title,
            config.width,
            config.height,
            info.name,
            info.backend
        );

        Ok(Self {
            profile: config.surface_profile.clone(),
            backend: info.backend,
            device,
            queue,
            texture,
            view,
            width: config.width,
            height: config.height,
            present_mode: config.present_mode,
            pending: Vec::new(),
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        TARGET_FORMAT
    }

    /// Backend the adapter was picked from
    pub fn backend(&self) -> wgpu::Backend {
        self.backend
    }

    /// Record commands against the color target
    pub fn encode<F>(&mut self, label: &str, record: F)
    where
        F: FnOnce(&mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        record(&mut encoder, &self.view);
        let commands = encoder.finish();

        match self.present_mode {
            PresentMode::Auto => {
                self.queue.submit(std::iter::once(commands));
            }
            PresentMode::Manual => self.pending.push(commands),
        }
    }

    /// Clear the color target
    pub fn clear(&mut self, color: wgpu::Color) {
        self.encode("Glint Clear", |encoder, view| {
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Glint Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        });
    }

    /// Padded bytes per row (must be multiple of 256 for wgpu)
    fn padded_bytes_per_row(width: u32) -> u32 {
        let unpadded = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        ((unpadded + align - 1) / align) * align
    }
}

impl Surface for WgpuSurface {
    fn profile(&self) -> &str {
        &self.profile
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        if !self.pending.is_empty() {
            self.queue.submit(self.pending.drain(..));
        }
        Ok(())
    }

    fn read_color_buffer(&mut self) -> Result<Readback, SurfaceError> {
        let bytes_per_row = Self::padded_bytes_per_row(self.width);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Glint Readback Buffer"),
            size: u64::from(bytes_per_row) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Glint Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| SurfaceError::Readback(e.to_string()))?
            .map_err(|e| SurfaceError::Readback(e.to_string()))?;

        let data = slice.get_mapped_range().to_vec();
        buffer.unmap();

        Ok(Readback {
            width: self.width,
            height: self.height,
            bytes_per_row: bytes_per_row as usize,
            origin: Origin::TopLeft,
            format: PixelFormat::Rgba8,
            data,
        })
    }
}
