use winit::dpi::PhysicalSize;

/// Depth attachment matching the swapchain size. Recreated on resize.
pub struct Depth {
    pub view: wgpu::TextureView,
    size: PhysicalSize<u32>,
}

impl Depth {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>) -> Self {
        let size = Self::clamp(size);
        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
        Self { view, size }
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn clamp(size: PhysicalSize<u32>) -> PhysicalSize<u32> {
        PhysicalSize::new(size.width.max(1), size.height.max(1))
    }
}
