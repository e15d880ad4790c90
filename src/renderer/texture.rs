// renderer/texture.rs

#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Create texture from tightly packed rgba8 data.
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Self {
        debug_assert_eq!(bytes.len(), (width * height * 4) as usize);

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }

    /// Create a solid color 1x1 texture
    pub fn from_color(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color: [u8; 4],
        label: Option<&str>,
    ) -> Self {
        Self::from_bytes(device, queue, &color, 1, 1, label)
    }

    /// Create a procedural checkerboard texture
    pub fn checkerboard(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: u32,
        checker_size: u32,
        color1: [u8; 4],
        color2: [u8; 4],
        label: Option<&str>,
    ) -> Self {
        let pixels = checkerboard_pixels(size, checker_size, color1, color2);
        Self::from_bytes(device, queue, &pixels, size, size, label)
    }

    /// Default white texture (1x1), bound to every unused sampler slot.
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_color(device, queue, [255, 255, 255, 255], Some("White"))
    }
}

fn checkerboard_pixels(size: u32, checker_size: u32, color1: [u8; 4], color2: [u8; 4]) -> Vec<u8> {
    let checker_size = checker_size.max(1);
    let mut pixels = vec![0u8; (size * size * 4) as usize];

    for y in 0..size {
        for x in 0..size {
            let checker_x = (x / checker_size) % 2;
            let checker_y = (y / checker_size) % 2;
            let is_color1 = (checker_x + checker_y) % 2 == 0;

            let color = if is_color1 { color1 } else { color2 };
            let idx = ((y * size + x) * 4) as usize;
            pixels[idx..idx + 4].copy_from_slice(&color);
        }
    }

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_alternates_colors() {
        let a = [255, 0, 0, 255];
        let b = [0, 0, 255, 255];
        let pixels = checkerboard_pixels(4, 2, a, b);

        assert_eq!(pixels.len(), 4 * 4 * 4);
        assert_eq!(&pixels[0..4], &a);
        // (2, 0) is in the second checker column
        assert_eq!(&pixels[8..12], &b);
        // (2, 2) wraps back to the first color
        let idx = (2 * 4 + 2) * 4;
        assert_eq!(&pixels[idx..idx + 4], &a);
    }

    // This test requires a GPU
    #[test]
    #[ignore]
    fn white_texture_is_one_pixel() {
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

            let white = Texture::white(&device, &queue);
            assert_eq!(white.texture.size().width, 1);
            assert_eq!(white.texture.size().height, 1);
        });
    }
}
