//! Environment lighting from the equirectangular HDR panorama.
//!
//! The panorama is uploaded as an RGBA16F texture with a CPU-built
//! box-filter mip chain, so the shader can sample blurrier radiance at
//! higher roughness. A full cubemap prefilter pass is more than this
//! single fixed scene needs.

use crate::loaders::HdrImage;

/// Roughness levels available to the shader.
pub const ENVIRONMENT_MIP_LEVELS: u32 = 5;

pub struct EnvironmentMap {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    texture: wgpu::Texture,
}

impl EnvironmentMap {
    /// Build the radiance texture and its mip chain from the decoded
    /// panorama.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, image: &HdrImage) -> Self {
        let mip_level_count = mip_levels_for(image.width, image.height);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Environment Map"),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let mut width = image.width;
        let mut height = image.height;
        let mut data = image.data.clone();
        for mip in 0..mip_level_count {
            if mip > 0 {
                (width, height, data) = downsample(width, height, &data);
            }
            let texels = rgb_f32_to_rgba16f(&data);
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &texels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(8 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            view,
            sampler,
            texture,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

fn mip_levels_for(width: u32, height: u32) -> u32 {
    let max_levels = 32 - width.min(height).max(1).leading_zeros();
    ENVIRONMENT_MIP_LEVELS.min(max_levels.max(1))
}

/// 2x2 box filter; odd trailing rows/columns clamp to the edge.
fn downsample(width: u32, height: u32, data: &[f32]) -> (u32, u32, Vec<f32>) {
    let out_w = (width / 2).max(1);
    let out_h = (height / 2).max(1);
    let mut out = Vec::with_capacity((out_w * out_h * 3) as usize);

    let sample = |x: u32, y: u32| {
        let x = x.min(width - 1);
        let y = y.min(height - 1);
        let i = ((y * width + x) * 3) as usize;
        [data[i], data[i + 1], data[i + 2]]
    };

    for y in 0..out_h {
        for x in 0..out_w {
            let mut sum = [0.0f32; 3];
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let p = sample(x * 2 + dx, y * 2 + dy);
                sum[0] += p[0];
                sum[1] += p[1];
                sum[2] += p[2];
            }
            out.push(sum[0] * 0.25);
            out.push(sum[1] * 0.25);
            out.push(sum[2] * 0.25);
        }
    }

    (out_w, out_h, out)
}

/// Pack linear RGB floats as RGBA16F texels with opaque alpha.
fn rgb_f32_to_rgba16f(data: &[f32]) -> Vec<u8> {
    const ONE: u16 = 0x3c00;
    let mut out = Vec::with_capacity(data.len() / 3 * 8);
    for rgb in data.chunks(3) {
        for &channel in rgb {
            out.extend_from_slice(&f32_to_f16_bits(channel).to_le_bytes());
        }
        out.extend_from_slice(&ONE.to_le_bytes());
    }
    out
}

/// IEEE binary32 -> binary16 with truncation; overflow saturates to
/// infinity, tiny values flush through the subnormal range to zero.
fn f32_to_f16_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x007f_ffff;

    if exp == 0xff {
        let nan = if mantissa != 0 { 0x0200 } else { 0 };
        return sign | 0x7c00 | nan;
    }

    let unbiased = exp - 127;
    if unbiased > 15 {
        return sign | 0x7c00;
    }
    if unbiased >= -14 {
        return sign | (((unbiased + 15) as u16) << 10) | (mantissa >> 13) as u16;
    }
    if unbiased >= -24 {
        let shift = 13 + (-14 - unbiased);
        return sign | ((mantissa | 0x0080_0000) >> shift) as u16;
    }
    sign
}
