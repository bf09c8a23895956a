//! Radiance RGBE (.hdr) decoding for the environment panorama.
//!
//! Handles both flat and RLE-compressed scanlines and converts the
//! shared-exponent pixels to linear RGB floats.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Decoded HDR image, linear RGB, three floats per pixel, row-major.
#[derive(Debug, Clone)]
pub struct HdrImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl HdrImage {
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let i = ((y * self.width + x) * 3) as usize;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

pub fn load_hdr(path: impl AsRef<Path>) -> Result<HdrImage> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open HDR file {:?}", path))?;
    decode_hdr(BufReader::new(file))
}

pub fn decode_hdr<R: BufRead>(mut reader: R) -> Result<HdrImage> {
    let (width, height) = read_header(&mut reader)?;

    let mut data = Vec::with_capacity((width * height * 3) as usize);
    let mut scanline = vec![[0u8; 4]; width as usize];
    for _ in 0..height {
        decode_scanline(&mut reader, &mut scanline)?;
        for rgbe in &scanline {
            let [r, g, b] = rgbe_to_linear(*rgbe);
            data.push(r);
            data.push(g);
            data.push(b);
        }
    }

    Ok(HdrImage {
        width,
        height,
        data,
    })
}

fn read_header<R: BufRead>(reader: &mut R) -> Result<(u32, u32)> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if !line.starts_with("#?RADIANCE") && !line.starts_with("#?RGBE") {
        bail!("not a Radiance HDR file");
    }

    // Variable-length header, terminated by a blank line. FORMAT is
    // assumed to be 32-bit_rle_rgbe.
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            bail!("unexpected end of HDR header");
        }
        if line.trim().is_empty() {
            break;
        }
    }

    line.clear();
    reader.read_line(&mut line)?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        ["-Y", h, "+X", w] => Ok((w.parse()?, h.parse()?)),
        ["+X", w, "+Y", h] => Ok((w.parse()?, h.parse()?)),
        _ => bail!("unsupported HDR resolution line: {}", line.trim()),
    }
}

/// Decode one scanline into `out`, detecting adaptive RLE from the
/// leading marker bytes.
fn decode_scanline<R: Read>(reader: &mut R, out: &mut [[u8; 4]]) -> Result<()> {
    let width = out.len();
    let mut lead = [0u8; 4];
    reader.read_exact(&mut lead)?;

    let rle = lead[0] == 2
        && lead[1] == 2
        && (lead[2] as usize) * 256 + lead[3] as usize == width;
    if !rle {
        // Flat data; the four bytes just read are the first pixel.
        out[0] = lead;
        for pixel in out[1..].iter_mut() {
            reader.read_exact(pixel)?;
        }
        return Ok(());
    }

    // New-style RLE stores the four channels separately.
    for channel in 0..4 {
        let mut x = 0;
        while x < width {
            let count = read_u8(reader)? as usize;
            if count > 128 {
                let run = count - 128;
                if x + run > width {
                    bail!("HDR RLE run overflows scanline");
                }
                let value = read_u8(reader)?;
                for pixel in out[x..x + run].iter_mut() {
                    pixel[channel] = value;
                }
                x += run;
            } else {
                if x + count > width {
                    bail!("HDR literal run overflows scanline");
                }
                for pixel in out[x..x + count].iter_mut() {
                    pixel[channel] = read_u8(reader)?;
                }
                x += count;
            }
        }
    }

    Ok(())
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Shared-exponent decode: value = mantissa * 2^(e - 136).
#[inline]
fn rgbe_to_linear([r, g, b, e]: [u8; 4]) -> [f32; 3] {
    if e == 0 {
        return [0.0, 0.0, 0.0];
    }
    let scale = (2.0f32).powi(e as i32 - 128 - 8);
    [r as f32 * scale, g as f32 * scale, b as f32 * scale]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(width: u32, height: u32) -> Vec<u8> {
        format!("#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y {} +X {}\n", height, width).into_bytes()
    }

    #[test]
    fn exponent_zero_is_black() {
        assert_eq!(rgbe_to_linear([255, 255, 255, 0]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn midgray_decodes_near_half() {
        let [r, g, b] = rgbe_to_linear([128, 128, 128, 128]);
        assert!((r - 0.5).abs() < 0.01 && (g - 0.5).abs() < 0.01 && (b - 0.5).abs() < 0.01);
    }

    #[test]
    fn large_exponent_exceeds_ldr_range() {
        let [r, _, _] = rgbe_to_linear([200, 100, 50, 140]);
        assert!(r > 1.0);
    }

    #[test]
    fn decodes_flat_scanlines() {
        let mut bytes = header(2, 2);
        // Four pixels, no RLE marker.
        bytes.extend_from_slice(&[128, 0, 0, 128, 0, 128, 0, 128, 0, 0, 128, 128, 128, 128, 128, 128]);

        let image = decode_hdr(Cursor::new(bytes)).unwrap();
        assert_eq!((image.width, image.height), (2, 2));
        assert!((image.pixel(0, 0)[0] - 0.5).abs() < 0.01);
        assert!((image.pixel(1, 0)[1] - 0.5).abs() < 0.01);
        assert!((image.pixel(0, 1)[2] - 0.5).abs() < 0.01);
    }

    #[test]
    fn decodes_rle_scanlines() {
        let width = 8u32;
        let mut bytes = header(width, 1);
        // RLE marker, then per channel: R run of 8x128, G run of 8x0,
        // B literal 8 zeros, E run of 8x128.
        bytes.extend_from_slice(&[2, 2, 0, 8]);
        bytes.extend_from_slice(&[128 + 8, 128]);
        bytes.extend_from_slice(&[128 + 8, 0]);
        bytes.extend_from_slice(&[8, 0, 0, 0, 0, 0, 0, 0, 0]);
        bytes.extend_from_slice(&[128 + 8, 128]);

        let image = decode_hdr(Cursor::new(bytes)).unwrap();
        assert_eq!(image.width, 8);
        for x in 0..width {
            let [r, g, b] = image.pixel(x, 0);
            assert!((r - 0.5).abs() < 0.01);
            assert_eq!(g, 0.0);
            assert_eq!(b, 0.0);
        }
    }

    #[test]
    fn rejects_overflowing_rle_runs() {
        let mut bytes = header(4, 1);
        bytes.extend_from_slice(&[2, 2, 0, 4]);
        bytes.extend_from_slice(&[128 + 9, 1]); // run longer than the scanline
        assert!(decode_hdr(Cursor::new(bytes)).is_err());
    }

    #[test]
    fn rejects_non_hdr_input() {
        assert!(decode_hdr(Cursor::new(b"PNG....".to_vec())).is_err());
    }
}
