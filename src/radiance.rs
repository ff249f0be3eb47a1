//! Owned linear-light RGBA float panorama buffer plus the bilinear sampler used by the
//! projection stages. Row 0 is the top of the panorama (v = 0).

use anyhow::{bail, Context, Result};
use glam::{Vec3, Vec4};
use image::{ColorType, DynamicImage, ImageReader};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct RadianceImage {
    width: u32,
    height: u32,
    pixels: Vec<Vec4>,
}

impl RadianceImage {
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec4>) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Radiance image must be non-empty, got {width}x{height}");
        }
        if pixels.len() != (width * height) as usize {
            bail!(
                "Pixel buffer length {} does not match {width}x{height}",
                pixels.len()
            );
        }
        Ok(Self { width, height, pixels })
    }

    pub fn filled(width: u32, height: u32, value: Vec4) -> Result<Self> {
        Self::from_pixels(width, height, vec![value; (width * height) as usize])
    }

    /// Decodes an hdr/exr/png panorama into linear light. 8-bit sources are assumed sRGB
    /// encoded and are linearized; float formats pass through untouched.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = ImageReader::open(path)
            .with_context(|| format!("Failed to open panorama '{}'", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("Failed to probe panorama format '{}'", path.display()))?;
        let decoded = reader
            .decode()
            .with_context(|| format!("Failed to decode panorama '{}'", path.display()))?;
        Self::from_decoded(decoded)
    }

    fn from_decoded(decoded: DynamicImage) -> Result<Self> {
        let srgb_encoded = matches!(
            decoded.color(),
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
        );
        let rgba = decoded.to_rgba32f();
        let (width, height) = (rgba.width(), rgba.height());
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            let texel = if srgb_encoded {
                Vec4::new(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a)
            } else {
                Vec4::new(r, g, b, a)
            };
            pixels.push(texel);
        }
        Self::from_pixels(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, value: Vec4) {
        self.pixels[(y * self.width + x) as usize] = value;
    }

    /// Overwrites the color channels of a texel, leaving alpha as-is.
    pub fn set_rgb(&mut self, x: u32, y: u32, rgb: Vec3) {
        let idx = (y * self.width + x) as usize;
        let alpha = self.pixels[idx].w;
        self.pixels[idx] = rgb.extend(alpha);
    }

    /// Bilinear sample at (u, v) in [0, 1]^2. The horizontal neighbor wraps modulo width
    /// (the panorama is periodic in azimuth); the vertical neighbor clamps to the last row
    /// (the poles are not periodic).
    pub fn sample(&self, u: f32, v: f32) -> Vec4 {
        let x = u * (self.width as f32 - 1.0);
        let y = v * (self.height as f32 - 1.0);
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = x - x0;
        let ty = y - y0;

        let ix0 = x0.rem_euclid(self.width as f32) as u32;
        let ix1 = (x0 + 1.0).rem_euclid(self.width as f32) as u32;
        let iy0 = y0.clamp(0.0, (self.height - 1) as f32) as u32;
        let iy1 = (y0 + 1.0).clamp(0.0, (self.height - 1) as f32) as u32;

        let c00 = self.pixel(ix0, iy0);
        let c10 = self.pixel(ix1, iy0);
        let c01 = self.pixel(ix0, iy1);
        let c11 = self.pixel(ix1, iy1);

        let top = c00 * (1.0 - tx) + c10 * tx;
        let bottom = c01 * (1.0 - tx) + c11 * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
