//! Three-band spherical harmonic projection of an equirectangular radiance map. The nine
//! coefficients come out solid-angle weighted, convolved with the Lambertian cosine lobe and
//! divided by pi, so a consumer evaluates reflected radiance directly as
//! `sum(coeff[i] * basis(normal)[i])`.

use crate::mapping;
use crate::radiance::RadianceImage;
use glam::Vec3;
use rayon::prelude::*;
use std::f32::consts::{PI, TAU};

pub const SH_COEFF_COUNT: usize = 9;

/// Analytic cosine-lobe convolution weights per band (band 0, band 1 x3, band 2 x5),
/// applied before the final 1/pi irradiance-to-radiance conversion.
const BAND_SCALE: [f32; SH_COEFF_COUNT] = [
    PI,
    2.0 * PI / 3.0,
    2.0 * PI / 3.0,
    2.0 * PI / 3.0,
    PI / 4.0,
    PI / 4.0,
    PI / 4.0,
    PI / 4.0,
    PI / 4.0,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShCoefficients {
    pub coeffs: [Vec3; SH_COEFF_COUNT],
}

impl ShCoefficients {
    pub fn zero() -> Self {
        Self { coeffs: [Vec3::ZERO; SH_COEFF_COUNT] }
    }

    /// Reflected radiance for a surface normal. No further normalization is needed; the
    /// projection already folded in solid angle, the cosine lobe and 1/pi.
    pub fn evaluate(&self, normal: Vec3) -> Vec3 {
        let basis = sh_basis(normal);
        let mut total = Vec3::ZERO;
        for i in 0..SH_COEFF_COUNT {
            total += self.coeffs[i] * basis[i];
        }
        total
    }
}

/// The nine real normalized SH basis functions, band-major: 1 constant, 3 linear,
/// 5 quadratic.
pub fn sh_basis(dir: Vec3) -> [f32; SH_COEFF_COUNT] {
    let (x, y, z) = (dir.x, dir.y, dir.z);
    [
        0.282_095,
        0.488_603 * y,
        0.488_603 * z,
        0.488_603 * x,
        1.092_548 * x * y,
        1.092_548 * y * z,
        0.315_392 * (3.0 * z * z - 1.0),
        1.092_548 * x * z,
        0.546_274 * (x * x - y * y),
    ]
}

/// Projects the panorama onto the SH basis. Rows accumulate into private partial sums and
/// reduce at the end; the differential solid angle `(pi/h) * (2pi/w) * sin(theta)` keeps the
/// oversampled polar rows from dominating.
pub fn project(image: &RadianceImage) -> ShCoefficients {
    let width = image.width();
    let height = image.height();
    let texel_area = (PI / height as f32) * (TAU / width as f32);

    let summed = (0..height)
        .into_par_iter()
        .map(|y| {
            let v = (y as f32 + 0.5) / height as f32;
            let theta = v * PI;
            let weight = texel_area * theta.sin();
            let mut acc = [Vec3::ZERO; SH_COEFF_COUNT];
            for x in 0..width {
                let u = (x as f32 + 0.5) / width as f32;
                let dir = mapping::equirect_uv_to_direction(u, v);
                let color = image.pixel(x, y).truncate();
                let basis = sh_basis(dir);
                for i in 0..SH_COEFF_COUNT {
                    acc[i] += color * (basis[i] * weight);
                }
            }
            acc
        })
        .reduce(
            || [Vec3::ZERO; SH_COEFF_COUNT],
            |mut a, b| {
                for i in 0..SH_COEFF_COUNT {
                    a[i] += b[i];
                }
                a
            },
        );

    let mut coeffs = summed;
    for i in 0..SH_COEFF_COUNT {
        coeffs[i] *= BAND_SCALE[i] / PI;
    }
    ShCoefficients { coeffs }
}
