//! Split-sum specular BRDF integration: a Hammersley-sequence Monte Carlo integrator over a
//! GGX microfacet lobe, producing the (scale, bias) DFG lookup table. Everything here is
//! deterministic; the low-discrepancy sequence has no random state.

use anyhow::{bail, Result};
use glam::{Vec2, Vec3};
use rayon::prelude::*;
use std::f32::consts::TAU;

/// NdotV values below this are clamped before integration to keep the visibility term away
/// from the NdotV = 0 singularity.
const MIN_N_DOT_V: f32 = 0.001;

/// `size` x `size` grid of (scale, bias) pairs, two floats per texel, row-major. The x axis
/// is NdotV with a quadratic remapping (resolution concentrated at grazing angles), the y
/// axis is roughness.
#[derive(Debug, Clone)]
pub struct DfgLut {
    pub size: u32,
    pub data: Vec<f32>,
}

impl DfgLut {
    pub fn entry(&self, x: u32, y: u32) -> (f32, f32) {
        let idx = ((y * self.size + x) * 2) as usize;
        (self.data[idx], self.data[idx + 1])
    }
}

/// Base-2 radical inverse (van der Corput) by bit reversal.
pub fn radical_inverse_vdc(bits: u32) -> f32 {
    let mut b = bits;
    b = (b << 16) | (b >> 16);
    b = ((b & 0x5555_5555) << 1) | ((b & 0xAAAA_AAAA) >> 1);
    b = ((b & 0x3333_3333) << 2) | ((b & 0xCCCC_CCCC) >> 2);
    b = ((b & 0x0F0F_0F0F) << 4) | ((b & 0xF0F0_F0F0) >> 4);
    b = ((b & 0x00FF_00FF) << 8) | ((b & 0xFF00_FF00) >> 8);
    (b as f32) * 2.328_306_4e-10
}

pub fn hammersley(i: u32, n: u32) -> Vec2 {
    Vec2::new(i as f32 / n as f32, radical_inverse_vdc(i))
}

/// GGX-distributed half vector in tangent space (normal is +Z).
pub fn importance_sample_ggx(xi: Vec2, roughness: f32) -> Vec3 {
    let a = roughness * roughness;
    let phi = TAU * xi.x;
    let cos_theta = ((1.0 - xi.y) / (1.0 + (a * a - 1.0) * xi.y)).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

fn geometry_schlick_ggx(n_dot_x: f32, roughness: f32) -> f32 {
    let k = roughness * roughness / 8.0;
    n_dot_x / (n_dot_x * (1.0 - k) + k)
}

/// Monte Carlo integration of the split-sum BRDF terms for one (NdotV, roughness) pair.
/// Returns the Fresnel (scale, bias) accumulators divided by the sample count.
pub fn integrate_brdf(n_dot_v: f32, roughness: f32, num_samples: u32) -> (f32, f32) {
    let view = Vec3::new((1.0 - n_dot_v * n_dot_v).max(0.0).sqrt(), 0.0, n_dot_v);
    let mut scale = 0.0f32;
    let mut bias = 0.0f32;
    for i in 0..num_samples {
        let xi = hammersley(i, num_samples);
        let half = importance_sample_ggx(xi, roughness);
        let v_dot_h = view.dot(half);
        let n_dot_h = half.z;
        // Reflect V about H; with N = +Z only the z component of L matters.
        let n_dot_l = 2.0 * v_dot_h * n_dot_h - view.z;
        if n_dot_l <= 0.0 {
            continue;
        }
        let g = geometry_schlick_ggx(n_dot_v, roughness) * geometry_schlick_ggx(n_dot_l, roughness);
        let g_vis = g * v_dot_h / (n_dot_h * n_dot_v);
        let fc = (1.0 - v_dot_h).powi(5);
        scale += (1.0 - fc) * g_vis;
        bias += fc * g_vis;
    }
    (scale / num_samples as f32, bias / num_samples as f32)
}

pub fn generate_lookup_table(size: u32, num_samples: u32) -> Result<DfgLut> {
    if size < 2 {
        bail!("DFG lookup table size must be at least 2, got {size}");
    }
    if num_samples == 0 {
        bail!("DFG lookup table needs at least one sample");
    }
    let denom = (size - 1) as f32;
    let mut data = vec![0.0f32; (size * size * 2) as usize];
    data.par_chunks_mut((size * 2) as usize).enumerate().for_each(|(y, row)| {
        let roughness = y as f32 / denom;
        for x in 0..size as usize {
            let t = x as f32 / denom;
            let n_dot_v = (t * t).max(MIN_N_DOT_V);
            let (scale, bias) = integrate_brdf(n_dot_v, roughness, num_samples);
            row[x * 2] = scale;
            row[x * 2 + 1] = bias;
        }
    });
    Ok(DfgLut { size, data })
}
