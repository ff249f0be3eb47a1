//! Locates the dominant point light in a panorama, integrates its energy over a small
//! elliptical footprint and flattens that footprint back to the local background level.
//! Downstream cubemap/SH stages then see only ambient radiance where the sun was, so its
//! energy is represented once, as an analytic directional light.

use crate::mapping;
use crate::radiance::RadianceImage;
use crate::region::CircleRangeEllipse;
use anyhow::{bail, Result};
use glam::Vec3;
use rayon::prelude::*;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractedSun {
    /// The peak texel's look-toward direction *negated*: the direction the sunlight
    /// travels, matching what a directional light consumes. Consumers wanting the
    /// "toward the sun" vector must negate it themselves; do not flip the sign here
    /// without checking the renderer.
    pub direction: Vec3,
    /// Average radiance over the footprint with the local background floor subtracted.
    pub radiance: Vec3,
    /// The requested solid angle, passed through unchanged.
    pub solid_angle: f32,
}

/// Extracts the sun and destructively flattens its footprint in `image`. On error the image
/// is left untouched. An all-black panorama is a reported, non-fatal condition: callers skip
/// sun extraction and keep the remaining artifacts.
pub fn extract(image: &mut RadianceImage, sun_solid_angle: f32) -> Result<ExtractedSun> {
    if !(sun_solid_angle > 0.0 && sun_solid_angle < TAU) {
        bail!("Sun solid angle must lie in (0, 2*pi), got {sun_solid_angle}");
    }

    let (peak_x, peak_y, peak_radiance) = find_peak(image);
    if peak_radiance <= 0.0 {
        bail!("Panorama is entirely black; no sun to extract");
    }

    let (rx, ry) = elliptical_footprint(image.width(), image.height(), peak_y, sun_solid_angle);
    let footprint = CircleRangeEllipse::new(peak_x as i32, peak_y as i32, rx, ry);

    // The floor must come from a complete footprint scan before any texel is rewritten.
    let floor = footprint_floor(image, &footprint);
    let (excess, count) = flatten_footprint(image, &footprint, floor);
    let radiance = if count > 0 { excess / count as f32 } else { Vec3::ZERO };

    let u = (peak_x as f32 + 0.5) / image.width() as f32;
    let v = (peak_y as f32 + 0.5) / image.height() as f32;
    let direction = -mapping::equirect_uv_to_direction(u, v);

    Ok(ExtractedSun { direction, radiance, solid_angle: sun_solid_angle })
}

fn texel_radiance(color: Vec3) -> f32 {
    color.x + color.y + color.z
}

/// Row-parallel scan for the brightest texel. Ties resolve to the smallest (y, x) so the
/// result does not depend on the reduction order.
fn find_peak(image: &RadianceImage) -> (u32, u32, f32) {
    (0..image.height())
        .into_par_iter()
        .map(|y| {
            let mut best = (0u32, y, -1.0f32);
            for x in 0..image.width() {
                let radiance = texel_radiance(image.pixel(x, y).truncate());
                if radiance > best.2 {
                    best = (x, y, radiance);
                }
            }
            best
        })
        .reduce(
            || (0, 0, -1.0),
            |a, b| {
                if b.2 > a.2 || (b.2 == a.2 && (b.1, b.0) < (a.1, a.0)) {
                    b
                } else {
                    a
                }
            },
        )
}

/// Pixel-space ellipse radii for a cap of the given solid angle centered on `peak_y`'s row.
/// The cosine of the peak latitude accounts for the equirectangular stretch away from the
/// equator.
fn elliptical_footprint(width: u32, height: u32, peak_y: u32, solid_angle: f32) -> (i32, i32) {
    let angular_radius = (1.0 - solid_angle / TAU).clamp(-1.0, 1.0).acos();
    let v = (peak_y as f32 + 0.5) / height as f32;
    let latitude = v * PI - FRAC_PI_2;
    let rx = (width as f32 * angular_radius / TAU).round() as i32;
    let ry = (height as f32 * (angular_radius / PI) * latitude.cos()).round() as i32;
    (rx, ry)
}

/// First footprint pass: the minimum-radiance texel inside the ellipse is taken as the
/// local background level.
fn footprint_floor(image: &RadianceImage, footprint: &CircleRangeEllipse) -> Vec3 {
    let mut floor = Vec3::ZERO;
    let mut lowest = f32::INFINITY;
    for (x, y) in footprint.iter() {
        let Some((px, py)) = resolve_texel(image, x, y) else {
            continue;
        };
        let color = image.pixel(px, py).truncate();
        let radiance = texel_radiance(color);
        if radiance < lowest {
            lowest = radiance;
            floor = color;
        }
    }
    floor
}

/// Second footprint pass: accumulates the radiance in excess of the floor and overwrites
/// every visited texel with the floor color.
fn flatten_footprint(
    image: &mut RadianceImage,
    footprint: &CircleRangeEllipse,
    floor: Vec3,
) -> (Vec3, u32) {
    let mut excess = Vec3::ZERO;
    let mut count = 0u32;
    for (x, y) in footprint.iter() {
        let Some((px, py)) = resolve_texel(image, x, y) else {
            continue;
        };
        let color = image.pixel(px, py).truncate();
        excess += color - floor;
        count += 1;
        image.set_rgb(px, py, floor);
    }
    (excess, count)
}

/// Azimuth wraps modulo width; rows beyond the poles are discarded.
fn resolve_texel(image: &RadianceImage, x: i32, y: i32) -> Option<(u32, u32)> {
    if y < 0 || y >= image.height() as i32 {
        return None;
    }
    let x = x.rem_euclid(image.width() as i32);
    Some((x as u32, y as u32))
}
