//! Conversions between world-space directions, equirectangular UV coordinates and cubemap
//! face texels. The world frame matches the renderer: forward is -Z, up is +Y, right is +X.

use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubemapFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubemapFace {
    pub const ALL: [CubemapFace; 6] = [
        CubemapFace::PosX,
        CubemapFace::NegX,
        CubemapFace::PosY,
        CubemapFace::NegY,
        CubemapFace::PosZ,
        CubemapFace::NegZ,
    ];

    pub fn index(self) -> usize {
        match self {
            CubemapFace::PosX => 0,
            CubemapFace::NegX => 1,
            CubemapFace::PosY => 2,
            CubemapFace::NegY => 3,
            CubemapFace::PosZ => 4,
            CubemapFace::NegZ => 5,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            CubemapFace::PosX => "px",
            CubemapFace::NegX => "nx",
            CubemapFace::PosY => "py",
            CubemapFace::NegY => "ny",
            CubemapFace::PosZ => "pz",
            CubemapFace::NegZ => "nz",
        }
    }
}

/// Maps a unit direction to equirectangular UV. Both components land in [0, 1]; u wraps at
/// the azimuth seam, v does not (asin keeps it in range).
pub fn direction_to_equirect_uv(dir: Vec3) -> Vec2 {
    let u = (dir.x.atan2(-dir.z) + PI) / TAU;
    let v = ((-dir.y).clamp(-1.0, 1.0).asin() + FRAC_PI_2) / PI;
    Vec2::new(u, v)
}

/// Inverse of [`direction_to_equirect_uv`]. At the poles (v = 0 or 1) the azimuth is
/// degenerate and the returned direction collapses onto the +-Y axis regardless of u.
pub fn equirect_uv_to_direction(u: f32, v: f32) -> Vec3 {
    let theta = v * PI;
    let phi = u * TAU;
    Vec3::new(-theta.sin() * phi.sin(), theta.cos(), theta.sin() * phi.cos())
}

/// Direction through the center of texel (x, y) on a `face_size` x `face_size` cubemap face.
/// The per-face basis fixes the cubemap orientation; changing any sign here flips faces in
/// the rendered background.
pub fn face_point_to_direction(face: CubemapFace, face_size: u32, x: u32, y: u32) -> Vec3 {
    let u = 2.0 * (x as f32 + 0.5) / face_size as f32 - 1.0;
    let v = 2.0 * (y as f32 + 0.5) / face_size as f32 - 1.0;
    match face {
        CubemapFace::PosX => Vec3::new(1.0, -v, -u),
        CubemapFace::NegX => Vec3::new(-1.0, -v, u),
        CubemapFace::PosY => Vec3::new(u, 1.0, v),
        CubemapFace::NegY => Vec3::new(u, -1.0, -v),
        CubemapFace::PosZ => Vec3::new(u, -v, 1.0),
        CubemapFace::NegZ => Vec3::new(-u, -v, -1.0),
    }
    .normalize()
}
