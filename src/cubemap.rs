//! Projects an equirectangular panorama onto the 6 faces of a cubemap. Faces are
//! independent buffers, so the projection runs face-parallel.

use crate::mapping::{self, CubemapFace};
use crate::radiance::RadianceImage;
use anyhow::{bail, Result};
use rayon::prelude::*;

/// Six square RGBA f32 face buffers, indexed per [`CubemapFace::index`].
#[derive(Debug, Clone)]
pub struct Cubemap {
    pub size: u32,
    pub faces: [Vec<f32>; 6],
}

impl Cubemap {
    pub fn face(&self, face: CubemapFace) -> &[f32] {
        &self.faces[face.index()]
    }
}

/// Fills one face: texel -> world direction -> equirectangular UV -> bilinear source sample.
pub fn project_face(source: &RadianceImage, face_size: u32, face: CubemapFace) -> Vec<f32> {
    let mut data = vec![0.0f32; (face_size * face_size * 4) as usize];
    for y in 0..face_size {
        for x in 0..face_size {
            let dir = mapping::face_point_to_direction(face, face_size, x, y);
            let uv = mapping::direction_to_equirect_uv(dir);
            let texel = source.sample(uv.x, uv.y);
            let idx = ((y * face_size + x) * 4) as usize;
            data[idx..idx + 4].copy_from_slice(&texel.to_array());
        }
    }
    data
}

pub fn project_cubemap(source: &RadianceImage, face_size: u32) -> Result<Cubemap> {
    if face_size == 0 {
        bail!("Cubemap face size must be positive");
    }
    let mut faces: [Vec<f32>; 6] = Default::default();
    faces.as_mut_slice().par_iter_mut().enumerate().for_each(|(i, buffer)| {
        *buffer = project_face(source, face_size, CubemapFace::ALL[i]);
    });
    Ok(Cubemap { size: face_size, faces })
}
