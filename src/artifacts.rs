//! Serialization of the baked artifacts. The cubemap ships as a compact binary container
//! with an f16 payload (matching what the renderer uploads), the DFG LUT keeps full f32
//! precision, SH coefficients use a plain text format and the sun record is JSON. Optional
//! `.hdr` face previews exist for eyeballing a bake.

use crate::brdf::DfgLut;
use crate::cubemap::Cubemap;
use crate::mapping::CubemapFace;
use crate::sh::{ShCoefficients, SH_COEFF_COUNT};
use crate::sun::ExtractedSun;
use anyhow::{bail, Context, Result};
use glam::Vec3;
use half::f16;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

const CUBEMAP_MAGIC: [u8; 4] = *b"EBCM";
const LUT_MAGIC: [u8; 4] = *b"EBLT";
const CONTAINER_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CubemapContainer {
    magic: [u8; 4],
    version: u32,
    size: u32,
    faces: [Vec<u16>; 6],
}

#[derive(Serialize, Deserialize)]
struct LutContainer {
    magic: [u8; 4],
    version: u32,
    size: u32,
    data: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct SunRecord {
    direction: [f32; 3],
    radiance: [f32; 3],
    solid_angle: f32,
}

fn f32_to_f16_bits(data: &[f32]) -> Vec<u16> {
    data.iter().map(|value| f16::from_f32(*value).to_bits()).collect()
}

fn f16_bits_to_f32(data: &[u16]) -> Vec<f32> {
    data.iter().map(|bits| f16::from_bits(*bits).to_f32()).collect()
}

pub fn write_cubemap(path: impl AsRef<Path>, cubemap: &Cubemap) -> Result<()> {
    let path = path.as_ref();
    let container = CubemapContainer {
        magic: CUBEMAP_MAGIC,
        version: CONTAINER_VERSION,
        size: cubemap.size,
        faces: [
            f32_to_f16_bits(&cubemap.faces[0]),
            f32_to_f16_bits(&cubemap.faces[1]),
            f32_to_f16_bits(&cubemap.faces[2]),
            f32_to_f16_bits(&cubemap.faces[3]),
            f32_to_f16_bits(&cubemap.faces[4]),
            f32_to_f16_bits(&cubemap.faces[5]),
        ],
    };
    let bytes = bincode::serialize(&container)
        .with_context(|| format!("Failed to encode cubemap container {}", path.display()))?;
    fs::write(path, bytes).with_context(|| format!("Failed to write cubemap {}", path.display()))
}

pub fn read_cubemap(path: impl AsRef<Path>) -> Result<Cubemap> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read cubemap {}", path.display()))?;
    let container: CubemapContainer = bincode::deserialize(&bytes)
        .with_context(|| format!("Failed to decode cubemap container {}", path.display()))?;
    if container.magic != CUBEMAP_MAGIC {
        bail!("'{}' is not an envbake cubemap container", path.display());
    }
    let expected = (container.size * container.size * 4) as usize;
    let mut faces: [Vec<f32>; 6] = Default::default();
    for (i, packed) in container.faces.iter().enumerate() {
        if packed.len() != expected {
            bail!(
                "Cubemap face {i} in '{}' has {} values, expected {expected}",
                path.display(),
                packed.len()
            );
        }
        faces[i] = f16_bits_to_f32(packed);
    }
    Ok(Cubemap { size: container.size, faces })
}

pub fn write_dfg_lut(path: impl AsRef<Path>, lut: &DfgLut) -> Result<()> {
    let path = path.as_ref();
    let container = LutContainer {
        magic: LUT_MAGIC,
        version: CONTAINER_VERSION,
        size: lut.size,
        data: lut.data.clone(),
    };
    let bytes = bincode::serialize(&container)
        .with_context(|| format!("Failed to encode DFG LUT container {}", path.display()))?;
    fs::write(path, bytes).with_context(|| format!("Failed to write DFG LUT {}", path.display()))
}

pub fn read_dfg_lut(path: impl AsRef<Path>) -> Result<DfgLut> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read DFG LUT {}", path.display()))?;
    let container: LutContainer = bincode::deserialize(&bytes)
        .with_context(|| format!("Failed to decode DFG LUT container {}", path.display()))?;
    if container.magic != LUT_MAGIC {
        bail!("'{}' is not an envbake DFG LUT container", path.display());
    }
    if container.data.len() != (container.size * container.size * 2) as usize {
        bail!("DFG LUT '{}' payload length does not match its size field", path.display());
    }
    Ok(DfgLut { size: container.size, data: container.data })
}

/// Plain text SH format: a count line followed by one `r g b` line per coefficient. The
/// shortest-round-trip float formatting preserves the exact values.
pub fn write_sh(path: impl AsRef<Path>, sh: &ShCoefficients) -> Result<()> {
    let path = path.as_ref();
    let mut text = String::new();
    let _ = writeln!(text, "{}", SH_COEFF_COUNT);
    for coeff in &sh.coeffs {
        let _ = writeln!(text, "{} {} {}", coeff.x, coeff.y, coeff.z);
    }
    fs::write(path, text).with_context(|| format!("Failed to write SH coefficients {}", path.display()))
}

pub fn read_sh(path: impl AsRef<Path>) -> Result<ShCoefficients> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read SH coefficients {}", path.display()))?;
    let mut lines = text.lines();
    let count: usize = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("SH file '{}' is empty", path.display()))?
        .trim()
        .parse()
        .with_context(|| format!("Bad SH count line in {}", path.display()))?;
    if count != SH_COEFF_COUNT {
        bail!("SH file '{}' holds {count} coefficients, expected {SH_COEFF_COUNT}", path.display());
    }
    let mut sh = ShCoefficients::zero();
    for (i, coeff) in sh.coeffs.iter_mut().enumerate() {
        let line = lines
            .next()
            .ok_or_else(|| anyhow::anyhow!("SH file '{}' truncated at coefficient {i}", path.display()))?;
        let mut parts = line.split_whitespace();
        let mut channel = [0.0f32; 3];
        for value in channel.iter_mut() {
            *value = parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("SH coefficient {i} in '{}' is short", path.display()))?
                .parse()
                .with_context(|| format!("Bad float in SH coefficient {i} of {}", path.display()))?;
        }
        *coeff = Vec3::from_array(channel);
    }
    Ok(sh)
}

pub fn write_sun(path: impl AsRef<Path>, sun: &ExtractedSun) -> Result<()> {
    let path = path.as_ref();
    let record = SunRecord {
        direction: sun.direction.to_array(),
        radiance: sun.radiance.to_array(),
        solid_angle: sun.solid_angle,
    };
    let json = serde_json::to_string_pretty(&record)
        .with_context(|| format!("Failed to encode sun record {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write sun record {}", path.display()))
}

pub fn read_sun(path: impl AsRef<Path>) -> Result<ExtractedSun> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("Failed to read sun record {}", path.display()))?;
    let record: SunRecord = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse sun record {}", path.display()))?;
    Ok(ExtractedSun {
        direction: Vec3::from_array(record.direction),
        radiance: Vec3::from_array(record.radiance),
        solid_angle: record.solid_angle,
    })
}

/// Dumps each face as `face_<px|nx|...>.hdr` next to the binary container.
pub fn write_cubemap_previews(dir: impl AsRef<Path>, cubemap: &Cubemap) -> Result<()> {
    let dir = dir.as_ref();
    for face in CubemapFace::ALL {
        let texels: &[[f32; 4]] = bytemuck::cast_slice(cubemap.face(face));
        let rgb: Vec<image::Rgb<f32>> =
            texels.iter().map(|t| image::Rgb([t[0], t[1], t[2]])).collect();
        let path = dir.join(format!("face_{}.hdr", face.short_name()));
        let file = fs::File::create(&path)
            .with_context(|| format!("Failed to create preview {}", path.display()))?;
        image::codecs::hdr::HdrEncoder::new(BufWriter::new(file))
            .encode(&rgb, cubemap.size as usize, cubemap.size as usize)
            .with_context(|| format!("Failed to encode preview {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brdf;
    use glam::Vec4;
    use tempfile::tempdir;

    #[test]
    fn cubemap_container_round_trips_within_f16_precision() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("cubemap.bin");
        let mut faces: [Vec<f32>; 6] = Default::default();
        for (i, face) in faces.iter_mut().enumerate() {
            *face = (0..2 * 2 * 4).map(|j| (i * 31 + j) as f32 * 0.125).collect();
        }
        let cubemap = Cubemap { size: 2, faces };
        write_cubemap(&path, &cubemap).expect("write cubemap");
        let loaded = read_cubemap(&path).expect("read cubemap");
        assert_eq!(loaded.size, 2);
        for i in 0..6 {
            for (a, b) in cubemap.faces[i].iter().zip(&loaded.faces[i]) {
                assert!((a - b).abs() <= a.abs() * 1e-3 + 1e-3, "face {i}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn rejects_foreign_container() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("cubemap.bin");
        fs::write(&path, b"definitely not a container").expect("write junk");
        assert!(read_cubemap(&path).is_err());
    }

    #[test]
    fn dfg_lut_round_trips_exactly() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("dfg_lut.bin");
        let lut = brdf::generate_lookup_table(4, 16).expect("lut");
        write_dfg_lut(&path, &lut).expect("write lut");
        let loaded = read_dfg_lut(&path).expect("read lut");
        assert_eq!(loaded.size, lut.size);
        assert_eq!(loaded.data, lut.data);
    }

    #[test]
    fn sh_text_round_trips_exactly() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sh.txt");
        let mut sh = ShCoefficients::zero();
        for (i, coeff) in sh.coeffs.iter_mut().enumerate() {
            *coeff = Vec3::new(i as f32 * 0.1 + 0.333333, -(i as f32) * 7.25e-3, 1.0e-7);
        }
        write_sh(&path, &sh).expect("write sh");
        let loaded = read_sh(&path).expect("read sh");
        assert_eq!(loaded, sh);
    }

    #[test]
    fn sh_reader_rejects_wrong_count() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sh.txt");
        fs::write(&path, "4\n1 2 3\n1 2 3\n1 2 3\n1 2 3\n").expect("write file");
        assert!(read_sh(&path).is_err());
    }

    #[test]
    fn sun_record_round_trips() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sun.json");
        let sun = ExtractedSun {
            direction: Vec3::new(0.0, 1.0, 0.0),
            radiance: Vec3::new(120.0, 118.5, 96.25),
            solid_angle: 6.87e-5,
        };
        write_sun(&path, &sun).expect("write sun");
        let loaded = read_sun(&path).expect("read sun");
        assert_eq!(loaded, sun);
    }

    #[test]
    fn previews_written_per_face() {
        let dir = tempdir().expect("temp dir");
        let source =
            crate::radiance::RadianceImage::filled(8, 4, Vec4::new(0.5, 0.25, 0.125, 1.0)).expect("image");
        let cubemap = crate::cubemap::project_cubemap(&source, 2).expect("projection");
        write_cubemap_previews(dir.path(), &cubemap).expect("write previews");
        for face in CubemapFace::ALL {
            let path = dir.path().join(format!("face_{}.hdr", face.short_name()));
            assert!(path.exists(), "missing preview {}", path.display());
        }
    }
}
