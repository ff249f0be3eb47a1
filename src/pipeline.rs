//! Per-asset bake orchestration and the batch runner. A batch never stops at the first bad
//! panorama: each asset either produces its artifacts or adds to the failure count, and the
//! run reports the tally at the end.

use crate::artifacts;
use crate::brdf::{self, DfgLut};
use crate::cli::BakeCli;
use crate::config::BakeConfig;
use crate::cubemap::{self, Cubemap};
use crate::radiance::RadianceImage;
use crate::sh::{self, ShCoefficients};
use crate::sun::{self, ExtractedSun};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct BakedEnvironment {
    pub cubemap: Cubemap,
    pub lut: DfgLut,
    pub sh: ShCoefficients,
    pub sun: Option<ExtractedSun>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub baked: usize,
    pub failed: usize,
}

/// Full bake of a single panorama. When sun extraction is on it runs first and the
/// flattened image feeds the cubemap and SH stages, so the sun's energy is not also baked
/// into the background. A degenerate panorama only costs the sun artifact.
pub fn bake_environment(mut image: RadianceImage, config: &BakeConfig) -> Result<BakedEnvironment> {
    config.validate()?;
    let sun = extract_sun_stage(&mut image, config);
    let cubemap = cubemap::project_cubemap(&image, config.face_size)?;
    let sh = sh::project(&image);
    let lut = brdf::generate_lookup_table(config.lut_size, config.lut_samples)?;
    Ok(BakedEnvironment { cubemap, lut, sh, sun })
}

fn extract_sun_stage(image: &mut RadianceImage, config: &BakeConfig) -> Option<ExtractedSun> {
    if !config.extract_sun {
        return None;
    }
    match sun::extract(image, config.sun_solid_angle) {
        Ok(sun) => Some(sun),
        Err(err) => {
            eprintln!("[envbake] Sun extraction skipped: {err}");
            None
        }
    }
}

/// Entry point used by the binary: resolve config, collect inputs, bake the batch.
pub fn run(cli: BakeCli) -> Result<()> {
    let input = cli.input()?.clone();
    let output = cli.output();
    let mut config = match cli.config_path() {
        Some(path) => BakeConfig::load(path)?,
        None => BakeConfig::default(),
    };
    config.apply_overrides(&cli.into_config_overrides());
    config.validate()?;

    let inputs = collect_inputs(&input)?;
    if inputs.is_empty() {
        bail!("No supported panoramas (hdr/exr/png) found under '{}'", input.display());
    }

    let report = run_batch(&inputs, &output, &config)?;
    println!("[envbake] Baked {} environment(s), {} failed.", report.baked, report.failed);
    if report.failed > 0 {
        bail!("{} of {} assets failed", report.failed, report.baked + report.failed);
    }
    Ok(())
}

/// Bakes every input into `out_dir/<asset key>/`. The DFG LUT does not depend on the
/// panorama, so it is generated and written once per batch.
pub fn run_batch(inputs: &[PathBuf], out_dir: &Path, config: &BakeConfig) -> Result<BatchReport> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let lut_started = Instant::now();
    let lut = brdf::generate_lookup_table(config.lut_size, config.lut_samples)?;
    artifacts::write_dfg_lut(out_dir.join("dfg_lut.bin"), &lut)?;
    println!(
        "[envbake] DFG LUT {}x{} ({} samples) in {:.1?}",
        config.lut_size,
        config.lut_size,
        config.lut_samples,
        lut_started.elapsed()
    );

    let mut report = BatchReport::default();
    for path in inputs {
        let Some(key) = asset_key_from_path(path) else {
            eprintln!("[envbake] Skipping '{}': cannot derive an asset key", path.display());
            report.failed += 1;
            continue;
        };
        let started = Instant::now();
        match bake_asset(path, &out_dir.join(&key), config) {
            Ok(()) => {
                report.baked += 1;
                println!("[envbake] Baked '{key}' in {:.1?}", started.elapsed());
            }
            Err(err) => {
                report.failed += 1;
                eprintln!("[envbake] Failed '{key}': {err:?}");
            }
        }
    }
    Ok(report)
}

fn bake_asset(path: &Path, asset_dir: &Path, config: &BakeConfig) -> Result<()> {
    let mut image = RadianceImage::load(path)?;
    let sun = extract_sun_stage(&mut image, config);
    let cubemap = cubemap::project_cubemap(&image, config.face_size)?;
    let sh = sh::project(&image);

    fs::create_dir_all(asset_dir)
        .with_context(|| format!("Failed to create asset directory {}", asset_dir.display()))?;
    artifacts::write_cubemap(asset_dir.join("cubemap.bin"), &cubemap)?;
    artifacts::write_sh(asset_dir.join("sh.txt"), &sh)?;
    if let Some(sun) = sun {
        artifacts::write_sun(asset_dir.join("sun.json"), &sun)?;
    }
    if config.write_hdr_previews {
        artifacts::write_cubemap_previews(asset_dir, &cubemap)?;
    }
    Ok(())
}

/// A single file is taken as-is (its extension must still be supported); a directory is
/// scanned non-recursively for supported panoramas, in sorted order so batches are
/// reproducible.
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        if !is_supported_panorama_file(input) {
            bail!("'{}' is not a supported panorama (hdr/exr/png)", input.display());
        }
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("Input '{}' does not exist", input.display());
    }
    let mut found = Vec::new();
    let entries = fs::read_dir(input)
        .with_context(|| format!("Failed to read input directory '{}'", input.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if is_supported_panorama_file(&path) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn is_supported_panorama_file(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()).map(|s| s.to_ascii_lowercase()) {
        Some(ext) => matches!(ext.as_str(), "hdr" | "exr" | "png"),
        None => false,
    }
}

fn asset_key_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    let sanitized: String = stem
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_lowercase() } else { '_' })
        .collect();
    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}
