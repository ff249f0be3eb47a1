use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::f32::consts::TAU;
use std::fs;
use std::path::Path;

/// Solid angle of the real sun seen from earth, in steradians.
const SUN_SOLID_ANGLE: f32 = 6.87e-5;

#[derive(Debug, Clone, Deserialize)]
pub struct BakeConfig {
    #[serde(default = "BakeConfig::default_face_size")]
    pub face_size: u32,
    #[serde(default = "BakeConfig::default_lut_size")]
    pub lut_size: u32,
    #[serde(default = "BakeConfig::default_lut_samples")]
    pub lut_samples: u32,
    #[serde(default)]
    pub extract_sun: bool,
    #[serde(default = "BakeConfig::default_sun_solid_angle")]
    pub sun_solid_angle: f32,
    #[serde(default)]
    pub write_hdr_previews: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BakeConfigOverrides {
    pub face_size: Option<u32>,
    pub lut_size: Option<u32>,
    pub lut_samples: Option<u32>,
    pub extract_sun: Option<bool>,
    pub sun_solid_angle: Option<f32>,
    pub write_hdr_previews: Option<bool>,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            face_size: Self::default_face_size(),
            lut_size: Self::default_lut_size(),
            lut_samples: Self::default_lut_samples(),
            extract_sun: false,
            sun_solid_angle: Self::default_sun_solid_angle(),
            write_hdr_previews: false,
        }
    }
}

impl BakeConfig {
    const fn default_face_size() -> u32 {
        128
    }

    const fn default_lut_size() -> u32 {
        256
    }

    const fn default_lut_samples() -> u32 {
        1024
    }

    const fn default_sun_solid_angle() -> f32 {
        SUN_SOLID_ANGLE
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("[envbake] Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &BakeConfigOverrides) {
        if let Some(face_size) = overrides.face_size {
            self.face_size = face_size;
        }
        if let Some(lut_size) = overrides.lut_size {
            self.lut_size = lut_size;
        }
        if let Some(lut_samples) = overrides.lut_samples {
            self.lut_samples = lut_samples;
        }
        if let Some(extract_sun) = overrides.extract_sun {
            self.extract_sun = extract_sun;
        }
        if let Some(sun_solid_angle) = overrides.sun_solid_angle {
            self.sun_solid_angle = sun_solid_angle;
        }
        if let Some(write_hdr_previews) = overrides.write_hdr_previews {
            self.write_hdr_previews = write_hdr_previews;
        }
    }

    /// Rejects out-of-range parameters before any computation starts. Nothing is silently
    /// clamped.
    pub fn validate(&self) -> Result<()> {
        if self.face_size == 0 {
            bail!("face_size must be positive");
        }
        if self.lut_size < 2 {
            bail!("lut_size must be at least 2, got {}", self.lut_size);
        }
        if self.lut_samples == 0 {
            bail!("lut_samples must be at least 1");
        }
        if !(self.sun_solid_angle > 0.0 && self.sun_solid_angle < TAU) {
            bail!("sun_solid_angle must lie in (0, 2*pi), got {}", self.sun_solid_angle);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let config = BakeConfig::default();
        config.validate().expect("default config validates");
        assert_eq!(config.face_size, 128);
        assert_eq!(config.lut_size, 256);
        assert!(!config.extract_sun);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "{{\"face_size\": 64, \"extract_sun\": true}}").expect("write config");
        let config = BakeConfig::load(file.path()).expect("load config");
        assert_eq!(config.face_size, 64);
        assert!(config.extract_sun);
        assert_eq!(config.lut_samples, BakeConfig::default_lut_samples());
    }

    #[test]
    fn malformed_json_falls_back_to_defaults() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "not json").expect("write config");
        let config = BakeConfig::load_or_default(file.path());
        assert_eq!(config.face_size, BakeConfig::default_face_size());
    }

    #[test]
    fn overrides_replace_only_set_fields() {
        let mut config = BakeConfig::default();
        let overrides = BakeConfigOverrides {
            lut_size: Some(64),
            extract_sun: Some(true),
            ..Default::default()
        };
        config.apply_overrides(&overrides);
        assert_eq!(config.lut_size, 64);
        assert!(config.extract_sun);
        assert_eq!(config.face_size, BakeConfig::default_face_size());
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        let mut config = BakeConfig::default();
        config.face_size = 0;
        assert!(config.validate().is_err());

        let mut config = BakeConfig::default();
        config.lut_size = 1;
        assert!(config.validate().is_err());

        let mut config = BakeConfig::default();
        config.lut_samples = 0;
        assert!(config.validate().is_err());

        let mut config = BakeConfig::default();
        config.sun_solid_angle = 0.0;
        assert!(config.validate().is_err());
        config.sun_solid_angle = TAU + 1.0;
        assert!(config.validate().is_err());
    }
}
