use crate::config::BakeConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BakeCli {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    face_size: Option<u32>,
    lut_size: Option<u32>,
    samples: Option<u32>,
    extract_sun: Option<bool>,
    sun_solid_angle: Option<f32>,
    hdr_previews: Option<bool>,
}

impl BakeCli {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cli = BakeCli::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "input" => {
                    cli.input = Some(PathBuf::from(value));
                }
                "output" => {
                    cli.output = Some(PathBuf::from(value));
                }
                "config" => {
                    cli.config = Some(PathBuf::from(value));
                }
                "face-size" => {
                    cli.face_size =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid face size '{value}'"))?);
                }
                "lut-size" => {
                    cli.lut_size =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid LUT size '{value}'"))?);
                }
                "samples" => {
                    cli.samples = Some(
                        value.parse::<u32>().with_context(|| format!("Invalid sample count '{value}'"))?,
                    );
                }
                "extract-sun" => {
                    cli.extract_sun = Some(parse_bool_flag("extract-sun", &value)?);
                }
                "sun-solid-angle" => {
                    cli.sun_solid_angle = Some(
                        value.parse::<f32>().with_context(|| format!("Invalid solid angle '{value}'"))?,
                    );
                }
                "hdr-previews" => {
                    cli.hdr_previews = Some(parse_bool_flag("hdr-previews", &value)?);
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --input, --output, --config, \
                     --face-size, --lut-size, --samples, --extract-sun, --sun-solid-angle, \
                     --hdr-previews."
                ),
            }
        }
        Ok(cli)
    }

    pub fn input(&self) -> Result<&PathBuf> {
        self.input.as_ref().ok_or_else(|| anyhow!("Missing required flag --input <file-or-directory>"))
    }

    pub fn output(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| PathBuf::from("bake_out"))
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config.as_ref()
    }

    pub fn into_config_overrides(self) -> BakeConfigOverrides {
        BakeConfigOverrides {
            face_size: self.face_size,
            lut_size: self.lut_size,
            lut_samples: self.samples,
            extract_sun: self.extract_sun,
            sun_solid_angle: self.sun_solid_angle,
            write_hdr_previews: self.hdr_previews,
        }
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}
