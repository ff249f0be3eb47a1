use envbake::config::BakeConfig;
use envbake::pipeline::{collect_inputs, run_batch};
use envbake::radiance::RadianceImage;
use envbake::{artifacts, bake_environment};
use glam::{Vec3, Vec4};
use image::{Rgb, RgbImage};
use std::f32::consts::TAU;
use tempfile::tempdir;

/// Sky gradient with a hot sun patch near the upper third of the panorama.
fn synthetic_sky(width: u32, height: u32) -> RadianceImage {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        let v = (y as f32 + 0.5) / height as f32;
        for _x in 0..width {
            let sky = Vec3::new(0.25, 0.35, 0.6) * (1.0 - v) + Vec3::new(0.2, 0.18, 0.16) * v;
            pixels.push(sky.extend(1.0));
        }
    }
    let mut image = RadianceImage::from_pixels(width, height, pixels).expect("sky image");
    let (sun_x, sun_y) = (width / 2, height / 4);
    image.set_rgb(sun_x, sun_y, Vec3::new(900.0, 850.0, 700.0));
    image
}

fn small_config() -> BakeConfig {
    let mut config = BakeConfig::default();
    config.face_size = 8;
    config.lut_size = 8;
    config.lut_samples = 64;
    // Footprint sized to a couple of texels of a 64-wide panorama.
    config.sun_solid_angle = TAU * (1.0 - (1.6 * TAU / 64.0).cos());
    config
}

#[test]
fn full_bake_produces_all_artifacts() {
    let mut config = small_config();
    config.extract_sun = true;
    let baked = bake_environment(synthetic_sky(64, 32), &config).expect("bake");

    assert_eq!(baked.cubemap.size, 8);
    for face in &baked.cubemap.faces {
        assert_eq!(face.len(), 8 * 8 * 4);
    }
    assert_eq!(baked.lut.size, 8);
    assert_eq!(baked.lut.data.len(), 8 * 8 * 2);

    let sun = baked.sun.expect("sun extracted");
    assert!((sun.direction.length() - 1.0).abs() < 1e-5);
    // The sun sits in the upper hemisphere, so the light travel direction points down.
    assert!(sun.direction.y < 0.0, "sun direction {:?}", sun.direction);
    assert!(sun.radiance.x > 10.0, "sun radiance {:?}", sun.radiance);
}

#[test]
fn extracting_the_sun_removes_it_from_the_background() {
    let config_plain = small_config();
    let mut config_sun = small_config();
    config_sun.extract_sun = true;

    let with_sun = bake_environment(synthetic_sky(64, 32), &config_plain).expect("bake");
    let without_sun = bake_environment(synthetic_sky(64, 32), &config_sun).expect("bake");

    // The flattened panorama must carry visibly less diffuse energy.
    let kept = with_sun.sh.evaluate(Vec3::Y).x;
    let removed = without_sun.sh.evaluate(Vec3::Y).x;
    assert!(
        removed < kept * 0.9,
        "sun energy still present: with {kept}, without {removed}"
    );
}

#[test]
fn bake_without_sun_extraction_reports_no_sun() {
    let baked = bake_environment(synthetic_sky(64, 32), &small_config()).expect("bake");
    assert!(baked.sun.is_none());
}

#[test]
fn all_black_panorama_still_bakes_background_artifacts() {
    let mut config = small_config();
    config.extract_sun = true;
    let image = RadianceImage::filled(32, 16, Vec4::new(0.0, 0.0, 0.0, 1.0)).expect("image");
    let baked = bake_environment(image, &config).expect("bake");
    // Degenerate input costs only the sun artifact.
    assert!(baked.sun.is_none());
    assert_eq!(baked.cubemap.size, config.face_size);
    for coeff in baked.sh.coeffs {
        assert_eq!(coeff, Vec3::ZERO);
    }
}

#[test]
fn invalid_config_fails_before_baking() {
    let mut config = small_config();
    config.lut_samples = 0;
    assert!(bake_environment(synthetic_sky(16, 8), &config).is_err());
}

#[test]
fn batch_continues_past_bad_assets_and_reports_them() {
    let input_dir = tempdir().expect("input dir");
    let output_dir = tempdir().expect("output dir");

    let mut good = RgbImage::new(16, 8);
    for (x, y, pixel) in good.enumerate_pixels_mut() {
        *pixel = Rgb([(x * 10) as u8, (y * 20) as u8, 128]);
    }
    good.save(input_dir.path().join("Good Sky.png")).expect("save png");
    std::fs::write(input_dir.path().join("broken.hdr"), b"not an hdr file").expect("write junk");

    let inputs = collect_inputs(input_dir.path()).expect("collect inputs");
    assert_eq!(inputs.len(), 2);

    let config = small_config();
    let report = run_batch(&inputs, output_dir.path(), &config).expect("batch");
    assert_eq!(report.baked, 1);
    assert_eq!(report.failed, 1);

    // Per-batch LUT plus the good asset's artifacts.
    assert!(output_dir.path().join("dfg_lut.bin").exists());
    let asset_dir = output_dir.path().join("good_sky");
    assert!(asset_dir.join("cubemap.bin").exists());
    assert!(asset_dir.join("sh.txt").exists());

    // Written artifacts load back with matching shapes.
    let cubemap = artifacts::read_cubemap(asset_dir.join("cubemap.bin")).expect("cubemap");
    assert_eq!(cubemap.size, config.face_size);
    let lut = artifacts::read_dfg_lut(output_dir.path().join("dfg_lut.bin")).expect("lut");
    assert_eq!(lut.size, config.lut_size);
    artifacts::read_sh(asset_dir.join("sh.txt")).expect("sh");
}

#[test]
fn batch_writes_sun_and_previews_when_enabled() {
    let input_dir = tempdir().expect("input dir");
    let output_dir = tempdir().expect("output dir");

    let mut sky = RgbImage::new(32, 16);
    for (_x, _y, pixel) in sky.enumerate_pixels_mut() {
        *pixel = Rgb([40, 60, 90]);
    }
    sky.put_pixel(16, 4, Rgb([255, 255, 255]));
    sky.save(input_dir.path().join("sunny.png")).expect("save png");

    let mut config = small_config();
    config.extract_sun = true;
    config.write_hdr_previews = true;

    let inputs = collect_inputs(input_dir.path()).expect("collect inputs");
    let report = run_batch(&inputs, output_dir.path(), &config).expect("batch");
    assert_eq!(report.failed, 0);

    let asset_dir = output_dir.path().join("sunny");
    let sun = artifacts::read_sun(asset_dir.join("sun.json")).expect("sun record");
    assert!((sun.direction.length() - 1.0).abs() < 1e-5);
    assert_eq!(sun.solid_angle, config.sun_solid_angle);
    assert!(asset_dir.join("face_px.hdr").exists());
    assert!(asset_dir.join("face_nz.hdr").exists());
}

#[test]
fn collect_inputs_accepts_a_single_file() {
    let input_dir = tempdir().expect("input dir");
    let path = input_dir.path().join("alone.png");
    RgbImage::new(4, 2).save(&path).expect("save png");

    let inputs = collect_inputs(&path).expect("collect single file");
    assert_eq!(inputs, vec![path]);

    let unsupported = input_dir.path().join("alone.tiff");
    std::fs::write(&unsupported, b"junk").expect("write junk");
    assert!(collect_inputs(&unsupported).is_err());
}
