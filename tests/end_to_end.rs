//! End-to-end tests that run the compiled binary against a temp directory.

use image::{DynamicImage, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_simple-augment")
}

fn write_png(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 11 % 256) as u8, (y * 23 % 256) as u8, ((x + y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img).save(path).unwrap();
}

/// Input dir with two PNGs; returns (tempdir, input, output).
fn fixture() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("Train");
    fs::create_dir_all(&input).unwrap();
    write_png(&input.join("alpha.png"), 32, 24);
    write_png(&input.join("beta.png"), 20, 30);
    let output = tmp.path().join("Export");
    (tmp, input, output)
}

fn run(cwd: &Path, args: &[&str]) -> Output {
    Command::new(bin())
        .current_dir(cwd)
        .args(args)
        .output()
        .unwrap()
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn two_images_five_variants_mirrored() {
    let (tmp, input, output) = fixture();

    let out = run(
        tmp.path(),
        &[
            "run",
            "--source",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--variants",
            "5",
            "--seed",
            "7",
        ],
    );
    assert!(
        out.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let names = listing(&output);
    assert_eq!(names.len(), 20);
    for stem in ["alpha", "beta"] {
        for i in 0..5 {
            assert!(names.contains(&format!("{stem}_{i}.png")));
            assert!(names.contains(&format!("{stem}_{i}_mirrored.png")));
        }
    }

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Seed: 7"));
    assert!(stdout.contains("Files written: 20"));
}

#[test]
fn same_seed_reproduces_bytes() {
    let (tmp, input, _) = fixture();
    let first = tmp.path().join("first");
    let second = tmp.path().join("second");

    for dir in [&first, &second] {
        let out = run(
            tmp.path(),
            &[
                "run",
                "--source",
                input.to_str().unwrap(),
                "--output",
                dir.to_str().unwrap(),
                "--seed",
                "99",
            ],
        );
        assert!(out.status.success());
    }

    for name in listing(&first) {
        let a = fs::read(first.join(&name)).unwrap();
        let b = fs::read(second.join(&name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn per_original_mirror_and_report() {
    let (tmp, input, output) = fixture();
    let report = tmp.path().join("report.json");

    let out = run(
        tmp.path(),
        &[
            "run",
            "--source",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--variants",
            "2",
            "--mirror",
            "per-original",
            "--seed",
            "1",
            "--report",
            report.to_str().unwrap(),
        ],
    );
    assert!(out.status.success());
    assert_eq!(
        listing(&output),
        vec![
            "alpha_0.png",
            "alpha_1.png",
            "alpha_mirrored.png",
            "beta_0.png",
            "beta_1.png",
            "beta_mirrored.png",
        ]
    );

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["seed"], 1);
    assert_eq!(json["files_written"], 6);
    assert_eq!(json["failures"].as_array().unwrap().len(), 0);
}

#[test]
fn config_file_is_honoured() {
    let (tmp, input, output) = fixture();
    fs::write(
        tmp.path().join("augment.toml"),
        "[variants]\ncount = 1\nmirror = \"off\"\nseed = 3\n",
    )
    .unwrap();

    let out = run(
        tmp.path(),
        &[
            "run",
            "--source",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ],
    );
    assert!(out.status.success());
    assert_eq!(listing(&output), vec!["alpha_0.png", "beta_0.png"]);
}

#[test]
fn variant_failures_give_nonzero_exit() {
    let (tmp, input, output) = fixture();
    let config = tmp.path().join("bad-blur.toml");
    fs::write(&config, "[ranges]\nblur = [-1.0, -0.5]\n").unwrap();

    let out = run(
        tmp.path(),
        &[
            "run",
            "--source",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--seed",
            "1",
        ],
    );
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Variants: 0 generated, 10 failed"));
}

#[test]
fn invalid_config_is_rejected() {
    let (tmp, input, output) = fixture();
    let config = tmp.path().join("typo.toml");
    fs::write(&config, "[variants]\ncuont = 3\n").unwrap();

    let out = run(
        tmp.path(),
        &[
            "run",
            "--source",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ],
    );
    assert!(!out.status.success());
    assert!(!output.exists());
}

#[test]
fn check_lists_images_and_skips() {
    let (tmp, input, output) = fixture();
    fs::write(input.join("notes.txt"), "hello").unwrap();

    let out = run(
        tmp.path(),
        &["check", "--source", input.to_str().unwrap()],
    );
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("001 alpha.png (32x24)"));
    assert!(stdout.contains("002 beta.png (20x30)"));
    assert!(stdout.contains("notes.txt: not an image"));
    assert!(!output.exists());
}

#[test]
fn missing_source_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let out = run(tmp.path(), &["run", "--source", "does-not-exist"]);
    assert!(!out.status.success());
}

#[test]
fn gen_config_output_parses() {
    let tmp = TempDir::new().unwrap();
    let out = run(tmp.path(), &["gen-config"]);
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    let value: toml::Value = toml::from_str(&text).unwrap();
    assert_eq!(value["variants"]["count"].as_integer(), Some(5));
}
