//! CLI integration tests for the import, decode and blocks commands
//!
//! These tests run the pxgd binary against scratch images and save files in
//! a temporary directory and check exit codes, output and the patched save.

use image::{Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SAVE: &str = "<?xml version=\"1.0\"?><plist version=\"1.0\" gjver=\"2.0\"><dict><k>LLM_01</k><d><k>_isArr</k><t /><k>k_0</k><d><k>kCEK</k><i>4</i><k>k2</k><s>First</s></d><k>k_1</k><d><k>kCEK</k><i>4</i><k>k2</k><s>Second</s></d></d><k>LLM_02</k><i>35</i></dict></plist>";

/// Get the path to the pxgd binary
fn pxgd_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pxgd"))
}

/// A pxgd command running in `cwd`
fn pxgd(cwd: &Path) -> Command {
    let mut cmd = Command::new(pxgd_binary());
    cmd.current_dir(cwd).env_remove("PXGD_LOG");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("Failed to execute pxgd")
}

/// Write a solid-color PNG
fn write_image(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 4]) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(width, height, Rgba(color)).save(&path).expect("should write image");
    path
}

fn write_save(dir: &Path, content: &[u8]) -> PathBuf {
    let path = dir.join("CCLocalLevels.dat");
    fs::write(&path, content).expect("should write save");
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_import_single_color_square() {
    let temp = TempDir::new().expect("should create temp dir");
    let image = write_image(temp.path(), "red_square.png", 2, 2, [255, 0, 0, 255]);
    let save = write_save(temp.path(), SAVE.as_bytes());

    let output = run(pxgd(temp.path()).arg("import").arg(&image).arg("--save").arg(&save));
    assert!(output.status.success(), "Import failed: {}", stderr(&output));
    assert!(stdout(&output).contains("(1 objects)"), "stdout: {}", stdout(&output));

    let patched = fs::read_to_string(&save).expect("should read save");
    assert!(patched.starts_with("<?xml version=\"1.0\"?>"));
    assert!(patched.contains("<k>k_0</k><d><k>kCEK</k><i>4</i><k>k2</k><s>redsquare</s>"));
    assert!(patched.contains("<s>red_square.png | 1 objects</s>"));
    assert!(patched.contains("1,916,2,307.5,3,208.5,21,10,41,1,43,0a1a1a0a0;"));
    assert!(patched.contains("<k>k_1</k><d><k>kCEK</k><i>4</i><k>k2</k><s>First</s>"));
    assert!(patched.contains("<k>k_2</k><d><k>kCEK</k><i>4</i><k>k2</k><s>Second</s>"));
    assert!(patched.ends_with("</d><k>LLM_02</k><i>35</i></dict></plist>"));
}

#[test]
fn test_import_missing_image() {
    let temp = TempDir::new().expect("should create temp dir");
    let save = write_save(temp.path(), SAVE.as_bytes());

    let output = run(pxgd(temp.path()).arg("import").arg("nope.png").arg("--save").arg(&save));
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Invalid file location"));
    assert_eq!(fs::read_to_string(&save).expect("should read save"), SAVE);
}

#[test]
fn test_import_corrupt_save_is_left_alone() {
    let temp = TempDir::new().expect("should create temp dir");
    let image = write_image(temp.path(), "dot.png", 1, 1, [0, 0, 0, 255]);

    // XOR-11 of valid base64 that does not hold a compressed stream
    let masked: Vec<u8> = b"bm90IGNvbXByZXNzZWQ=".iter().map(|b| b ^ 11).collect();
    let save = write_save(temp.path(), &masked);

    let output = run(pxgd(temp.path()).arg("import").arg(&image).arg("--save").arg(&save));
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("corrupt"), "stderr: {}", stderr(&output));
    assert_eq!(fs::read(&save).expect("should read save"), masked);
}

#[test]
fn test_import_encoded_then_decode() {
    let temp = TempDir::new().expect("should create temp dir");
    let image = write_image(temp.path(), "blue.png", 4, 4, [0, 0, 255, 255]);
    let save = write_save(temp.path(), SAVE.as_bytes());

    let output =
        run(pxgd(temp.path()).arg("import").arg(&image).arg("--save").arg(&save).arg("--encode"));
    assert!(output.status.success(), "Import failed: {}", stderr(&output));

    let raw = fs::read(&save).expect("should read save");
    assert!(!raw.starts_with(b"<?xml"));

    let decoded_path = temp.path().join("decoded.xml");
    let output = run(pxgd(temp.path()).arg("decode").arg(&save).arg("-o").arg(&decoded_path));
    assert!(output.status.success(), "Decode failed: {}", stderr(&output));

    let decoded = fs::read_to_string(&decoded_path).expect("should read decoded save");
    assert!(decoded.contains("<s>blue</s>"));
    assert!(decoded.contains("1,211,"));
    assert!(decoded.contains("43,240a1a1a0a0;"));

    // Importing again into the encoded save works and shifts everything once more
    let output = run(pxgd(temp.path()).arg("import").arg(&image).arg("--save").arg(&save));
    assert!(output.status.success(), "Second import failed: {}", stderr(&output));
    let patched = fs::read_to_string(&save).expect("plaintext after second import");
    assert!(patched.contains("<k>k_3</k><d><k>kCEK</k><i>4</i><k>k2</k><s>Second</s>"));
}

#[test]
fn test_import_dry_run() {
    let temp = TempDir::new().expect("should create temp dir");
    let image = write_image(temp.path(), "dot.png", 3, 3, [10, 20, 30, 255]);
    let save = write_save(temp.path(), SAVE.as_bytes());

    let output =
        run(pxgd(temp.path()).arg("import").arg(&image).arg("--save").arg(&save).arg("--dry-run"));
    assert!(output.status.success(), "Import failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Dry run"));
    // 3x3: one 2x2 block plus five single pixels
    assert!(stdout(&output).contains("(6 objects)"), "stdout: {}", stdout(&output));
    assert_eq!(fs::read_to_string(&save).expect("should read save"), SAVE);
}

#[test]
fn test_import_uses_config_file() {
    let temp = TempDir::new().expect("should create temp dir");
    let image = write_image(temp.path(), "dot.png", 2, 2, [0, 255, 0, 255]);
    write_save(temp.path(), SAVE.as_bytes());
    fs::write(
        temp.path().join("pxgd.toml"),
        "[save]\npath = \"CCLocalLevels.dat\"\n\n[level.tiles]\n1 = \"917\"\n",
    )
    .expect("should write config");

    let output = run(pxgd(temp.path()).arg("import").arg(&image));
    assert!(output.status.success(), "Import failed: {}", stderr(&output));
    // Without a scale-2 tile nothing merges
    assert!(stdout(&output).contains("(4 objects)"), "stdout: {}", stdout(&output));
}

#[test]
fn test_blocks_command() {
    let temp = TempDir::new().expect("should create temp dir");
    let mut img = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 255, 255]));
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    img.put_pixel(0, 1, Rgba([255, 0, 0, 255]));
    let image = temp.path().join("stripes.png");
    img.save(&image).expect("should write image");

    let output =
        run(pxgd(temp.path()).arg("blocks").arg(&image).arg("--strategy").arg("rescan"));
    assert!(output.status.success(), "Blocks failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("x1: 2 blocks"), "stdout: {}", out);
    assert!(out.contains("x2: 1 blocks"), "stdout: {}", out);
    assert!(out.contains("Total: 3 objects"));

    let output = run(pxgd(temp.path()).arg("blocks").arg(&image));
    assert!(output.status.success());
    assert!(stdout(&output).contains("Total: 6 objects"));
}

#[test]
fn test_blocks_alpha_threshold() {
    let temp = TempDir::new().expect("should create temp dir");
    let image = write_image(temp.path(), "ghost.png", 2, 2, [255, 255, 255, 100]);

    let output = run(pxgd(temp.path()).arg("blocks").arg(&image));
    assert!(output.status.success());
    assert!(stdout(&output).contains("Total: 0 objects"));

    let output =
        run(pxgd(temp.path()).arg("blocks").arg(&image).arg("--alpha-threshold").arg("50"));
    assert!(output.status.success());
    assert!(stdout(&output).contains("Total: 1 objects"));
}
