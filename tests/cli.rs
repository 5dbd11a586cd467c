use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const DECLS: &str = r#"{
    "shapes": {
        "Point": { "x": "int", "y": { "type": "int", "optional": true, "default": 0 } },
        "Line": { "a": "Point", "b": "Point" }
    }
}"#;

fn shape_idl(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shape-idl"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("shape-idl should execute")
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("temp file write should succeed");
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are unicode")
}

#[test]
fn check_reports_each_file_and_fails_on_any_violation() {
    let dir = tempfile::tempdir().unwrap();
    let decl = write(dir.path(), "decl.json", DECLS);
    write(dir.path(), "ok.json", r#"{"a": {"x": 1}, "b": {"x": 2, "y": 3}}"#);
    write(dir.path(), "bad.json", r#"{"a": {"x": 1}, "b": {"x": "2"}}"#);

    let output = shape_idl(&[
        "check",
        "--decl",
        arg(&decl),
        "--shape",
        "Line",
        "-i",
        arg(&dir.path().join("ok.json")),
        arg(&dir.path().join("bad.json")),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}");
    assert!(stdout.contains("✅"), "{stdout}");
    assert!(stdout.contains("ok.json"), "{stdout}");
    assert!(stdout.contains("bad.json: b.x: expected int, got str"), "{stdout}");
}

#[test]
fn check_accepts_glob_patterns() {
    let dir = tempfile::tempdir().unwrap();
    let decl = write(dir.path(), "decl.json", DECLS);
    let inputs = dir.path().join("inputs");
    std::fs::create_dir(&inputs).unwrap();
    write(&inputs, "one.json", r#"{"x": 1}"#);
    write(&inputs, "two.json", r#"{"x": 2, "y": null}"#);
    let pattern = format!("{}/*.json", inputs.display());

    let output = shape_idl(&["check", "--decl", arg(&decl), "--shape", "Point", "-i", &pattern]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "stdout: {stdout}");
    assert_eq!(stdout.matches("✅").count(), 2, "{stdout}");
}

#[test]
fn check_with_json_pointer() {
    let dir = tempfile::tempdir().unwrap();
    let decl = write(dir.path(), "decl.json", DECLS);
    let input = write(dir.path(), "wrapped.json", r#"{"payload": {"point": {"x": 4}}}"#);

    let output = shape_idl(&[
        "check",
        "--decl",
        arg(&decl),
        "--shape",
        "Point",
        "--json-pointer",
        "/payload/point",
        "-i",
        arg(&input),
    ]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn normalize_applies_defaults_in_declared_order() {
    let dir = tempfile::tempdir().unwrap();
    let decl = write(dir.path(), "decl.json", DECLS);
    let input = write(dir.path(), "p.json", r#"{"x": 5}"#);
    let out = dir.path().join("out").join("p.json");

    let output = shape_idl(&[
        "normalize",
        "--decl",
        arg(&decl),
        "--shape",
        "Point",
        "-i",
        arg(&input),
        "-o",
        arg(&out),
    ]);
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written, serde_json::json!({"x": 5, "y": 0}));
}

#[test]
fn binding_and_identity_agree() {
    let dir = tempfile::tempdir().unwrap();
    let decl = write(dir.path(), "decl.json", DECLS);

    let identity = shape_idl(&["identity", "--decl", arg(&decl)]);
    assert_eq!(identity.status.code(), Some(0));
    let listing = String::from_utf8_lossy(&identity.stdout).to_string();
    let ids: Vec<(&str, &str)> = listing
        .lines()
        .filter_map(|line| line.split_once(' '))
        .collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0].0, "Point");
    assert_eq!(ids[1].0, "Line");

    let binding = shape_idl(&["binding", "--decl", arg(&decl), "--shape", "Line"]);
    let text = String::from_utf8_lossy(&binding.stdout);
    assert_eq!(binding.status.code(), Some(0));
    assert!(text.contains(&format!("class {}(Shape):", ids[0].1)), "{text}");
    assert!(text.contains(&format!("Line = {}", ids[1].1)), "{text}");
}

#[test]
fn schema_is_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let decl = write(dir.path(), "decl.json", DECLS);
    let output = shape_idl(&["schema", "--decl", arg(&decl), "--shape", "Point"]);
    assert_eq!(output.status.code(), Some(0));
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["required"], serde_json::json!(["x"]));
}

#[test]
fn unknown_shape_is_a_clean_error() {
    let dir = tempfile::tempdir().unwrap();
    let decl = write(dir.path(), "decl.json", DECLS);
    let output = shape_idl(&["schema", "--decl", arg(&decl), "--shape", "Circle"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no shape named `Circle` is declared"), "{stderr}");
}
