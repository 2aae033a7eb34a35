use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_nodebox")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "nodebox.exe"
            } else {
                "nodebox"
            });
            p
        })
}

#[test]
fn cli_render_writes_json() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let out_path = dir.join("out.json");
    let _ = std::fs::remove_file(&out_path);

    let doc = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/copy_rects.json");
    let doc_arg = doc.to_string_lossy().to_string();
    let out_arg = out_path.to_string_lossy().to_string();

    let status = std::process::Command::new(exe())
        .args(["render", "--in", doc_arg.as_str(), "--frame", "3", "--out"])
        .arg(out_arg.as_str())
        .status()
        .unwrap();
    assert!(status.success());

    let written = std::fs::read_to_string(&out_path).unwrap();
    let values: Vec<nodebox::Value> = serde_json::from_str(&written).unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(
        values[0].as_grob().map(|g| g.bounds()),
        Some(nodebox::Rect::new(0.0, 0.0, 100.0, 500.0))
    );
}

#[test]
fn cli_render_of_a_missing_node_fails() {
    let doc = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/copy_rects.json");
    let output = std::process::Command::new(exe())
        .args(["render", "--in"])
        .arg(&doc)
        .args(["--node", "/nope"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("/nope"));
}

#[test]
fn cli_lists_types() {
    let output = std::process::Command::new(exe())
        .arg("types")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("copy -> group"));
    assert!(stdout.contains("rect -> path"));
}
