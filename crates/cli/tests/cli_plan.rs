//! Runs the `framecast` binary against a temporary task tree.

use std::path::Path;
use std::process::{Command, Output};

use framecast_core::testing::fixtures::{
    touch_image, write_csv_ledger, write_csv_ledger_with_status,
};
use tempfile::TempDir;

fn framecast(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_framecast"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("framecast.toml");
    std::fs::write(
        &path,
        r#"
[download]
prompt_slice_chars = 10
"#,
    )
    .unwrap();
    path
}

#[test]
fn test_plan_lists_pending_items_as_json() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    let group = root.join("batch");
    write_csv_ledger_with_status(
        &group.join("tasks.csv"),
        &[("a red fox", ""), ("a blue whale", "已生成视频")],
    )
    .unwrap();
    touch_image(&group.join("1_fox.png")).unwrap();
    touch_image(&group.join("2_whale.png")).unwrap();
    let config = write_config(temp.path());

    let output = framecast(
        &config,
        &["--json", "plan", "--root", root.to_str().unwrap()],
    );
    assert!(output.status.success(), "{:?}", output);

    let plans: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let plans = plans.as_array().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0]["group"], "batch");
    assert_eq!(plans[0]["assets"], 2);

    let items = plans[0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["row"], 1);
    assert_eq!(items[0]["sequence"], 1);
    assert_eq!(items[0]["output_name"], "1_a_red_fox.mp4");
}

#[test]
fn test_plan_text_output() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    let group = root.join("batch");
    write_csv_ledger(&group.join("tasks.csv"), &["sunset"]).unwrap();
    touch_image(&group.join("1_sun.jpg")).unwrap();
    let config = write_config(temp.path());

    let output = framecast(&config, &["plan", "--root", root.to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("batch"));
    assert!(stdout.contains("1 pending"));
    assert!(stdout.contains("1_sunset.mp4"));
}

#[test]
fn test_plan_rejects_missing_root() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());
    let missing = temp.path().join("nope");

    let output = framecast(&config, &["plan", "--root", missing.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn test_run_requires_browser_id() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    std::fs::create_dir_all(&root).unwrap();
    let config = write_config(temp.path());

    let output = Command::new(env!("CARGO_BIN_EXE_framecast"))
        .arg("--config")
        .arg(&config)
        .args(["run", "--root", root.to_str().unwrap()])
        .env_remove("FRAMECAST_SESSION__BROWSER_ID")
        .env("RUST_LOG", "error")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("browser_id"));
}
