use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn vesper() -> Command {
    let mut cmd = Command::cargo_bin("vesper").expect("binary exists");
    cmd.env_remove("VESPER_EXTENSIONS_DIR");
    cmd
}

#[test]
fn vesper_runs_quickstart() {
    vesper()
        .arg("demos/quickstart.vsp")
        .assert()
        .success()
        .stdout("Hello from Vesper!\n14\n3.5\ntext\n");
}

#[test]
fn script_error_exits_with_failure() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("broken.vsp");
    fs::write(&script, "print 1\nprint nope\nprint 2\n").expect("write script");

    vesper()
        .arg(&script)
        .assert()
        .failure()
        .stdout("1\n")
        .stderr(predicate::str::contains("error: UndefinedName"));
}

#[test]
fn extensions_dir_flag_points_the_loader() {
    let dir = tempdir().expect("create temp dir");
    let ext = dir.path().join("ext").join("greeting");
    fs::create_dir_all(&ext).expect("create extension dir");
    fs::write(
        ext.join("extension.toml"),
        "[exports]\nshout = { function = \"upper\" }\n",
    )
    .expect("write manifest");
    let script = dir.path().join("main.vsp");
    fs::write(&script, "use greeting\nprint shout(\"quiet\")\n").expect("write script");

    vesper()
        .arg(&script)
        .arg("--extensions-dir")
        .arg(dir.path().join("ext"))
        .assert()
        .success()
        .stdout("QUIET\n");
}

#[test]
fn extensions_dir_can_come_from_the_environment() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("main.vsp");
    fs::write(&script, "use missing\n").expect("write script");

    vesper()
        .arg(&script)
        .env("VESPER_EXTENSIONS_DIR", dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("ExtensionNotFound"))
        .stderr(predicate::str::contains(
            dir.path().join("missing").display().to_string(),
        ));
}

#[test]
fn config_file_sets_extensions_dir() {
    let dir = tempdir().expect("create temp dir");
    let ext = dir.path().join("plugins").join("m");
    fs::create_dir_all(&ext).expect("create extension dir");
    fs::write(ext.join("extension.toml"), "entry = \"math\"\n").expect("write manifest");
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        format!(
            "extensions_dir = {:?}\n",
            dir.path().join("plugins").display().to_string()
        ),
    )
    .expect("write config");
    let script = dir.path().join("main.vsp");
    fs::write(&script, "use m\nprint abs(-3)\n").expect("write script");

    vesper()
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn missing_script_is_reported() {
    vesper()
        .arg("does/not/exist.vsp")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: I/O error"));
}
