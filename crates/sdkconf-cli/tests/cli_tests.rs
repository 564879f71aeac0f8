use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn sdkconf(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("sdkconf").unwrap();
    cmd.env("SDKCONF_CONFIG", dir.join("settings.json"))
        .env_remove("SDKCONF_KEY")
        .env("RUST_LOG", "warn");
    cmd
}

fn generate_key(dir: &Path) -> String {
    let out = sdkconf(dir).arg("keygen").assert().success();
    String::from_utf8(out.get_output().stdout.clone())
        .unwrap()
        .trim()
        .to_string()
}

fn seal_header(dir: &Path, key: &str, config: serde_json::Value) -> String {
    let input = dir.join("plain.json");
    fs::write(&input, serde_json::to_vec(&config).unwrap()).unwrap();
    let out = sdkconf(dir)
        .env("SDKCONF_KEY", key)
        .arg("seal")
        .arg("--from-json")
        .arg(&input)
        .arg("--header")
        .assert()
        .success();
    String::from_utf8(out.get_output().stdout.clone())
        .unwrap()
        .trim()
        .to_string()
}

fn assemble(dir: &Path, key: &str, header: &str, extra: &[&str]) -> serde_json::Value {
    let out = sdkconf(dir)
        .env("SDKCONF_KEY", key)
        .arg("assemble")
        .arg("--cookie-header")
        .arg(header)
        .args(extra)
        .assert()
        .success();
    serde_json::from_slice(&out.get_output().stdout).unwrap()
}

fn full_config() -> serde_json::Value {
    serde_json::json!({
        "apiKey": "AIza-demo",
        "authDomain": "demo.example.com",
        "databaseURL": "https://demo.example.com/db",
        "projectId": "demo",
        "storageBucket": "demo.appspot.com",
        "messagingSenderId": "1234",
        "appId": "1:1234:web:abcd",
        "measurementId": "G-XYZ"
    })
}

#[test]
fn keygen_prints_base64_key() {
    let dir = tempdir().unwrap();
    let key = generate_key(dir.path());
    assert_eq!(key.len(), 44);
}

#[test]
fn seal_emits_one_line_per_field() {
    let dir = tempdir().unwrap();
    let key = generate_key(dir.path());
    sdkconf(dir.path())
        .env("SDKCONF_KEY", &key)
        .args(["seal", "--field", "projectId", "--value", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("XSRF-TOKEN-PI=v1."));
}

#[test]
fn seal_rejects_unknown_field() {
    let dir = tempdir().unwrap();
    let key = generate_key(dir.path());
    sdkconf(dir.path())
        .env("SDKCONF_KEY", &key)
        .args(["seal", "--field", "apiSecret", "--value", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown config field"));
}

#[test]
fn seal_requires_key() {
    let dir = tempdir().unwrap();
    sdkconf(dir.path())
        .args(["seal", "--field", "apiKey", "--value", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SDKCONF_KEY"));
}

#[test]
fn assemble_full_config_initializes() {
    let dir = tempdir().unwrap();
    let key = generate_key(dir.path());
    let header = seal_header(dir.path(), &key, full_config());
    let report = assemble(dir.path(), &key, &header, &[]);
    assert_eq!(report["outcome"], "INITIALIZED");
    assert_eq!(report["config"], full_config());
    assert_eq!(report["diagnostics"].as_array().unwrap().len(), 0);
}

#[test]
fn assemble_required_only_passes_nulls() {
    let dir = tempdir().unwrap();
    let key = generate_key(dir.path());
    let header = seal_header(
        dir.path(),
        &key,
        serde_json::json!({"apiKey": "k", "authDomain": "d", "projectId": "p"}),
    );
    let report = assemble(dir.path(), &key, &header, &["--parallel"]);
    assert_eq!(report["outcome"], "INITIALIZED");
    assert!(report["config"]["storageBucket"].is_null());
    assert_eq!(report["config"]["projectId"], "p");
}

#[test]
fn assemble_with_wrong_key_degrades() {
    let dir = tempdir().unwrap();
    let key = generate_key(dir.path());
    let other = generate_key(dir.path());
    let header = seal_header(dir.path(), &key, full_config());
    let log = dir.path().join("diag.jsonl");
    let report = assemble(
        dir.path(),
        &other,
        &header,
        &["--diagnostics-log", log.to_str().unwrap()],
    );
    assert_eq!(report["outcome"], "SKIPPED_INCOMPLETE");
    assert!(report["config"].is_null());
    // eight decryption failures plus the incomplete warning
    assert_eq!(report["diagnostics"].as_array().unwrap().len(), 9);
    let lines = fs::read_to_string(&log).unwrap();
    assert_eq!(lines.lines().count(), 9);
}

#[test]
fn assemble_without_sdk_is_skipped() {
    let dir = tempdir().unwrap();
    let key = generate_key(dir.path());
    let header = seal_header(dir.path(), &key, full_config());
    let report = assemble(dir.path(), &key, &header, &["--sdk-missing"]);
    assert_eq!(report["outcome"], "SKIPPED_UNAVAILABLE");
    assert_eq!(report["diagnostics"][0]["kind"], "SDK_UNAVAILABLE");
}

#[test]
fn assemble_with_existing_app_is_skipped() {
    let dir = tempdir().unwrap();
    let key = generate_key(dir.path());
    let header = seal_header(dir.path(), &key, full_config());
    let report = assemble(dir.path(), &key, &header, &["--apps", "1"]);
    assert_eq!(report["outcome"], "SKIPPED");
    assert!(report["config"].is_null());
}

#[test]
fn assemble_reads_json_cookie_file() {
    let dir = tempdir().unwrap();
    let key = generate_key(dir.path());
    let header = seal_header(dir.path(), &key, full_config());
    let map: serde_json::Map<String, serde_json::Value> = header
        .split("; ")
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect();
    let cookie_file = dir.path().join("cookies.json");
    fs::write(&cookie_file, serde_json::to_vec(&map).unwrap()).unwrap();

    let out = sdkconf(dir.path())
        .env("SDKCONF_KEY", &key)
        .arg("assemble")
        .arg("--cookie-file")
        .arg(&cookie_file)
        .assert()
        .success();
    let report: serde_json::Value = serde_json::from_slice(&out.get_output().stdout).unwrap();
    assert_eq!(report["outcome"], "INITIALIZED");
}

#[test]
fn settings_file_selects_key_variable() {
    let dir = tempdir().unwrap();
    let key = generate_key(dir.path());
    fs::write(
        dir.path().join("settings.json"),
        r#"{"key_source":{"type":"env","var":"CUSTOM_COOKIE_KEY"},"parallel":true}"#,
    )
    .unwrap();
    sdkconf(dir.path())
        .env("CUSTOM_COOKIE_KEY", &key)
        .args(["seal", "--field", "apiKey", "--value", "k"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("XSRF-TOKEN-AK="));
}

#[test]
fn keygen_salt_prints_base64_salt() {
    let dir = tempdir().unwrap();
    sdkconf(dir.path())
        .args(["keygen", "--salt"])
        .assert()
        .success()
        .stdout(predicate::function(|out: &str| {
            let salt = out.trim();
            salt.len() == 24 && salt.ends_with("==")
        }));
}

#[test]
fn keygen_ignores_malformed_settings() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("settings.json"), "{not json").unwrap();
    let key = generate_key(dir.path());
    assert_eq!(key.len(), 44);
    sdkconf(dir.path())
        .env("SDKCONF_KEY", &key)
        .args(["seal", "--field", "apiKey", "--value", "k"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse settings"));
}

#[test]
fn assemble_without_sdk_needs_no_key() {
    let dir = tempdir().unwrap();
    let out = sdkconf(dir.path())
        .args(["assemble", "--sdk-missing"])
        .assert()
        .success();
    let report: serde_json::Value = serde_json::from_slice(&out.get_output().stdout).unwrap();
    assert_eq!(report["outcome"], "SKIPPED_UNAVAILABLE");

    let out = sdkconf(dir.path())
        .env("SDKCONF_KEY", "bad")
        .args(["assemble", "--apps", "1", "--cookie-file"])
        .arg(dir.path().join("missing.txt"))
        .assert()
        .success();
    let report: serde_json::Value = serde_json::from_slice(&out.get_output().stdout).unwrap();
    assert_eq!(report["outcome"], "SKIPPED");
    assert_eq!(report["diagnostics"].as_array().unwrap().len(), 0);
}

#[test]
fn assemble_with_sdk_requires_key() {
    let dir = tempdir().unwrap();
    sdkconf(dir.path())
        .args(["assemble", "--cookie-header", "XSRF-TOKEN-AK=v1.x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SDKCONF_KEY"));
}

#[cfg(target_os = "linux")]
#[test]
fn persist_diagnostics_writes_to_data_dir() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("settings.json"),
        r#"{"persist_diagnostics":true}"#,
    )
    .unwrap();
    let data_home = dir.path().join("data");
    sdkconf(dir.path())
        .env("XDG_DATA_HOME", &data_home)
        .args(["assemble", "--sdk-missing"])
        .assert()
        .success();
    let log = data_home.join("sdkconf").join("logs").join("diagnostics.jsonl");
    let lines = fs::read_to_string(&log).unwrap();
    assert_eq!(lines.lines().count(), 1);
    assert!(lines.contains("SDK_UNAVAILABLE"));
}
