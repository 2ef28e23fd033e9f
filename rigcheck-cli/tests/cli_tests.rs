//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

/// Build command for the rigcheck-cli binary.
fn rigcheck_cli() -> Command {
    cargo_bin_cmd!("rigcheck-cli")
}

/// Path to rigcheck library test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("rigcheck")
        .join("tests")
        .join("fixtures")
}

fn request(name: &str) -> PathBuf {
    fixtures_dir().join("requests").join(name)
}

#[test]
fn test_cli_help() {
    let mut cmd = rigcheck_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("compatibility"));
}

#[test]
fn test_cli_version() {
    let mut cmd = rigcheck_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_check_compatible_build() {
    let mut cmd = rigcheck_cli();

    cmd.arg("check")
        .arg(request("compatible_build.json"))
        .arg("--fail-on-incompatible");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Compatible"));
}

#[test]
fn test_cli_check_incompatible_build() {
    let mut cmd = rigcheck_cli();

    cmd.arg("check").arg(request("incompatible_build.json"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("INCOMPATIBLE"))
        .stdout(predicate::str::contains("[socket_match] cpu+motherboard"));
}

#[test]
fn test_cli_check_fail_on_incompatible() {
    let mut cmd = rigcheck_cli();

    cmd.arg("check")
        .arg(request("incompatible_build.json"))
        .arg("--fail-on-incompatible");

    cmd.assert().failure().code(1);
}

#[test]
fn test_cli_check_json_output() {
    let mut cmd = rigcheck_cli();

    cmd.arg("check")
        .arg(request("incompatible_build.json"))
        .arg("--format")
        .arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let response: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(response["compatible"], false);
    assert_eq!(response["entries"].as_array().unwrap().len(), 5);
    assert_eq!(response["entries"][0]["ruleId"], "cooler_clearance");
    assert_eq!(response["errors"].as_array().unwrap().len(), 5);
}

#[test]
fn test_cli_check_plain_output() {
    let mut cmd = rigcheck_cli();

    cmd.arg("check")
        .arg(request("missing_psu.json"))
        .arg("--format")
        .arg("plain");

    cmd.assert()
        .success()
        .stdout(predicate::str::diff(
            "Selected psu `psu-9000` does not exist in the catalog\n",
        ));
}

#[test]
fn test_cli_check_github_output() {
    let mut cmd = rigcheck_cli();

    cmd.arg("check")
        .arg(request("incompatible_build.json"))
        .arg("--format")
        .arg("github");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("::error title=power_budget::"));
}

#[test]
fn test_cli_check_margin_override() {
    let mut cmd = rigcheck_cli();

    cmd.arg("check")
        .arg(request("incompatible_build.json"))
        .arg("--margin")
        .arg("0")
        .arg("--format")
        .arg("plain");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("558W exceeds the 450W PSU limit of 450W"));
}

#[test]
fn test_cli_check_disable_rule() {
    let mut cmd = rigcheck_cli();

    cmd.arg("check")
        .arg(request("incompatible_build.json"))
        .arg("--disable")
        .arg("socket_match")
        .arg("--format")
        .arg("github");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("socket_match").not());
}

#[test]
fn test_cli_check_from_stdin() {
    let mut cmd = rigcheck_cli();

    cmd.arg("check")
        .arg("-")
        .arg("--format")
        .arg("plain")
        .write_stdin(r#"{"cpu":"cpu-r5-7600x","motherboard":"mb-z790-atx"}"#);

    cmd.assert().success().stdout(predicate::str::contains(
        "CPU socket AM5 is incompatible with motherboard socket LGA1700",
    ));
}

#[test]
fn test_cli_check_unknown_category() {
    let mut cmd = rigcheck_cli();

    cmd.arg("check").arg(request("unknown_category.json"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown category: monitor"));
}

#[test]
fn test_cli_check_nonexistent_file() {
    let mut cmd = rigcheck_cli();

    cmd.arg("check").arg("does_not_exist.json");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_check_with_catalog_dir() {
    let mut cmd = rigcheck_cli();
    let dir = tempfile::tempdir().unwrap();
    let req = dir.path().join("request.json");
    std::fs::write(&req, r#"{"cpu":"cpu-am5","motherboard":"mb-lga1700"}"#).unwrap();

    cmd.arg("check")
        .arg(&req)
        .arg("--catalog")
        .arg(fixtures_dir().join("catalog"))
        .arg("--format")
        .arg("plain");

    cmd.assert().success().stdout(predicate::str::contains(
        "CPU socket AM5 is incompatible with motherboard socket LGA1700",
    ));
}

#[test]
fn test_cli_check_with_config_file() {
    let mut cmd = rigcheck_cli();
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("rigcheck.json");
    let catalog = fixtures_dir().join("catalog");
    std::fs::write(
        &config,
        serde_json::json!({
            "catalog_dir": catalog,
            "power_margin_watts": 0,
        })
        .to_string(),
    )
    .unwrap();
    let req = dir.path().join("request.json");
    std::fs::write(&req, r#"{"cpu":"cpu-am5","gpu":"gpu-400w","psu":"psu-600"}"#).unwrap();

    cmd.arg("check")
        .arg(&req)
        .arg("--config")
        .arg(&config)
        .arg("--fail-on-incompatible");

    cmd.assert().success();
}

#[test]
fn test_cli_rules_command() {
    let mut cmd = rigcheck_cli();

    cmd.arg("rules");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("socket_match"))
        .stdout(predicate::str::contains("power_budget"));
}

#[test]
fn test_cli_rules_details_from_file() {
    let mut cmd = rigcheck_cli();

    cmd.arg("rules")
        .arg("--rules")
        .arg(fixtures_dir().join("rules").join("clearance_only.json"))
        .arg("--details");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("gpu_fits_case"))
        .stdout(predicate::str::contains("cooler_fits_case [disabled]"))
        .stdout(predicate::str::contains("Check: max_dimension on case, gpu"));
}

#[test]
fn test_cli_schema_command() {
    let mut cmd = rigcheck_cli();

    cmd.arg("schema");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("memory_type: string_list"))
        .stdout(predicate::str::contains("wattage: integer"));
}

#[test]
fn test_cli_catalog_command() {
    let mut cmd = rigcheck_cli();

    cmd.arg("catalog").arg("psu");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("psu-650"))
        .stdout(predicate::str::contains("wattage=650"));
}

#[test]
fn test_cli_catalog_unknown_category() {
    let mut cmd = rigcheck_cli();

    cmd.arg("catalog").arg("monitor");

    cmd.assert().failure();
}

#[test]
fn test_cli_info_command() {
    let mut cmd = rigcheck_cli();

    cmd.arg("info").arg("--catalog").arg(fixtures_dir().join("catalog"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Snapshot:"))
        .stdout(predicate::str::contains("2 invalid"));
}
