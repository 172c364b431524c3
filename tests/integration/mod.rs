//! End-to-end tests of the `remapgen` binary.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! Every test runs in its own temporary directory with the per-user
//! configuration directory pointed inside it.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use remapgen_cli::test_utils::{property_yaml, write_property};
use tempfile::TempDir;

const WWW: &str = "name: www\n\
options:\n\
\x20 parent_child: true\n\
\x20 receipt: true\n\
mappings:\n\
\x20 - from: [www.example.com]\n\
\x20   to: http://origin.example.com\n\
\x20   schemes: [http, https]\n\
\x20   options:\n\
\x20     allow_ip: [10.0.0.0-10.255.255.255]\n\
\x20     compress: true\n";

fn remapgen(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("remapgen").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("REMAPGEN_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn compile_writes_remap_and_side_files() {
    let temp = TempDir::new().unwrap();
    write_property(temp.path(), "properties/www.yaml", WWW);

    remapgen(temp.path())
        .args(["compile", "properties", "-o", "build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled 1 property"));

    let build = temp.path().join("build");
    let remap = read(&build.join("remap.config"));
    assert_eq!(
        remap,
        "# property: www\n\
         map http://www.example.com http://origin.example.com \
         @plugin=header_rewrite.so @pparam=www_header_rewrite.config \
         @plugin=compress.so @pparam=www_compress.config \
         @src_ip=10.0.0.0-10.255.255.255 @action=allow\n\
         map https://www.example.com http://origin.example.com \
         @plugin=header_rewrite.so @pparam=www_header_rewrite.config \
         @plugin=compress.so @pparam=www_compress.config \
         @src_ip=10.0.0.0-10.255.255.255 @action=allow\n"
    );

    let parent = read(&build.join("parent_remap.config"));
    assert!(parent.contains("@pparam=www_header_rewrite_parent.config"));
    assert!(!parent.contains("compress.so"));

    assert_eq!(read(&build.join("www_compress.config")), "enabled true\ncache true\n");
    assert!(read(&build.join("www_header_rewrite.config")).contains("set-header X-Receipt \"www\""));
    assert!(build.join("www_header_rewrite_parent.config").exists());
}

#[test]
fn compile_uses_configured_output_dir_and_roles() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("remapgen.toml"),
        "output_dir = \"configured\"\nremap_file = \"edge_remap.config\"\n",
    )
    .unwrap();
    let yaml = property_yaml("api", "api.example.com", "{debug_headers: [X-Cache]}");
    write_property(temp.path(), "api.yaml", &yaml);

    remapgen(temp.path())
        .args(["compile", "api.yaml", "--roles", "roles_debug,roles_edge"])
        .assert()
        .success();

    let remap = read(&temp.path().join("configured").join("edge_remap.config"));
    assert!(remap.contains(
        "map http://api.example.com http://origin.example.com @plugin=xdebug.so @pparam=--enable=x-cache\n"
    ));
    assert!(!remap.contains("{%"));
}

#[test]
fn compile_keeps_role_blocks_without_roles() {
    let temp = TempDir::new().unwrap();
    let yaml = property_yaml("api", "api.example.com", "{debug_headers: [X-Cache]}");
    write_property(temp.path(), "api.yaml", &yaml);

    remapgen(temp.path())
        .args(["compile", "api.yaml"])
        .assert()
        .success();

    let remap = read(&temp.path().join("out").join("remap.config"));
    assert!(remap.contains("{% if \"roles_debug\" in roles %}"));
    assert!(
        remap
            .lines()
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .all(|line| line.starts_with("map "))
    );
}

#[test]
fn unknown_option_fails_without_output() {
    let temp = TempDir::new().unwrap();
    let yaml = property_yaml("www", "www.example.com", "{alow_ip: [10.0.0.1]}");
    write_property(temp.path(), "www.yaml", &yaml);

    remapgen(temp.path())
        .args(["compile", "www.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("alow_ip"))
        .stderr(predicate::str::contains("allow_ip"))
        .stderr(predicate::str::contains("remapgen plugins"));

    assert!(!temp.path().join("out").exists());
}

#[test]
fn several_failing_files_are_all_reported() {
    let temp = TempDir::new().unwrap();
    write_property(temp.path(), "a.yaml", "name: [");
    write_property(
        temp.path(),
        "b.yaml",
        &property_yaml("b", "b.example.com", "{regex_remap: [{match: '(', to: 'http://o'}]}"),
    );
    write_property(temp.path(), "c.yaml", WWW);

    remapgen(temp.path())
        .args(["check", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("a.yaml"))
        .stderr(predicate::str::contains("regex_remap"))
        .stderr(predicate::str::contains("2 of 3 property file(s) failed to compile"));
}

#[test]
fn check_reports_each_property() {
    let temp = TempDir::new().unwrap();
    write_property(temp.path(), "www.yaml", WWW);

    remapgen(temp.path())
        .args(["check", "www.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("www (2 target(s), 5 rule(s))"));

    assert!(!temp.path().join("out").exists());
}

#[test]
fn check_json_lists_rules() {
    let temp = TempDir::new().unwrap();
    write_property(temp.path(), "www.yaml", WWW);

    let output = remapgen(temp.path())
        .args(["check", "www.yaml", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let targets = json[0]["targets"].as_array().unwrap();
    assert_eq!(targets[0]["location"], "child");
    assert_eq!(targets[1]["location"], "parent");
    assert_eq!(targets[0]["rules"][0]["plugin_type"], "header_rewrite");
}

#[test]
fn plugins_lists_options() {
    let temp = TempDir::new().unwrap();

    remapgen(temp.path())
        .arg("plugins")
        .assert()
        .success()
        .stdout(predicate::str::contains("allow_ip"))
        .stdout(predicate::str::contains("options: allow_ip, ip_allow"));

    let output = remapgen(temp.path())
        .args(["plugins", "--format", "json"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let compress = json
        .as_array()
        .unwrap()
        .iter()
        .find(|plugin| plugin["type"] == "compress")
        .unwrap();
    assert_eq!(compress["library"], "compress.so");
    assert_eq!(compress["locations"][0], "child");
}

#[test]
fn disabled_plugin_from_config() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("strict.toml");
    std::fs::write(&config, "disabled_plugins = [\"compress\"]\n").unwrap();
    write_property(temp.path(), "www.yaml", WWW);

    remapgen(temp.path())
        .args(["--config", "strict.toml", "compile", "www.yaml"])
        .assert()
        .success();

    let remap = read(&temp.path().join("out").join("remap.config"));
    assert!(!remap.contains("compress.so"));
    assert!(!temp.path().join("out").join("www_compress.config").exists());
}

#[test]
fn missing_explicit_config_is_an_error() {
    let temp = TempDir::new().unwrap();

    remapgen(temp.path())
        .args(["--config", "nope.toml", "plugins"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn duplicate_mapping_rejected() {
    let temp = TempDir::new().unwrap();
    write_property(
        temp.path(),
        "dup.yaml",
        "name: dup\n\
         mappings:\n\
         \x20 - {from: [a.example.com], to: 'http://o1'}\n\
         \x20 - {from: [a.example.com], to: 'http://o2'}\n",
    );

    remapgen(temp.path())
        .args(["compile", "dup.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http://a.example.com"));
}
