//! End-to-end tests for the `twinpack` binary.

#![allow(deprecated)] // assert_cmd::Command::cargo_bin

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn create_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "node_modules/recast/package.json",
        r#"{ "name": "recast", "version": "0.23.9", "main": "lib/patcher.js" }"#,
    );
    write(
        root,
        "node_modules/recast/lib/patcher.js",
        r#""use strict";
function reprint(oldNode, lines, newLines) {
    var nls = needsLeadingSpace(lines, oldNode.loc, newLines);
    var nts = needsTrailingSpace(lines, oldNode.loc, newLines);
    return [nls, nts];
}
function needsLeadingSpace() { return true; }
function needsTrailingSpace() { return true; }
exports.reprint = reprint;
"#,
    );
    write(
        root,
        "src/index.cjs",
        "module.exports = { modern: __IS_PRETTIER_3__, reprint: require('recast/lib/patcher.js').reprint };\n",
    );
    write(
        root,
        "src/index.mjs",
        "import { reprint } from 'recast/lib/patcher.js';\nexport const modern = __IS_PRETTIER_3__;\nexport { reprint };\n",
    );
    write(root, "src/index.d.ts", "export declare const modern: boolean;\n");

    dir
}

fn twinpack() -> Command {
    let mut cmd = Command::cargo_bin("twinpack").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_flags() {
    twinpack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--minify"))
        .stdout(predicate::str::contains("--watch"));
}

#[test]
fn test_version() {
    twinpack()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_builds_both_targets() {
    let project = create_project();

    twinpack()
        .current_dir(project.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("dist/index.mjs"));

    let root = project.path();
    assert!(root.join("dist/index.js").exists());
    assert!(root.join("dist/index.d.ts").exists());
    let esm = std::fs::read_to_string(root.join("dist/index.mjs")).unwrap();
    assert!(esm.starts_with("import {createRequire} from 'module';\n"));
}

#[test]
fn test_unknown_arguments_are_ignored() {
    let project = create_project();

    twinpack()
        .current_dir(project.path())
        .args(["--sourcemap", "build", "--minify", "--frobnicate=3"])
        .assert()
        .success();

    assert!(project.path().join("dist/index.mjs").exists());
}

#[test]
fn test_cwd_flag_selects_project() {
    let project = create_project();
    let elsewhere = TempDir::new().unwrap();

    twinpack()
        .current_dir(elsewhere.path())
        .arg("--cwd")
        .arg(project.path())
        .assert()
        .success();

    assert!(project.path().join("dist/index.js").exists());
}

#[test]
fn test_missing_entry_fails_in_configuration() {
    let project = create_project();
    std::fs::remove_file(project.path().join("src/index.cjs")).unwrap();

    twinpack()
        .current_dir(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration failed"));

    assert!(!project.path().join("dist").exists());
}

#[test]
fn test_missing_config_file_fails() {
    let project = create_project();

    twinpack()
        .current_dir(project.path())
        .args(["--config", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_config_file_moves_outputs() {
    let project = create_project();
    write(
        project.path(),
        "twinpack.config.json",
        r#"{ "outputs": { "legacy": "lib/index.cjs", "modern": "lib/index.mjs" } }"#,
    );

    twinpack().current_dir(project.path()).assert().success();

    assert!(project.path().join("lib/index.cjs").exists());
    assert!(project.path().join("lib/index.mjs").exists());
    assert!(!project.path().join("dist/index.js").exists());
}
