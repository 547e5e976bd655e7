//! End-to-end builds through Rolldown on a throwaway project.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use twinpack_bundler::{
    BuildContext, BuildFlags, Engine, NativeRuntime, Phase, Pipeline, ProjectConfig, RolldownEngine,
};

const PRELUDE: &str = "import {createRequire} from 'module';\n";

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
    std::fs::write(path, content).expect("write file");
}

fn create_project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
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
function needsLeadingSpace(lines, loc, newLines) { return lines > 0; }
function needsTrailingSpace(lines, loc, newLines) { return newLines > 0; }
function reprint(oldNode, lines, newLines) {
    var nls = needsLeadingSpace(lines, oldNode.loc, newLines);
    var nts = needsTrailingSpace(lines, oldNode.loc, newLines);
    return [nls, nts];
}
exports.reprint = reprint;
"#,
    );
    write(
        root,
        "src/index.cjs",
        "const { reprint } = require('recast/lib/patcher.js');\nmodule.exports = { reprint, modern: __IS_PRETTIER_3__ };\n",
    );
    write(
        root,
        "src/index.mjs",
        "import { reprint } from 'recast/lib/patcher.js';\nexport const modern = __IS_PRETTIER_3__;\nexport { reprint };\n",
    );
    write(root, "src/index.d.ts", "export declare const modern: boolean;\n");

    dir
}

fn pipeline(dir: &TempDir) -> Pipeline {
    let project = ProjectConfig {
        root: dir.path().to_path_buf(),
        ..ProjectConfig::default()
    };
    Pipeline::new(project, Arc::new(NativeRuntime::new(dir.path())))
}

#[tokio::test]
async fn builds_both_targets() {
    let dir = create_project();
    let engine = RolldownEngine::new(Arc::new(NativeRuntime::new(dir.path())));

    pipeline(&dir)
        .run(&engine, BuildFlags::default())
        .await
        .expect("build should succeed");

    let cjs = std::fs::read_to_string(dir.path().join("dist/index.js")).expect("cjs output");
    let esm = std::fs::read_to_string(dir.path().join("dist/index.mjs")).expect("esm output");
    let dts = std::fs::read_to_string(dir.path().join("dist/index.d.ts")).expect("d.ts output");

    // recast patch applied in both bundles
    assert!(cjs.contains("TemplateElement"), "cjs output:\n{cjs}");
    assert!(esm.contains("TemplateElement"), "esm output:\n{esm}");

    // define substituted
    assert!(!cjs.contains("__IS_PRETTIER_3__"));
    assert!(!esm.contains("__IS_PRETTIER_3__"));

    // only the ESM output gets the createRequire prelude
    assert!(esm.starts_with(PRELUDE));
    assert!(!cjs.contains("import {createRequire}"));

    assert_eq!(dts, "export declare const modern: boolean;\n");
}

#[tokio::test]
async fn rebuild_does_not_duplicate_prelude() {
    let dir = create_project();
    let engine = RolldownEngine::new(Arc::new(NativeRuntime::new(dir.path())));
    let targets = pipeline(&dir).targets(BuildFlags::default()).unwrap();
    let esm_config = targets
        .into_iter()
        .find(|t| t.name == "esm")
        .expect("esm target");

    let context = engine.create_context(esm_config).await.unwrap();
    context.rebuild().await.unwrap();
    context.rebuild().await.unwrap();
    context.dispose().await.unwrap();

    let esm = std::fs::read_to_string(dir.path().join("dist/index.mjs")).unwrap();
    assert_eq!(esm.matches(PRELUDE).count(), 1);
}

/// Bundle a CommonJS dependency that requires an external at call time.
fn add_dynamic_require(root: &Path) {
    write(
        root,
        "dep/index.js",
        "exports.loadPrettier = function () { return require('prettier'); };\n",
    );
    write(
        root,
        "src/index.mjs",
        "import { loadPrettier } from '../dep/index.js';\nexport const modern = __IS_PRETTIER_3__;\nexport { loadPrettier };\n",
    );
}

fn create_require_imports(code: &str) -> usize {
    code.lines()
        .filter(|line| line.trim_start().starts_with("import") && line.contains("createRequire"))
        .count()
}

#[tokio::test]
async fn dynamic_require_output_binds_create_require_once() {
    let dir = create_project();
    add_dynamic_require(dir.path());
    let engine = RolldownEngine::new(Arc::new(NativeRuntime::new(dir.path())));

    pipeline(&dir)
        .run(&engine, BuildFlags::default())
        .await
        .expect("build should succeed");

    let esm = std::fs::read_to_string(dir.path().join("dist/index.mjs")).unwrap();
    assert_eq!(create_require_imports(&esm), 1, "esm output:\n{esm}");
    assert!(!esm.contains("is not supported"), "esm output:\n{esm}");
    assert!(!esm.contains("doesn't expose"), "esm output:\n{esm}");

    // A rebuild keeps a single binding.
    let targets = pipeline(&dir).targets(BuildFlags::default()).unwrap();
    let esm_config = targets.into_iter().find(|t| t.name == "esm").unwrap();
    let context = engine.create_context(esm_config).await.unwrap();
    context.rebuild().await.unwrap();
    context.dispose().await.unwrap();
    let rebuilt = std::fs::read_to_string(dir.path().join("dist/index.mjs")).unwrap();
    assert_eq!(create_require_imports(&rebuilt), 1, "esm output:\n{rebuilt}");
}

#[tokio::test]
async fn dynamic_require_output_loads_in_node() {
    let dir = create_project();
    add_dynamic_require(dir.path());
    let engine = RolldownEngine::new(Arc::new(NativeRuntime::new(dir.path())));

    pipeline(&dir)
        .run(&engine, BuildFlags::default())
        .await
        .expect("build should succeed");

    let Ok(output) = std::process::Command::new("node")
        .arg(dir.path().join("dist/index.mjs"))
        .output()
    else {
        eprintln!("node not available, skipping load check");
        return;
    };
    assert!(
        output.status.success(),
        "node failed to load the bundle:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[tokio::test]
async fn syntax_error_is_a_build_error() {
    let dir = create_project();
    write(dir.path(), "src/index.mjs", "export const = ;\n");
    let engine = RolldownEngine::new(Arc::new(NativeRuntime::new(dir.path())));

    let err = pipeline(&dir)
        .run(&engine, BuildFlags::default())
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Build));
    assert!(err.to_string().contains("esm"), "{err}");
}
