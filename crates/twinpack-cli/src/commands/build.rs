//! The build command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use twinpack_bundler::{NativeRuntime, Pipeline, ProjectConfig, RolldownEngine, Runtime};

use crate::cli::Cli;
use crate::config::load_project;
use crate::error::{Result, ResultExt};
use crate::ui;

/// Execute the build.
///
/// 1. Resolve the project directory (`--cwd` or the working directory)
/// 2. Load configuration (env > file > defaults)
/// 3. Run the pipeline with the parsed flags
///
/// Without `--watch` this returns once both bundles are written and the
/// contexts are disposed. With `--watch` it only returns on error.
pub async fn execute(args: Cli) -> Result<()> {
    let start_time = Instant::now();
    let flags = args.flags();

    let cwd = project_dir(&args)?;
    let project = load_project(&cwd, args.config.as_deref())?;
    let outputs = output_paths(&project);

    let runtime: Arc<dyn Runtime> = Arc::new(NativeRuntime::new(project.root.clone()));
    let engine = RolldownEngine::new(Arc::clone(&runtime));
    let pipeline = Pipeline::new(project, runtime);

    if flags.watch && !args.quiet {
        ui::info("Building and watching for changes...");
    }
    tracing::debug!(minify = flags.minify, watch = flags.watch, "starting pipeline");

    pipeline.run(&engine, flags).await?;

    if !args.quiet {
        ui::success(&format!(
            "Built {} in {}",
            outputs.join(", "),
            ui::format_duration(start_time.elapsed())
        ));
    }
    Ok(())
}

fn project_dir(args: &Cli) -> Result<PathBuf> {
    let dir = match &args.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    std::fs::canonicalize(&dir).with_path(&dir)
}

fn output_paths(project: &ProjectConfig) -> Vec<String> {
    [
        &project.outputs.legacy,
        &project.outputs.modern,
        &project.types.destination,
    ]
    .iter()
    .map(|path| path.display().to_string())
    .collect()
}
