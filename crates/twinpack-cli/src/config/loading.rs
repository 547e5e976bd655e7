use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use path_clean::PathClean;

use super::{ProjectConfig, CONFIG_FILE, ENV_PREFIX};
use crate::error::{ConfigError, Result};

/// Layer defaults, the config file and the environment.
///
/// `cwd` is the project directory. An explicit `config_path` is resolved
/// against it and must exist; the default file is optional.
pub fn project_figment(cwd: &Path, config_path: Option<&Path>) -> Result<Figment> {
    let config_file = match config_path {
        Some(path) => {
            let path = cwd.join(path);
            if !path.is_file() {
                return Err(ConfigError::NotFound(path).into());
            }
            path
        }
        None => cwd.join(CONFIG_FILE),
    };

    Ok(Figment::new()
        .merge(Serialized::defaults(ProjectConfig::default()))
        .merge(Json::file(config_file))
        .merge(Env::prefixed(ENV_PREFIX).split("__")))
}

/// Load the project configuration with its root made absolute.
pub fn load_project(cwd: &Path, config_path: Option<&Path>) -> Result<ProjectConfig> {
    let mut project: ProjectConfig = project_figment(cwd, config_path)?
        .extract()
        .map_err(ConfigError::from)?;

    project.root = absolute_root(cwd, &project.root);
    tracing::debug!(root = %project.root.display(), "loaded project configuration");
    Ok(project)
}

fn absolute_root(cwd: &Path, root: &Path) -> PathBuf {
    if root.is_absolute() {
        root.to_path_buf().clean()
    } else {
        cwd.join(root).clean()
    }
}
