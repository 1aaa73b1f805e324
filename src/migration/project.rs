//! Migration project file and bootstrap steps.
//!
//! `init` writes the project file (`hatchling.toml` by default) and creates the
//! migration location. `init-db` then creates the per-app directory below the
//! location and generates the registered schemas. Every later step requires
//! both to have run.

use crate::database::Database;
use crate::error::HatchError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROJECT_FILE: &str = "hatchling.toml";
pub const DEFAULT_LOCATION: &str = "./migrations";
pub const DEFAULT_SRC_FOLDER: &str = "./";

/// The `[hatchling]` section of the project file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub location: String,
    pub src_folder: String,
    pub app: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProjectFile {
    hatchling: ProjectConfig,
}

impl ProjectConfig {
    /// Directory holding the migrations of `app`
    pub fn app_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.location).join(&self.app)
    }
}

/// Express `src_folder` relative to `cwd` with an explicit `./` prefix
///
/// ```rust
/// use std::path::Path;
/// use hatchling::migration::project::normalize_src_folder;
///
/// assert_eq!(normalize_src_folder("src", Path::new("/work")), "./src");
/// assert_eq!(normalize_src_folder("./", Path::new("/work")), "./");
/// assert_eq!(normalize_src_folder("/work/app/src", Path::new("/work")), "./app/src");
/// ```
pub fn normalize_src_folder(src_folder: &str, cwd: &Path) -> String {
    let path = Path::new(src_folder);
    let mut folder = if path.is_absolute() {
        pathdiff::diff_paths(path, cwd)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| src_folder.to_string())
    } else {
        src_folder.to_string()
    };
    if folder.is_empty() {
        folder.push('.');
    }
    if !folder.starts_with("./") {
        if folder == "." {
            folder = "./".to_string();
        } else {
            folder = format!("./{folder}");
        }
    }
    folder
}

/// Write the project file and create the migration location under `cwd`
///
/// # Errors
///
/// `HatchError::Usage("Configuration file already created")` if the project
/// file exists; I/O errors otherwise.
pub fn init_project(
    project_file: &Path,
    location: &str,
    src_folder: &str,
    app: &str,
    cwd: &Path,
) -> Result<ProjectConfig, HatchError> {
    let file = cwd.join(project_file);
    if file.exists() {
        return Err(HatchError::Usage("Configuration file already created".to_string()));
    }

    let config = ProjectConfig {
        location: location.to_string(),
        src_folder: normalize_src_folder(src_folder, cwd),
        app: app.to_string(),
    };
    let contents = toml::to_string_pretty(&ProjectFile {
        hatchling: config.clone(),
    })?;
    fs::write(&file, contents)?;
    fs::create_dir_all(cwd.join(location))?;

    log::info!("created migrate folder {location} and config file {}", file.display());
    Ok(config)
}

/// Read the project file
///
/// # Errors
///
/// `HatchError::Usage("You must exec init first")` if it does not exist.
pub fn load_project(project_file: &Path, cwd: &Path) -> Result<ProjectConfig, HatchError> {
    let file = cwd.join(project_file);
    if !file.exists() {
        return Err(HatchError::Usage("You must exec init first".to_string()));
    }
    let parsed: ProjectFile = toml::from_str(&fs::read_to_string(&file)?)?;
    Ok(parsed.hatchling)
}

/// Create `<location>/<app>` and generate the registered schemas
pub fn init_db(project: &ProjectConfig, cwd: &Path, db: &Database) -> Result<PathBuf, HatchError> {
    let dir = project.app_dir(cwd);
    if dir.exists() {
        return Err(HatchError::Usage(format!(
            "Inited {} already, or delete {} and try again",
            project.app,
            dir.display()
        )));
    }
    fs::create_dir_all(&dir)?;
    db.generate_schemas()?;
    log::info!("initialised app {} in {}", project.app, dir.display());
    Ok(dir)
}

/// Fail unless `init-db` has run for the project's app
pub fn require_db_initialised(project: &ProjectConfig, cwd: &Path) -> Result<(), HatchError> {
    if project.app_dir(cwd).exists() {
        Ok(())
    } else {
        Err(HatchError::Usage("You must exec init-db first".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::memory::MemoryStore;
    use crate::schema::{Column, EntitySchema, SchemaRegistry};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn project_file() -> &'static Path {
        Path::new(DEFAULT_PROJECT_FILE)
    }

    #[test]
    fn test_init_writes_project_file() {
        let dir = TempDir::new().unwrap();
        let config = init_project(project_file(), DEFAULT_LOCATION, "src", "models", dir.path()).unwrap();
        assert_eq!(config.src_folder, "./src");
        assert!(dir.path().join("migrations").is_dir());

        let written = fs::read_to_string(dir.path().join(DEFAULT_PROJECT_FILE)).unwrap();
        assert!(written.contains("[hatchling]"), "{written}");
        assert_eq!(load_project(project_file(), dir.path()).unwrap(), config);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        init_project(project_file(), DEFAULT_LOCATION, DEFAULT_SRC_FOLDER, "models", dir.path()).unwrap();
        let err = init_project(project_file(), "./other", DEFAULT_SRC_FOLDER, "models", dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "Configuration file already created");
        assert!(!dir.path().join("other").exists());
    }

    #[test]
    fn test_load_requires_init() {
        let dir = TempDir::new().unwrap();
        let err = load_project(project_file(), dir.path()).unwrap_err();
        assert!(matches!(err, HatchError::Usage(ref m) if m == "You must exec init first"));
    }

    #[test]
    fn test_init_db_creates_app_dir_and_tables() {
        let dir = TempDir::new().unwrap();
        let project = init_project(project_file(), DEFAULT_LOCATION, DEFAULT_SRC_FOLDER, "models", dir.path()).unwrap();
        assert!(require_db_initialised(&project, dir.path()).is_err());

        let store = Arc::new(MemoryStore::new());
        let mut registry = SchemaRegistry::new();
        registry.add(EntitySchema::new("posts").column(Column::primary_key("id")));
        let db = Database::init(&DatabaseConfig::default(), registry, store.clone()).unwrap();

        let app_dir = init_db(&project, dir.path(), &db).unwrap();
        assert!(app_dir.ends_with("migrations/models"));
        assert!(store.has_table("posts"));
        assert!(require_db_initialised(&project, dir.path()).is_ok());
        assert!(matches!(init_db(&project, dir.path(), &db), Err(HatchError::Usage(_))));
    }
}
