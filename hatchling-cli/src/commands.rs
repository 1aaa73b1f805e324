//! Command implementations, kept apart from argument parsing so they can be
//! driven from tests.

use crate::posts;
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use hatchling::migration::{self, ProjectConfig};
use hatchling::{Database, MemoryStore, Settings};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Storage the CLI works against: settings plus an in-process store
pub struct Workspace {
    pub settings: Settings,
    pub store: Arc<MemoryStore>,
    pub db: Database,
}

impl Workspace {
    pub fn open(settings: Settings) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let db = Database::init(&settings.database, posts::registry(), store.clone())
            .context("failed to initialise the database")?;
        Ok(Self { settings, store, db })
    }
}

pub fn init(
    cwd: &Path,
    project_file: &Path,
    location: &str,
    src_folder: &str,
    app: &str,
    out: &mut impl Write,
) -> Result<ProjectConfig> {
    let project = migration::init_project(project_file, location, src_folder, app, cwd)?;
    writeln!(
        out,
        "{} {}",
        "Successfully created the migrate folder:".green(),
        project.location
    )?;
    writeln!(
        out,
        "{} {}",
        "Successfully generated the config file:".green(),
        project_file.display()
    )?;
    Ok(project)
}

pub fn init_db(
    cwd: &Path,
    project_file: &Path,
    workspace: &Workspace,
    out: &mut impl Write,
) -> Result<()> {
    let project = migration::load_project(project_file, cwd)?;
    let dir = migration::init_db(&project, cwd, &workspace.db)?;
    writeln!(
        out,
        "{} {}",
        "Successfully created app migrate location".green(),
        dir.display()
    )?;
    for schema in workspace.db.registry().schemas() {
        writeln!(out, "  {} {}", "✓".green(), schema.table())?;
    }
    Ok(())
}

/// Print the CREATE TABLE statements and apply them
pub fn generate_schemas(
    cwd: &Path,
    project_file: &Path,
    workspace: &Workspace,
    out: &mut impl Write,
) -> Result<()> {
    let project = migration::load_project(project_file, cwd)?;
    migration::require_db_initialised(&project, cwd)?;

    let dialect = workspace.db.dialect();
    for sql in workspace.db.registry().create_sql(dialect) {
        writeln!(out, "{sql};")?;
    }
    workspace.db.generate_schemas()?;
    writeln!(out, "{}", "Schemas generated".green())?;
    Ok(())
}

/// Seed the demo data and block serving HTTP
pub fn serve(workspace: Workspace, addr: Option<String>, seed: u64) -> Result<()> {
    may::config().set_workers(workspace.settings.server.workers);
    workspace.db.generate_schemas()?;
    posts::seed(&workspace.store, seed);

    let addr = addr.unwrap_or_else(|| workspace.settings.server.addr.clone());
    let handle = posts::app(workspace.db.clone())
        .serve(&addr)
        .with_context(|| format!("failed to start server on {addr}"))?;
    println!("{} http://{addr}/posts", "Serving".green().bold());
    handle
        .join()
        .map_err(|e| anyhow!("server encountered an error: {e:?}"))?;
    workspace.db.close();
    Ok(())
}
