//! Migration project bootstrap.
//!
//! Only the project lifecycle lives here (`init`, `init-db`); schema creation
//! itself is done by [`Database::generate_schemas`](crate::Database::generate_schemas).

pub mod project;

pub use project::{
    init_db, init_project, load_project, normalize_src_folder, require_db_initialised,
    ProjectConfig, DEFAULT_LOCATION, DEFAULT_PROJECT_FILE, DEFAULT_SRC_FOLDER,
};
