//! Persistence and discovery for biosis: the configuration file, unit
//! manifests under the user root, and on-demand address resolution.

pub mod config;
pub mod environment;
pub mod error;
pub mod loader;
pub mod resolver;
pub mod unit;

pub use config::{CONFIG_VARIABLES, ConfigStore, default_base_dir};
pub use environment::{driver_program, user_root};
pub use error::{Result, StoreError};
pub use loader::{COMPILERS_DIR, Unit, discover, load_all, load_unit, read_unit, unit_file};
pub use resolver::UnitResolver;
pub use unit::UnitManifest;
