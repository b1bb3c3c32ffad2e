//! cogtask-loaders — Resource loader implementations.
//!
//! Implements the `ResourceLoader` trait over an in-memory table and the
//! file system, letting assessments resolve against packaged or on-disk
//! resource bundles.

pub mod config;
pub mod file_system;
pub mod memory;

pub use config::{create_loader, load_config, LoaderConfig, ResolveConfig};
pub use file_system::FileSystemLoader;
pub use memory::InMemoryLoader;
