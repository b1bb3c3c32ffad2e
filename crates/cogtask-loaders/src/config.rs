//! Loader configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cogtask_core::traits::{ResourceContext, ResourceLoader};

use crate::file_system::FileSystemLoader;
use crate::memory::InMemoryLoader;

/// Configuration for a single resource loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LoaderConfig {
    Memory {
        /// Seed resources, reference → UTF-8 payload.
        #[serde(default)]
        resources: HashMap<String, String>,
    },
    FileSystem {
        /// Base directory; may reference environment variables as `${VAR}`.
        base_dir: String,
    },
}

/// Top-level resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Loader configurations keyed by name.
    #[serde(default)]
    pub loaders: HashMap<String, LoaderConfig>,
    /// Loader used when none is named explicitly.
    #[serde(default = "default_loader")]
    pub default_loader: String,
    /// Bundle identifier resolution starts from.
    #[serde(default = "default_bundle")]
    pub default_bundle: String,
    /// Locale resolution starts from.
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

fn default_loader() -> String {
    "files".to_string()
}
fn default_bundle() -> String {
    "main".to_string()
}
fn default_locale() -> String {
    "en".to_string()
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            loaders: HashMap::new(),
            default_loader: default_loader(),
            default_bundle: default_bundle(),
            default_locale: default_locale(),
        }
    }
}

impl ResolveConfig {
    /// The context resolution starts from.
    pub fn base_context(&self) -> ResourceContext {
        ResourceContext::new(self.default_bundle.clone(), self.default_locale.clone())
    }

    /// Build the loader named by `default_loader`.
    pub fn create_default_loader(&self) -> Result<Box<dyn ResourceLoader>> {
        let config = self
            .loaders
            .get(&self.default_loader)
            .with_context(|| format!("loader `{}` is not configured", self.default_loader))?;
        create_loader(config)
    }
}

/// Expand environment variable references like `${VAR_NAME}` in a string.
fn expand_env_vars(input: &str) -> String {
    let mut out = input.to_string();
    while let Some(start) = out.find("${") {
        let Some(offset) = out[start..].find('}') else {
            break;
        };
        let name = out[start + 2..start + offset].to_string();
        let value = std::env::var(&name).unwrap_or_default();
        out.replace_range(start..start + offset + 1, &value);
    }
    out
}

/// Expand env vars in a loader config.
fn expand_loader_config(config: &LoaderConfig) -> LoaderConfig {
    match config {
        LoaderConfig::Memory { resources } => LoaderConfig::Memory {
            resources: resources.clone(),
        },
        LoaderConfig::FileSystem { base_dir } => LoaderConfig::FileSystem {
            base_dir: expand_env_vars(base_dir),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `cogtask.json` in the current directory
/// 2. `~/.config/cogtask/config.json`
///
/// Environment variable overrides: `COGTASK_RESOURCE_DIR` configures the
/// `files` loader, `COGTASK_LOCALE` overrides the default locale.
pub fn load_config() -> Result<ResolveConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ResolveConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("cogtask.json");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.json");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            serde_json::from_str::<ResolveConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ResolveConfig::default(),
    };

    // Apply env var overrides
    if let Ok(dir) = std::env::var("COGTASK_RESOURCE_DIR") {
        config
            .loaders
            .insert("files".into(), LoaderConfig::FileSystem { base_dir: dir });
    }
    if let Ok(locale) = std::env::var("COGTASK_LOCALE") {
        config.default_locale = locale;
    }

    // Expand env vars in all loader configs
    let expanded: HashMap<String, LoaderConfig> = config
        .loaders
        .iter()
        .map(|(k, v)| (k.clone(), expand_loader_config(v)))
        .collect();
    config.loaders = expanded;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("cogtask"))
}

/// Create a loader instance from its configuration.
pub fn create_loader(config: &LoaderConfig) -> Result<Box<dyn ResourceLoader>> {
    match config {
        LoaderConfig::Memory { resources } => {
            let mut loader = InMemoryLoader::new();
            for (reference, payload) in resources {
                loader.insert(reference, payload.as_bytes().to_vec());
            }
            Ok(Box::new(loader))
        }
        LoaderConfig::FileSystem { base_dir } => {
            let base_dir = PathBuf::from(base_dir);
            if !base_dir.is_dir() {
                anyhow::bail!("resource directory not found: {}", base_dir.display());
            }
            Ok(Box::new(FileSystemLoader::new(base_dir)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_env_vars_basic() {
        std::env::set_var("_COGTASK_TEST_VAR", "hello");
        assert_eq!(expand_env_vars("${_COGTASK_TEST_VAR}"), "hello");
        assert_eq!(
            expand_env_vars("prefix_${_COGTASK_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_COGTASK_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = ResolveConfig::default();
        assert_eq!(config.default_loader, "files");
        assert_eq!(config.default_bundle, "main");
        assert_eq!(config.default_locale, "en");
        let context = config.base_context();
        assert_eq!(context.reference_for("logo.png"), "main/logo.png");
    }

    #[test]
    fn parse_loader_config() {
        let json = r#"{
            "loaders": {
                "packaged": {
                    "type": "memory",
                    "resources": {"main/logo.png": "png bytes"}
                },
                "files": {
                    "type": "filesystem",
                    "base_dir": "/tmp/resources"
                }
            },
            "default_loader": "packaged",
            "default_bundle": "org.example.main"
        }"#;
        let config: ResolveConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.loaders.len(), 2);
        assert_eq!(config.default_bundle, "org.example.main");
        assert!(matches!(
            config.loaders.get("packaged"),
            Some(LoaderConfig::Memory { .. })
        ));
    }

    #[test]
    fn create_memory_loader_from_config() {
        let mut resources = HashMap::new();
        resources.insert("main/logo.png".to_string(), "png bytes".to_string());
        let loader = create_loader(&LoaderConfig::Memory { resources }).unwrap();

        assert_eq!(loader.name(), "memory");
        assert_eq!(loader.load("main/logo.png").unwrap(), b"png bytes");
    }

    #[test]
    fn file_system_loader_requires_an_existing_directory() {
        let config = LoaderConfig::FileSystem {
            base_dir: "/no/such/directory".to_string(),
        };
        assert!(create_loader(&config).is_err());
    }

    #[test]
    fn load_config_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cogtask.json");
        std::fs::write(
            &path,
            r#"{"default_bundle": "org.example.main", "default_locale": "de"}"#,
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.default_bundle, "org.example.main");
        assert_eq!(config.default_locale, "de");
        assert!(load_config_from(Some(&dir.path().join("missing.json"))).is_err());
    }
}
