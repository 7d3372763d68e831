use std::env;
use std::path::PathBuf;

use crate::error::{BuildError, Result};

/// Tool configuration loaded from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Project root (default: current directory)
    pub root: PathBuf,
    /// Vite config file passed through `--config`
    pub config_file: Option<PathBuf>,
    /// Node binary used for bundler and formatter scripts (default: "node")
    pub node: String,
    /// `NODE_ENV` (default: "production")
    pub node_env: String,
    /// `MODE`, overrides the mode from options
    pub mode: Option<String>,
}

impl ToolConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `NODE_ENV` - Node environment (default: "production")
    /// - `MODE` - Vite mode, takes precedence over the `mode` option
    /// - `VITE_SSG_NODE` - Node binary (default: "node")
    pub fn from_env() -> Result<Self> {
        let root = env::current_dir().map_err(|e| BuildError::io(".", e))?;
        Ok(Self::from_vars(root, |key| env::var(key).ok()))
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_vars(root: PathBuf, var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| var(key).filter(|value| !value.is_empty());
        Self {
            root,
            config_file: None,
            node: non_empty("VITE_SSG_NODE").unwrap_or_else(|| "node".to_string()),
            node_env: non_empty("NODE_ENV").unwrap_or_else(|| "production".to_string()),
            mode: non_empty("MODE"),
        }
    }

    pub fn with_config_file(mut self, config_file: Option<PathBuf>) -> Self {
        self.config_file = config_file.map(|path| {
            if path.is_absolute() {
                path
            } else {
                self.root.join(path)
            }
        });
        self
    }

    /// `MODE`, then the `mode` option, then `NODE_ENV`.
    pub fn effective_mode(&self, option_mode: Option<&str>) -> String {
        self.mode
            .as_deref()
            .or(option_mode)
            .unwrap_or(&self.node_env)
            .to_string()
    }
}
