//! The bundler contract used by the build pipeline.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use vite_ssg_core::{ModuleFormat, SsgOptions};

use crate::error::Result;

/// Inputs for resolving the host build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub root: PathBuf,
    pub config_file: Option<PathBuf>,
    pub mode: String,
    pub node_env: String,
}

/// The host configuration as far as the pipeline cares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    pub root: PathBuf,
    /// Absolute output directory.
    pub out_dir: PathBuf,
    pub mode: String,
    pub config_file: Option<PathBuf>,
    /// Options declared under `ssgOptions` in the host config.
    pub ssg_options: SsgOptions,
}

impl ResolvedConfig {
    /// Output directory as shown in logs, relative to the root when possible.
    pub fn out_dir_display(&self) -> String {
        self.out_dir
            .strip_prefix(&self.root)
            .unwrap_or(&self.out_dir)
            .display()
            .to_string()
    }
}

/// One bundler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildTarget {
    /// Browser build of the shell template into the output directory.
    Client {
        name: String,
        template: PathBuf,
        base: Option<String>,
        mode: String,
    },
    /// Single-file server build of `entry` into `out_dir`.
    Server {
        entry: PathBuf,
        out_dir: PathBuf,
        format: ModuleFormat,
        base: Option<String>,
        mode: String,
    },
}

impl BuildTarget {
    /// Where a server build writes its module: `<out_dir>/<entry stem><ext>`.
    pub fn server_output(entry: &Path, out_dir: &Path, format: ModuleFormat) -> PathBuf {
        let stem = entry
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "entry".to_string());
        out_dir.join(format!("{stem}{}", format.extension()))
    }

    /// Value of the `VITE_SSG` variable seen by the bundler for this pass.
    pub fn ssg_flag(&self) -> &'static str {
        match self {
            Self::Client { .. } => "false",
            Self::Server { .. } => "true",
        }
    }
}

#[async_trait]
pub trait Bundler: Send + Sync {
    /// Resolve the host configuration for a production build.
    async fn resolve_config(&self, request: &ResolveRequest) -> Result<ResolvedConfig>;

    /// Run one build.
    async fn build(&self, config: &ResolvedConfig, target: &BuildTarget) -> Result<()>;

    /// Resolve `id` through the host's alias and resolution rules.
    async fn resolve_id(&self, config: &ResolvedConfig, id: &str) -> Result<Option<PathBuf>>;
}
