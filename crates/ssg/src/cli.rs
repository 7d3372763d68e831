//! Command line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use vite_ssg_core::{ScriptMode, SsgOptions};

/// Static-site generation for Vite applications
#[derive(Debug, Parser)]
#[command(name = "vite-ssg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build SSG
    Build(BuildArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    /// Rewrites script loading timing
    #[arg(long, value_enum)]
    pub script: Option<ScriptArg>,

    /// Mock browser globals (window, document, etc.) for SSG
    #[arg(long)]
    pub mock: bool,

    /// The vite config file to use
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// The base path to render
    #[arg(long, short)]
    pub base: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScriptArg {
    Sync,
    Async,
    Defer,
    #[value(name = "async defer")]
    AsyncDefer,
}

impl From<ScriptArg> for ScriptMode {
    fn from(arg: ScriptArg) -> Self {
        match arg {
            ScriptArg::Sync => Self::Sync,
            ScriptArg::Async => Self::Async,
            ScriptArg::Defer => Self::Defer,
            ScriptArg::AsyncDefer => Self::AsyncDefer,
        }
    }
}

impl BuildArgs {
    /// Caller options; flags that were not given leave the host config in charge.
    pub fn to_options(&self) -> SsgOptions {
        SsgOptions {
            script: self.script.map(ScriptMode::from),
            mock: self.mock.then_some(true),
            base: self.base.clone(),
            ..Default::default()
        }
    }
}
