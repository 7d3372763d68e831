//! Static-site generation for Vite applications.
//!
//! [`Pipeline::run`] builds every page of a project: a client build with the
//! project's Vite config, a single-file server build, a server render in
//! `deno_core`, injection of the rendered markup into the shell document and
//! optional critical CSS, formatting and Liquid block output.
//!
//! # Example
//!
//! ```ignore
//! use vite_ssg::{Pipeline, SsgOptions, ToolConfig};
//!
//! let config = ToolConfig::from_env()?;
//! let report = Pipeline::vite(&config).run(SsgOptions::default(), &config).await?;
//! for page in report.pages {
//!     println!("{} ({} bytes)", page.path.display(), page.bytes);
//! }
//! ```

pub mod bundler;
pub mod cli;
mod config;
mod error;
pub mod hooks;
pub mod liquid;
pub mod node;
pub mod output;
mod pipeline;
pub mod postprocess;
pub mod renderer;
pub mod temp;
pub mod vite;

pub use bundler::{BuildTarget, Bundler, ResolveRequest, ResolvedConfig};
pub use config::ToolConfig;
pub use error::{BuildError, Result};
pub use hooks::{BuildHooks, NoHooks, PageContext};
pub use pipeline::{BuildReport, PageReport, Pipeline};
pub use postprocess::{CriticalCss, HtmlFormatter};
pub use renderer::ServerRenderer;
pub use vite_ssg_core::{
    EntrySpec, Formatting, ModuleFormat, RenderOutput, RenderRequest, ScriptMode, SsgOptions,
};
