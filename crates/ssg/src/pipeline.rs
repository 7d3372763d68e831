//! The build orchestrator.
//!
//! One run resolves the host configuration, clears the output directory,
//! then builds every entry in declaration order: client build, server build,
//! server render, injection, post-processing and writing. Entries never
//! interleave and the private temp directory is removed on every exit path.

use std::path::{Path, PathBuf};

use vite_ssg_core::{
    detect_entry_or_default, inject, rewrite_scripts, server_entry_shim, state_script,
    BuildOptions, EntrySpec, RenderRequest, SsgOptions,
};
use vite_ssg_render::DenoRenderer;

use crate::bundler::{BuildTarget, Bundler, ResolveRequest, ResolvedConfig};
use crate::config::ToolConfig;
use crate::error::{BuildError, Result};
use crate::hooks::{BuildHooks, NoHooks, PageContext};
use crate::liquid::{write_block, write_file, BlockRequest};
use crate::node::NodeRunner;
use crate::output::{aprintln, build_log, format_size, p_b, p_g, page_written, tag};
use crate::postprocess::{
    format_html, serialize_document, BeastiesCriticalCss, CriticalCss, HtmlFormatter,
    NodeFormatter,
};
use crate::renderer::ServerRenderer;
use crate::temp::TempBuildDir;
use crate::vite::ViteBundler;

/// One written page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub name: String,
    pub path: PathBuf,
    pub bytes: usize,
    pub liquid: Option<PathBuf>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub out_dir: PathBuf,
    pub pages: Vec<PageReport>,
}

/// The build pipeline and its collaborators.
pub struct Pipeline {
    bundler: Box<dyn Bundler>,
    renderer: Box<dyn ServerRenderer>,
    formatter: Box<dyn HtmlFormatter>,
    critical_css: Box<dyn CriticalCss>,
    hooks: Box<dyn BuildHooks>,
}

impl Pipeline {
    /// Vite for bundling, deno_core for rendering, node tools for post-processing.
    pub fn vite(config: &ToolConfig) -> Self {
        let node = NodeRunner::new(config.node.clone(), config.root.clone());
        Self {
            bundler: Box::new(ViteBundler::new(node.clone(), config.node_env.clone())),
            renderer: Box::new(DenoRenderer::new()),
            formatter: Box::new(NodeFormatter::new(node.clone())),
            critical_css: Box::new(BeastiesCriticalCss::new(node)),
            hooks: Box::new(NoHooks),
        }
    }

    pub fn new(
        bundler: impl Bundler + 'static,
        renderer: impl ServerRenderer + 'static,
        formatter: impl HtmlFormatter + 'static,
        critical_css: impl CriticalCss + 'static,
    ) -> Self {
        Self {
            bundler: Box::new(bundler),
            renderer: Box::new(renderer),
            formatter: Box::new(formatter),
            critical_css: Box::new(critical_css),
            hooks: Box::new(NoHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: impl BuildHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Run a full build. `options` win over the host config's `ssgOptions`.
    pub async fn run(&self, options: SsgOptions, config: &ToolConfig) -> Result<BuildReport> {
        let mode = config.effective_mode(options.mode.as_deref());
        let resolved = self
            .bundler
            .resolve_config(&ResolveRequest {
                root: config.root.clone(),
                config_file: config.config_file.clone(),
                mode,
                node_env: config.node_env.clone(),
            })
            .await?;

        let options = SsgOptions::merge(resolved.ssg_options.clone(), options).resolve()?;
        tracing::debug!(?options, "resolved build options");

        remove_dir_if_exists(&resolved.out_dir).await?;

        let temp = TempBuildDir::create(&resolved.root).await?;
        let result = self.build_entries(&options, &resolved, config, &temp).await;
        let cleanup = temp.close().await;
        let report = result?;
        cleanup?;

        aprintln!("\n{} {}", tag(), p_g("Build finished."));

        self.hooks
            .on_finished()
            .await
            .map_err(|source| BuildError::Hook {
                hook: "onFinished",
                source,
            })?;

        Ok(report)
    }

    async fn build_entries(
        &self,
        options: &BuildOptions,
        resolved: &ResolvedConfig,
        config: &ToolConfig,
        temp: &TempBuildDir,
    ) -> Result<BuildReport> {
        let specs = entry_specs(options, &resolved.root).await?;
        let mut report = BuildReport {
            out_dir: resolved.out_dir.clone(),
            pages: Vec::with_capacity(specs.len()),
        };

        if !options.is_multi_entry() {
            for spec in &specs {
                report
                    .pages
                    .push(self.build_entry(spec, options, resolved, config, temp).await?);
            }
            return Ok(report);
        }

        let mut failed = Vec::new();
        for spec in &specs {
            match self.build_entry(spec, options, resolved, config, temp).await {
                Ok(page) => report.pages.push(page),
                Err(e) => {
                    tracing::error!(entry = %spec.name, error = %e, "entry failed");
                    failed.push(spec.name.clone());
                }
            }
        }
        if !failed.is_empty() {
            return Err(BuildError::EntriesFailed { failed });
        }
        Ok(report)
    }

    async fn build_entry(
        &self,
        spec: &EntrySpec,
        options: &BuildOptions,
        resolved: &ResolvedConfig,
        config: &ToolConfig,
        temp: &TempBuildDir,
    ) -> Result<PageReport> {
        build_log(&format!("Build {} start...", spec.name));
        let root = &resolved.root;

        self.bundler
            .build(
                resolved,
                &BuildTarget::Client {
                    name: spec.name.clone(),
                    template: root.join(&spec.template),
                    base: options.base.clone(),
                    mode: resolved.mode.clone(),
                },
            )
            .await?;

        let entry = match self.bundler.resolve_id(resolved, &spec.entry).await? {
            Some(path) => path,
            None => root.join(spec.entry.trim_start_matches('/')),
        };
        tracing::debug!(entry = %spec.name, path = %entry.display(), "resolved server entry");

        let shim = temp
            .write_shim(&entry, &server_entry_shim(&entry.to_string_lossy(), &options.renderer)?)
            .await?;
        let server_dir = temp.dist_dir();
        self.bundler
            .build(
                resolved,
                &BuildTarget::Server {
                    entry: shim.clone(),
                    out_dir: server_dir.clone(),
                    format: options.format,
                    base: options.base.clone(),
                    mode: resolved.mode.clone(),
                },
            )
            .await?;
        let module_path = BuildTarget::server_output(&shim, &server_dir, options.format);

        if options.critical_css.is_some() {
            aprintln!("{} {}", tag(), p_b("Critical CSS generation enabled via `beasties`"));
        }

        let shell = read_shell(&resolved.out_dir.join(&spec.template)).await?;
        let shell = rewrite_scripts(&shell, options.script);

        let request = RenderRequest {
            module_path,
            format: options.format,
            mock: options.mock,
            node_env: config.node_env.clone(),
            page: spec.name.clone(),
            route_path: None,
        };

        self.render_page(spec, options, resolved, request, shell)
            .await
            .map_err(|source| BuildError::Page {
                page: spec.name.clone(),
                source: Box::new(source),
            })
    }

    async fn render_page(
        &self,
        spec: &EntrySpec,
        options: &BuildOptions,
        resolved: &ResolvedConfig,
        request: RenderRequest,
        shell: String,
    ) -> Result<PageReport> {
        let mut ctx = PageContext {
            page: spec.name.clone(),
            ..Default::default()
        };

        let transformed = self
            .hooks
            .on_before_page_render(&shell, &ctx)
            .await
            .map_err(|source| BuildError::Hook {
                hook: "onBeforePageRender",
                source,
            })?;
        let shell = transformed.unwrap_or(shell);

        let output = self.renderer.render(request).await?;
        ctx.initial_state = output.initial_state.clone();
        ctx.modules = output.modules.clone();

        let extras = output.initial_state.as_deref().map(state_script);
        let injected = inject(
            &shell,
            &options.root_container_id,
            &output.html,
            extras.as_deref(),
        )?;

        let html = serialize_document(&injected);
        let transformed = self
            .hooks
            .on_page_rendered(&html, &ctx)
            .await
            .map_err(|source| BuildError::Hook {
                hook: "onPageRendered",
                source,
            })?;
        let html = transformed.unwrap_or(html);

        let html = match &options.critical_css {
            Some(critical_options) => {
                self.critical_css
                    .process(&html, &resolved.out_dir, critical_options)
                    .await?
            }
            None => html,
        };

        let liquid = match &spec.template_file {
            Some(template_file) => {
                let written = write_block(&BlockRequest {
                    root: &resolved.root,
                    out_dir: &resolved.out_dir,
                    page: &spec.name,
                    template_file,
                    html: &html,
                    markup: &output.html,
                    container_id: &options.root_container_id,
                    extras: extras.as_deref(),
                    copy_filter: options.copy_filter.as_deref(),
                    copy_target: options.copy_target.as_deref(),
                })
                .await?;
                Some(written.path)
            }
            None => None,
        };

        let formatted = format_html(html, options.formatting, self.formatter.as_ref()).await?;

        let filename = format!("{}.html", spec.name);
        let path = resolved.out_dir.join(&filename);
        write_file(&path, &formatted).await?;
        page_written(&resolved.out_dir_display(), &filename, &format_size(&formatted));
        tracing::info!(entry = %spec.name, bytes = formatted.len(), path = %path.display(), "page written");

        Ok(PageReport {
            name: spec.name.clone(),
            path,
            bytes: formatted.len(),
            liquid,
        })
    }
}

/// Explicit entries, or one entry whose script is detected from the root shell.
async fn entry_specs(options: &BuildOptions, root: &Path) -> Result<Vec<EntrySpec>> {
    if options.is_multi_entry() {
        return Ok(options.entries.clone());
    }
    let detected = match &options.entry {
        Some(entry) => entry.clone(),
        None => {
            let shell = read_shell(&root.join(&options.template)).await?;
            let entry = detect_entry_or_default(&shell);
            tracing::debug!(entry = %entry, template = %options.template, "detected script entry");
            entry
        }
    };
    Ok(options.entry_specs(|| detected))
}

async fn read_shell(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BuildError::MissingTemplate {
                path: path.to_path_buf(),
            }
        } else {
            BuildError::io(path, e)
        }
    })
}

async fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "cleared output directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::io(path, e)),
    }
}
