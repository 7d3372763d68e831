//! Server bundle rendering - Imperative Shell.
//!
//! This crate executes the server build produced for each page using pure
//! JS glue from `vite_ssg_core`. The bundle is loaded into a fresh
//! `deno_core::JsRuntime` on a dedicated thread, its `createApp` export is
//! validated, and the rendered markup comes back as a [`RenderOutput`].
//!
//! # Architecture
//!
//! - **Functional Core** (`vite_ssg_core`): polyfills, bootstrap scripts, result decoding
//! - **Imperative Shell** (this crate): file loading, threading, JsRuntime execution
//!
//! # Example
//!
//! ```ignore
//! use vite_ssg_render::{DenoRenderer, RenderRequest};
//! use vite_ssg_core::ModuleFormat;
//!
//! let renderer = DenoRenderer::new();
//! let output = renderer
//!     .render(RenderRequest {
//!         module_path: ".vite-ssg-temp/abc/dist/main.mjs".into(),
//!         format: ModuleFormat::Esm,
//!         mock: false,
//!         node_env: "production".into(),
//!         page: "index".into(),
//!         route_path: None,
//!     })
//!     .await?;
//! println!("{}", output.html);
//! ```

mod error;
mod runtime;
mod worker;

pub use error::{RenderError, Result};
pub use vite_ssg_core::{RenderOutput, RenderRequest};

/// Renders server bundles in isolated `deno_core` runtimes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenoRenderer;

impl DenoRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render one page. Each call gets its own runtime and thread.
    pub async fn render(&self, request: RenderRequest) -> Result<RenderOutput> {
        let page = request.page.clone();
        let rx = worker::spawn_render(request)?;
        let output = rx.await.map_err(|_| RenderError::ChannelClosed)??;
        tracing::debug!(page = %page, bytes = output.html.len(), modules = output.modules.len(), "page rendered");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use vite_ssg_core::ModuleFormat;

    use super::*;

    const ESM_BUNDLE: &str = r#"
export async function createApp(isClient, routePath) {
    return {
        app: { title: `hello from ${routePath ?? '/'}`, isClient },
        initialState: { count: 1, html: '</script>' },
    };
}
export async function __ssgRenderToString(app, ctx) {
    ctx.modules = new Set(['src/App.vue']);
    return `<h1>${app.title}</h1><p>${app.isClient}</p>`;
}
"#;

    const CJS_BUNDLE: &str = r#"
exports.createApp = function (isClient) {
    return { app: { name: 'cjs' } };
};
exports.__ssgRenderToString = function (app) {
    return Promise.resolve('<main>' + app.name + '</main>');
};
"#;

    fn request(path: &Path, format: ModuleFormat) -> RenderRequest {
        RenderRequest {
            module_path: path.to_path_buf(),
            format,
            mock: false,
            node_env: "production".to_string(),
            page: "index".to_string(),
            route_path: Some("/about".to_string()),
        }
    }

    fn write_bundle(dir: &tempfile::TempDir, name: &str, code: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, code).unwrap();
        path
    }

    #[tokio::test]
    async fn test_render_esm_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(&dir, "main.mjs", ESM_BUNDLE);

        let output = DenoRenderer::new()
            .render(request(&path, ModuleFormat::Esm))
            .await
            .unwrap();

        assert_eq!(output.html, "<h1>hello from /about</h1><p>false</p>");
        assert_eq!(
            output.initial_state.as_deref(),
            Some(r#"{"count":1,"html":"</script>"}"#)
        );
        assert_eq!(output.modules, vec!["src/App.vue"]);
    }

    #[tokio::test]
    async fn test_render_cjs_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(&dir, "main.cjs", CJS_BUNDLE);

        let output = DenoRenderer::new()
            .render(request(&path, ModuleFormat::Cjs))
            .await
            .unwrap();

        assert_eq!(output.html, "<main>cjs</main>");
        assert_eq!(output.initial_state, None);
        assert!(output.modules.is_empty());
    }

    #[tokio::test]
    async fn test_missing_create_app_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(
            &dir,
            "main.mjs",
            "export const __ssgRenderToString = () => '';\nexport const other = 1;\n",
        );

        let err = DenoRenderer::new()
            .render(request(&path, ModuleFormat::Esm))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::MissingExport { ref export, .. } if export == "createApp"));
        assert!(err.to_string().contains("could not locate render entry point"));
    }

    #[tokio::test]
    async fn test_thrown_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(
            &dir,
            "main.mjs",
            "export function createApp() { throw new Error('boom'); }\nexport const __ssgRenderToString = () => '';\n",
        );

        let err = DenoRenderer::new()
            .render(request(&path, ModuleFormat::Esm))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::JsExecution(ref detail) if detail.contains("boom")));
    }

    #[tokio::test]
    async fn test_mock_dom_is_scoped_to_one_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(
            &dir,
            "main.mjs",
            r#"
const hasDocument = typeof document !== 'undefined';
export function createApp() { return { app: { hasDocument } }; }
export function __ssgRenderToString(app) { return String(app.hasDocument); }
"#,
        );

        let renderer = DenoRenderer::new();
        let mocked = renderer
            .render(RenderRequest {
                mock: true,
                ..request(&path, ModuleFormat::Esm)
            })
            .await
            .unwrap();
        let plain = renderer
            .render(request(&path, ModuleFormat::Esm))
            .await
            .unwrap();

        assert_eq!(mocked.html, "true");
        assert_eq!(plain.html, "false");
    }

    #[tokio::test]
    async fn test_missing_bundle_file() {
        let err = DenoRenderer::new()
            .render(request(Path::new("/nonexistent/main.mjs"), ModuleFormat::Esm))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::BundleLoad { .. }));
    }
}
