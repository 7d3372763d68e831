//! The server module contract: generated JS glue and the render result shape.
//!
//! The server build is entered through a shim that re-exports the application
//! module next to the renderer's `renderToString`, so one self-contained bundle
//! carries both. Inside the runtime, [`RENDER_DRIVER`] validates the exports,
//! calls `createApp(false, routePath)`, renders and reports one JSON payload
//! through `op_ssg_result`.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Result, SsgCoreError};
use crate::options::ModuleFormat;

/// Export name the shim gives the renderer's `renderToString`.
pub const RENDER_EXPORT: &str = "__ssgRenderToString";

/// Server build entry re-exporting `entry` and the renderer.
pub fn server_entry_shim(entry: &str, renderer: &str) -> Result<String> {
    let entry = js_string(entry)?;
    let renderer = js_string(renderer)?;
    Ok(format!(
        "export * from {entry};\nexport {{ renderToString as {RENDER_EXPORT} }} from {renderer};\n"
    ))
}

/// Defines `globalThis.__ssgRender(mod)`; executed after the polyfills.
pub const RENDER_DRIVER: &str = r#"
globalThis.__ssgRender = async (mod) => {
    const report = (payload) => Deno.core.ops.op_ssg_result(JSON.stringify(payload));
    const config = globalThis.__SSG_CONFIG__;
    try {
        const exports = mod && typeof mod === 'object' ? mod : {};
        const createApp = exports.createApp ?? exports.default?.createApp;
        const renderToString = exports.__ssgRenderToString;
        if (typeof createApp !== 'function') {
            report({ error: { kind: 'missingExport', detail: 'createApp' } });
            return;
        }
        if (typeof renderToString !== 'function') {
            report({ error: { kind: 'missingExport', detail: 'renderToString' } });
            return;
        }

        const ctx = await createApp(false, config.routePath ?? undefined);
        const app = ctx?.app ?? ctx?.applicationInstance;
        if (!app) {
            report({ error: { kind: 'invalidContext', detail: 'createApp() did not return an application instance' } });
            return;
        }

        const sideChannel = {};
        const html = await renderToString(app, sideChannel);
        if (typeof ctx.onRenderedHook === 'function') await ctx.onRenderedHook();

        let initialState = null;
        if (ctx.initialState !== undefined) {
            initialState = typeof ctx.stateSerializer === 'function'
                ? await ctx.stateSerializer(ctx.initialState)
                : JSON.stringify(ctx.initialState);
        }
        const modules = sideChannel.modules ? Array.from(sideChannel.modules) : [];

        report({ ok: { html: String(html), initialState, modules } });
    } catch (err) {
        report({ error: { kind: 'exception', detail: String(err?.stack ?? err) } });
    }
};
"#;

/// Bootstrap module that imports the ESM bundle at `module_url` and renders it.
pub fn esm_bootstrap(module_url: &str) -> Result<String> {
    let url = js_string(module_url)?;
    Ok(format!(
        "import * as mod from {url};\nawait globalThis.__ssgRender(mod);\n"
    ))
}

/// Script evaluating a CommonJS bundle and rendering its exports.
///
/// `require` only rejects: the bundle is built with every dependency inlined.
pub fn cjs_bootstrap(code: &str, filename: &str, dirname: &str) -> Result<String> {
    let filename = js_string(filename)?;
    let dirname = js_string(dirname)?;
    Ok(format!(
        r#"(() => {{
const module = {{ exports: {{}} }};
const require = (id) => {{ throw new Error(`Cannot require "${{id}}" from the server bundle; it must be bundled`); }};
(function (exports, require, module, __filename, __dirname) {{
{code}
}})(module.exports, require, module, {filename}, {dirname});
globalThis.__ssgRender(module.exports);
}})();
"#
    ))
}

fn js_string(value: &str) -> Result<String> {
    serde_json::to_string(value).map_err(|e| SsgCoreError::Serialization(e.to_string()))
}

/// One server render: which bundle to load and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Built server module (`.mjs` or `.cjs`).
    pub module_path: PathBuf,
    pub format: ModuleFormat,
    /// Install `window`/`document` stand-ins before the bundle is evaluated.
    pub mock: bool,
    pub node_env: String,
    /// Entry name, for diagnostics and `__SSG_CONFIG__.page`.
    pub page: String,
    /// Passed to `createApp(false, routePath)`.
    pub route_path: Option<String>,
}

/// What one server render produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    /// Rendered application markup.
    pub html: String,
    /// Serialized initial state, when the app exposes one.
    #[serde(default)]
    pub initial_state: Option<String>,
    /// Module ids the renderer reported through its side channel.
    #[serde(default)]
    pub modules: Vec<String>,
}

/// Failure reported by the render driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFailure {
    /// `createApp` or `renderToString` is not exported as a function.
    MissingExport(String),
    /// `createApp` resolved to something without an application instance.
    InvalidContext(String),
    /// JS exception thrown by the application or the renderer.
    Exception(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum Payload {
    Ok(RenderOutput),
    Error { kind: String, detail: String },
}

/// Decode the JSON payload sent through `op_ssg_result`.
pub fn parse_render_result(json: &str) -> Result<std::result::Result<RenderOutput, RenderFailure>> {
    let payload: Payload =
        serde_json::from_str(json).map_err(|e| SsgCoreError::MalformedRenderResult(e.to_string()))?;
    Ok(match payload {
        Payload::Ok(output) => Ok(output),
        Payload::Error { kind, detail } => Err(match kind.as_str() {
            "missingExport" => RenderFailure::MissingExport(detail),
            "invalidContext" => RenderFailure::InvalidContext(detail),
            _ => RenderFailure::Exception(detail),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_entry_shim() {
        let shim = server_entry_shim("/app/src/main.ts", "vue/server-renderer").unwrap();
        assert_eq!(
            shim,
            "export * from \"/app/src/main.ts\";\nexport { renderToString as __ssgRenderToString } from \"vue/server-renderer\";\n"
        );
    }

    #[test]
    fn test_server_entry_shim_escapes_paths() {
        let shim = server_entry_shim(r#"C:\app\"main".ts"#, "vue/server-renderer").unwrap();
        assert!(shim.starts_with(r#"export * from "C:\\app\\\"main\".ts";"#));
    }

    #[test]
    fn test_esm_bootstrap_imports_bundle() {
        let code = esm_bootstrap("file:///tmp/x/main.mjs").unwrap();
        assert!(code.starts_with("import * as mod from \"file:///tmp/x/main.mjs\";"));
        assert!(code.contains("globalThis.__ssgRender(mod)"));
    }

    #[test]
    fn test_cjs_bootstrap_wraps_code() {
        let code = cjs_bootstrap("exports.createApp = 1;", "/tmp/main.cjs", "/tmp").unwrap();
        assert!(code.contains("exports.createApp = 1;"));
        assert!(code.contains(r#"(module.exports, require, module, "/tmp/main.cjs", "/tmp")"#));
        assert!(code.contains("globalThis.__ssgRender(module.exports)"));
    }

    #[test]
    fn test_parse_ok_result() {
        let json = r#"{"ok":{"html":"<p>hi</p>","initialState":"{\"a\":1}","modules":["src/App.vue"]}}"#;
        let output = parse_render_result(json).unwrap().unwrap();
        assert_eq!(output.html, "<p>hi</p>");
        assert_eq!(output.initial_state.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(output.modules, vec!["src/App.vue"]);
    }

    #[test]
    fn test_parse_ok_result_without_state() {
        let json = r#"{"ok":{"html":"x","initialState":null,"modules":[]}}"#;
        let output = parse_render_result(json).unwrap().unwrap();
        assert_eq!(output.initial_state, None);
    }

    #[test]
    fn test_parse_error_kinds() {
        let missing = parse_render_result(r#"{"error":{"kind":"missingExport","detail":"createApp"}}"#)
            .unwrap()
            .unwrap_err();
        assert_eq!(missing, RenderFailure::MissingExport("createApp".to_string()));

        let thrown = parse_render_result(r#"{"error":{"kind":"exception","detail":"boom"}}"#)
            .unwrap()
            .unwrap_err();
        assert_eq!(thrown, RenderFailure::Exception("boom".to_string()));
    }

    #[test]
    fn test_parse_malformed_result() {
        assert!(matches!(
            parse_render_result("not json"),
            Err(SsgCoreError::MalformedRenderResult(_))
        ));
    }
}
