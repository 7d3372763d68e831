//! JsRuntime execution of a built server bundle.
//!
//! Every render gets a fresh `JsRuntime`: the polyfills, the optional mock DOM
//! and whatever the bundle does at evaluation time stay inside it.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use deno_core::{extension, op2, FsModuleLoader, JsRuntime, ModuleSpecifier, RuntimeOptions};
use vite_ssg_core::{
    cjs_bootstrap, esm_bootstrap, generate_polyfills, parse_render_result, ModuleFormat,
    RenderConfig, RenderFailure, RenderOutput, RenderRequest, RENDER_DRIVER,
};

use crate::error::{RenderError, Result};

thread_local! {
    /// JSON payload reported by the render driver.
    static RENDER_RESULT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Receives the render driver's JSON payload.
#[op2(fast)]
fn op_ssg_result(#[string] json: String) {
    RENDER_RESULT.with(|cell| {
        *cell.borrow_mut() = Some(json);
    });
}

extension!(ssg_ext, ops = [op_ssg_result]);

/// Load the server bundle described by `request` and render it.
///
/// **MUST be called from a dedicated thread** - `JsRuntime` is not `Send`.
pub async fn render(request: &RenderRequest) -> Result<RenderOutput> {
    clear_render_result();

    let bundle = canonical_bundle(&request.module_path)?;
    let config = RenderConfig {
        page: &request.page,
        route_path: request.route_path.as_deref(),
        mock: request.mock,
    };
    let polyfills = generate_polyfills(&config, &request.node_env)?;

    let mut runtime = JsRuntime::new(RuntimeOptions {
        module_loader: Some(Rc::new(FsModuleLoader)),
        extensions: vec![ssg_ext::init()],
        ..Default::default()
    });

    runtime
        .execute_script("<ssg:polyfills>", polyfills)
        .map_err(|e| RenderError::JsExecution(e.to_string()))?;
    runtime
        .execute_script("<ssg:driver>", RENDER_DRIVER.to_string())
        .map_err(|e| RenderError::JsExecution(e.to_string()))?;

    match request.format {
        ModuleFormat::Esm => evaluate_esm(&mut runtime, &bundle).await?,
        ModuleFormat::Cjs => evaluate_cjs(&mut runtime, &bundle)?,
    }

    runtime
        .run_event_loop(Default::default())
        .await
        .map_err(|e| RenderError::JsExecution(e.to_string()))?;

    let json = RENDER_RESULT
        .with(|cell| cell.borrow_mut().take())
        .ok_or(RenderError::NoResult)?;

    let path = bundle.display().to_string();
    match parse_render_result(&json)? {
        Ok(output) => Ok(output),
        Err(RenderFailure::MissingExport(export)) => Err(RenderError::MissingExport { export, path }),
        Err(RenderFailure::InvalidContext(reason)) => {
            Err(RenderError::InvalidContext { path, reason })
        }
        Err(RenderFailure::Exception(detail)) => Err(RenderError::JsExecution(detail)),
    }
}

fn canonical_bundle(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|e| RenderError::BundleLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn file_url(path: &Path) -> Result<ModuleSpecifier> {
    ModuleSpecifier::from_file_path(path).map_err(|()| RenderError::BundleLoad {
        path: path.display().to_string(),
        reason: "path cannot be expressed as a file URL".to_string(),
    })
}

/// Import the bundle from a generated bootstrap module next to it.
async fn evaluate_esm(runtime: &mut JsRuntime, bundle: &Path) -> Result<()> {
    let bundle_url = file_url(bundle)?;
    let bootstrap_url = file_url(&bundle.with_file_name("__ssg_bootstrap__.mjs"))?;
    let code = esm_bootstrap(bundle_url.as_str())?;

    let module_id = runtime
        .load_main_es_module_from_code(&bootstrap_url, code)
        .await
        .map_err(|e| RenderError::BundleLoad {
            path: bundle.display().to_string(),
            reason: e.to_string(),
        })?;

    let evaluation = runtime.mod_evaluate(module_id);
    runtime
        .run_event_loop(Default::default())
        .await
        .map_err(|e| RenderError::JsExecution(e.to_string()))?;
    evaluation
        .await
        .map_err(|e| RenderError::JsExecution(e.to_string()))
}

/// Evaluate the bundle inside a CommonJS wrapper.
fn evaluate_cjs(runtime: &mut JsRuntime, bundle: &Path) -> Result<()> {
    let code = std::fs::read_to_string(bundle).map_err(|e| RenderError::BundleLoad {
        path: bundle.display().to_string(),
        reason: e.to_string(),
    })?;
    let dirname = bundle
        .parent()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    let wrapped = cjs_bootstrap(&code, &bundle.display().to_string(), &dirname)?;

    runtime
        .execute_script("<ssg:server-bundle>", wrapped)
        .map_err(|e| RenderError::JsExecution(e.to_string()))?;
    Ok(())
}

fn clear_render_result() {
    RENDER_RESULT.with(|cell| {
        *cell.borrow_mut() = None;
    });
}
