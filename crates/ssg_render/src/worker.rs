//! Render worker threads.
//!
//! Each render runs in a dedicated thread with its own Tokio runtime
//! because `deno_core::JsRuntime` is not `Send`.

use tokio::sync::oneshot;
use vite_ssg_core::{RenderOutput, RenderRequest};

use crate::error::{RenderError, Result};
use crate::runtime;

/// Spawn a thread that renders `request` and reports back on the returned channel.
pub fn spawn_render(request: RenderRequest) -> Result<oneshot::Receiver<Result<RenderOutput>>> {
    let (response_tx, response_rx) = oneshot::channel();

    std::thread::Builder::new()
        .name(format!("vite-ssg-render-{}", request.page))
        .spawn(move || {
            let result = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt.block_on(async {
                    tracing::debug!(page = %request.page, "render worker started");
                    let result = runtime::render(&request).await;
                    tracing::debug!(page = %request.page, ok = result.is_ok(), "render worker finished");
                    result
                }),
                Err(e) => Err(RenderError::WorkerSpawn(e.to_string())),
            };

            // Receiver may be gone if the caller gave up
            let _ = response_tx.send(result);
        })
        .map_err(|e| RenderError::WorkerSpawn(e.to_string()))?;

    Ok(response_rx)
}
