//! The server render contract used by the build pipeline.

use async_trait::async_trait;
use vite_ssg_core::{RenderOutput, RenderRequest};
use vite_ssg_render::DenoRenderer;

use crate::error::Result;

/// Loads a built server module and renders its application.
#[async_trait]
pub trait ServerRenderer: Send + Sync {
    async fn render(&self, request: RenderRequest) -> Result<RenderOutput>;
}

#[async_trait]
impl ServerRenderer for DenoRenderer {
    async fn render(&self, request: RenderRequest) -> Result<RenderOutput> {
        Ok(DenoRenderer::render(self, request).await?)
    }
}
