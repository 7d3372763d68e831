//! Build lifecycle hooks.

use async_trait::async_trait;

/// What a hook knows about the page being built.
///
/// `initial_state` and `modules` are filled once the page has rendered, so
/// they are empty in [`BuildHooks::on_before_page_render`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    /// Entry name.
    pub page: String,
    /// Serialized initial state reported by the application.
    pub initial_state: Option<String>,
    /// Module ids reported by the renderer.
    pub modules: Vec<String>,
}

/// Lifecycle hooks of a build run.
///
/// Every method defaults to a pass-through. Returning `Ok(None)` from a page
/// hook keeps the document unchanged.
#[async_trait]
pub trait BuildHooks: Send + Sync {
    /// Transform the shell before the page is rendered.
    async fn on_before_page_render(
        &self,
        _shell: &str,
        _ctx: &PageContext,
    ) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    /// Transform the serialized document.
    async fn on_page_rendered(
        &self,
        _html: &str,
        _ctx: &PageContext,
    ) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    /// Runs once after every page is written and the temp directory is gone.
    async fn on_finished(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Hooks that change nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl BuildHooks for NoHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_hooks_pass_through() {
        let ctx = PageContext::default();
        assert_eq!(NoHooks.on_before_page_render("<html>", &ctx).await.unwrap(), None);
        assert_eq!(NoHooks.on_page_rendered("<html>", &ctx).await.unwrap(), None);
        assert!(NoHooks.on_finished().await.is_ok());
    }
}
