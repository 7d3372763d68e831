//! Document post-processing: DOM serialization, critical CSS and formatting.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use vite_ssg_core::Formatting;

use crate::error::Result;
use crate::node::{emit_result, input_prelude, NodeRunner, READ_STDIN};

/// Round-trip `html` through an HTML5 tree builder.
///
/// The output is always a well-formed document, whatever the shell or the
/// hooks produced.
pub fn serialize_document(html: &str) -> String {
    scraper::Html::parse_document(html).html()
}

/// External HTML formatters.
#[async_trait]
pub trait HtmlFormatter: Send + Sync {
    async fn minify(&self, html: &str) -> Result<String>;
    async fn prettify(&self, html: &str) -> Result<String>;
}

/// Apply `mode`; delegate failures are returned unchanged.
pub async fn format_html(html: String, mode: Formatting, formatter: &dyn HtmlFormatter) -> Result<String> {
    match mode {
        Formatting::None => Ok(html),
        Formatting::Minify => formatter.minify(&html).await,
        Formatting::Prettify => formatter.prettify(&html).await,
    }
}

/// Inlines above-the-fold CSS into a document.
#[async_trait]
pub trait CriticalCss: Send + Sync {
    async fn process(&self, html: &str, out_dir: &Path, options: &Value) -> Result<String>;
}

const MINIFY_SCRIPT: &str = r#"
const { minify } = await import('html-minifier-terser');
const html = await minify(await readStdin(), {
    collapseWhitespace: true,
    caseSensitive: true,
    collapseInlineTagWhitespace: false,
    minifyJS: true,
    minifyCSS: true,
});
"#;

const PRETTIFY_SCRIPT: &str = r#"
const prettier = (await import('prettier')).default;
const html = await prettier.format(await readStdin(), { semi: false, parser: 'html' });
"#;

/// html-minifier-terser and prettier from the project's `node_modules`.
#[derive(Debug, Clone)]
pub struct NodeFormatter {
    node: NodeRunner,
}

impl NodeFormatter {
    pub fn new(node: NodeRunner) -> Self {
        Self { node }
    }

    async fn run(&self, name: &'static str, body: &str, html: &str) -> Result<String> {
        let script = format!("{READ_STDIN}{body}{}", emit_result("html"));
        self.node.eval(name, &script, Some(html), &[]).await
    }
}

#[async_trait]
impl HtmlFormatter for NodeFormatter {
    async fn minify(&self, html: &str) -> Result<String> {
        self.run("minify", MINIFY_SCRIPT, html).await
    }

    async fn prettify(&self, html: &str) -> Result<String> {
        self.run("prettify", PRETTIFY_SCRIPT, html).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BeastiesInput<'a> {
    out_dir: &'a Path,
    options: &'a Value,
}

/// beasties bound to the output directory.
#[derive(Debug, Clone)]
pub struct BeastiesCriticalCss {
    node: NodeRunner,
}

impl BeastiesCriticalCss {
    pub fn new(node: NodeRunner) -> Self {
        Self { node }
    }
}

fn beasties_script(out_dir: &Path, options: &Value) -> Result<String> {
    let prelude = input_prelude(&BeastiesInput { out_dir, options })?;
    Ok(format!(
        r#"{prelude}{READ_STDIN}
const {{ default: Beasties }} = await import('beasties');
const beasties = new Beasties({{
    path: input.outDir,
    logLevel: 'warn',
    external: true,
    inlineFonts: true,
    preloadFonts: true,
    ...input.options,
}});
const html = await beasties.process(await readStdin());
{emit}"#,
        emit = emit_result("html"),
    ))
}

#[async_trait]
impl CriticalCss for BeastiesCriticalCss {
    async fn process(&self, html: &str, out_dir: &Path, options: &Value) -> Result<String> {
        let script = beasties_script(out_dir, options)?;
        self.node.eval("beasties", &script, Some(html), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::BuildError;

    #[derive(Default)]
    struct RecordingFormatter {
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl HtmlFormatter for RecordingFormatter {
        async fn minify(&self, html: &str) -> Result<String> {
            self.calls.lock().unwrap().push("minify");
            Ok(html.replace(' ', ""))
        }

        async fn prettify(&self, _html: &str) -> Result<String> {
            self.calls.lock().unwrap().push("prettify");
            Err(BuildError::Node {
                script: "prettify",
                reason: "parse error".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_format_none_is_identity() {
        let formatter = RecordingFormatter::default();
        let out = format_html("<p> a </p>".to_string(), Formatting::None, &formatter)
            .await
            .unwrap();
        assert_eq!(out, "<p> a </p>");
        assert!(formatter.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_format_minify_delegates() {
        let formatter = RecordingFormatter::default();
        let out = format_html("<p> a </p>".to_string(), Formatting::Minify, &formatter)
            .await
            .unwrap();
        assert_eq!(out, "<p>a</p>");
        assert_eq!(*formatter.calls.lock().unwrap(), vec!["minify"]);
    }

    #[tokio::test]
    async fn test_format_failure_propagates() {
        let formatter = RecordingFormatter::default();
        let err = format_html("<p>".to_string(), Formatting::Prettify, &formatter)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Node { script: "prettify", .. }));
    }

    #[test]
    fn test_serialize_document_closes_open_tags() {
        let html = serialize_document("<!DOCTYPE html><html><head></head><body><div id=\"app\" data-server-rendered=\"true\"><p>hi</div></body></html>");
        assert_eq!(
            html,
            "<!DOCTYPE html><html><head></head><body><div id=\"app\" data-server-rendered=\"true\"><p>hi</p></div></body></html>"
        );
    }

    #[test]
    fn test_beasties_script_binds_output_dir() {
        let script = beasties_script(Path::new("/project/dist"), &serde_json::json!({ "preload": "media" })).unwrap();
        assert!(script.contains(r#"\"outDir\":\"/project/dist\""#));
        assert!(script.contains("...input.options"));
        assert!(script.contains("logLevel: 'warn'"));
    }
}
