//! Pure prerender logic - no I/O, no async, no side effects.
//!
//! This crate provides:
//! - A byte-offset tag scanner for shell documents
//! - Shell injection of server-rendered markup
//! - Liquid template block composition and asset reference rewriting
//! - Build option types, merging and validation
//! - JS source generation for the server render runtime
//!
//! # Example
//!
//! ```
//! use vite_ssg_core::{inject, rewrite_scripts, ScriptMode};
//!
//! let shell = r#"<body><div id="app"></div><script type="module" src="/src/main.ts"></script></body>"#;
//! let shell = rewrite_scripts(shell, ScriptMode::Defer);
//! let html = inject(&shell, "app", "<h1>Hello</h1>", None).unwrap();
//!
//! assert!(html.contains(r#"<div id="app" data-server-rendered="true"><h1>Hello</h1></div>"#));
//! assert!(html.contains(r#"<script type="module" defer src="/src/main.ts">"#));
//! ```

mod assets;
mod block;
mod entry;
mod error;
mod html;
mod inject;
mod options;
mod polyfills;
mod render;

pub use assets::{
    asset_lookup, asset_path, find_asset_ref, rewrite_asset_tag, stringify_other_attributes,
    AssetRecord,
};
pub use block::{compose, fill_slots, ExtractionMode, TemplateBlock, HTML_SLOT, IGNORE_ATTR, SCRIPT_SLOT};
pub use entry::{detect_entry, detect_entry_or_default, rewrite_scripts, DEFAULT_ENTRY};
pub use error::{Result, SsgCoreError};
pub use html::{Attribute, AttributeValue, Quote, TagNode, TagTree};
pub use inject::{inject, state_script, SERVER_RENDERED_ATTR};
pub use options::{
    template_name, BuildOptions, CriticalCssSetting, EntrySpec, Formatting, ModuleFormat,
    ScriptMode, SsgOptions, DEFAULT_CONTAINER_ID, DEFAULT_RENDERER, DEFAULT_TEMPLATE,
};
pub use polyfills::{generate_polyfills, RenderConfig};
pub use render::{
    cjs_bootstrap, esm_bootstrap, parse_render_result, server_entry_shim, RenderFailure,
    RenderOutput, RenderRequest, RENDER_DRIVER, RENDER_EXPORT,
};
