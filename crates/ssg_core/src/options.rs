//! Build options: the partial form read from config and the resolved form.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SsgCoreError};

/// How module scripts in the shell are loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptMode {
    #[default]
    #[serde(rename = "sync")]
    Sync,
    #[serde(rename = "async")]
    Async,
    #[serde(rename = "defer")]
    Defer,
    #[serde(rename = "async defer")]
    AsyncDefer,
}

impl ScriptMode {
    /// Attribute text added to module scripts, `None` for `sync`.
    pub fn attribute(self) -> Option<&'static str> {
        match self {
            Self::Sync => None,
            Self::Async => Some("async"),
            Self::Defer => Some("defer"),
            Self::AsyncDefer => Some("async defer"),
        }
    }
}

impl fmt::Display for ScriptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute().unwrap_or("sync"))
    }
}

impl FromStr for ScriptMode {
    type Err = SsgCoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sync" => Ok(Self::Sync),
            "async" => Ok(Self::Async),
            "defer" => Ok(Self::Defer),
            "async defer" => Ok(Self::AsyncDefer),
            other => Err(SsgCoreError::InvalidOption {
                option: "script",
                reason: format!("unknown mode `{other}`"),
            }),
        }
    }
}

/// Post-processing applied to the finished page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formatting {
    #[default]
    None,
    Minify,
    Prettify,
}

/// Module format of the server build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    #[default]
    Esm,
    Cjs,
}

impl ModuleFormat {
    /// File extension of the server bundle, dot included.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Esm => ".mjs",
            Self::Cjs => ".cjs",
        }
    }

    /// Rollup `output.format` value.
    pub fn rollup_format(self) -> &'static str {
        match self {
            Self::Esm => "esm",
            Self::Cjs => "cjs",
        }
    }
}

/// `beastiesOptions`: `false` disables critical CSS, an object configures it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriticalCssSetting {
    Enabled(bool),
    Options(serde_json::Map<String, serde_json::Value>),
}

/// One named unit of work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySpec {
    pub name: String,
    /// Shell template, relative to the project root.
    #[serde(default = "default_template")]
    pub template: String,
    /// Script entry of the application.
    pub entry: String,
    /// Liquid skeleton for the template block.
    #[serde(default)]
    pub template_file: Option<String>,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

pub const DEFAULT_TEMPLATE: &str = "index.html";
pub const DEFAULT_CONTAINER_ID: &str = "app";
pub const DEFAULT_RENDERER: &str = "vue/server-renderer";

/// Options as declared by a caller or under `ssgOptions` in the host config.
///
/// Every field is optional; [`SsgOptions::merge`] layers two sources and
/// [`SsgOptions::resolve`] fills in defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SsgOptions {
    pub mode: Option<String>,
    pub script: Option<ScriptMode>,
    pub mock: Option<bool>,
    pub formatting: Option<Formatting>,
    pub format: Option<ModuleFormat>,
    pub root_container_id: Option<String>,
    pub base: Option<String>,
    pub entry: Option<String>,
    pub template: Option<String>,
    pub template_file: Option<String>,
    #[serde(alias = "entries")]
    pub entrys: Option<Vec<EntrySpec>>,
    pub beasties_options: Option<CriticalCssSetting>,
    pub renderer: Option<String>,
    pub copy_filter: Option<Vec<String>>,
    pub copy_target: Option<String>,
}

impl SsgOptions {
    /// Layer `caller` over `host`; the caller wins on every key it sets.
    pub fn merge(host: SsgOptions, caller: SsgOptions) -> SsgOptions {
        SsgOptions {
            mode: caller.mode.or(host.mode),
            script: caller.script.or(host.script),
            mock: caller.mock.or(host.mock),
            formatting: caller.formatting.or(host.formatting),
            format: caller.format.or(host.format),
            root_container_id: caller.root_container_id.or(host.root_container_id),
            base: caller.base.or(host.base),
            entry: caller.entry.or(host.entry),
            template: caller.template.or(host.template),
            template_file: caller.template_file.or(host.template_file),
            entrys: caller.entrys.or(host.entrys),
            beasties_options: caller.beasties_options.or(host.beasties_options),
            renderer: caller.renderer.or(host.renderer),
            copy_filter: caller.copy_filter.or(host.copy_filter),
            copy_target: caller.copy_target.or(host.copy_target),
        }
    }

    /// Fill defaults and validate.
    pub fn resolve(self) -> Result<BuildOptions> {
        let root_container_id = self
            .root_container_id
            .unwrap_or_else(|| DEFAULT_CONTAINER_ID.to_string());
        if root_container_id.trim().is_empty() {
            return Err(SsgCoreError::InvalidOption {
                option: "rootContainerId",
                reason: "must not be empty".to_string(),
            });
        }

        let entries = self.entrys.unwrap_or_default();
        let mut seen = std::collections::HashSet::new();
        for spec in &entries {
            if spec.name.trim().is_empty() {
                return Err(SsgCoreError::InvalidOption {
                    option: "entrys",
                    reason: "entry names must not be empty".to_string(),
                });
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(SsgCoreError::InvalidOption {
                    option: "entrys",
                    reason: format!("duplicate entry name `{}`", spec.name),
                });
            }
        }

        let critical_css = match self.beasties_options {
            None | Some(CriticalCssSetting::Enabled(true)) => {
                Some(serde_json::Value::Object(serde_json::Map::new()))
            }
            Some(CriticalCssSetting::Enabled(false)) => None,
            Some(CriticalCssSetting::Options(options)) => Some(serde_json::Value::Object(options)),
        };

        Ok(BuildOptions {
            script: self.script.unwrap_or_default(),
            mock: self.mock.unwrap_or(false),
            formatting: self.formatting.unwrap_or_default(),
            format: self.format.unwrap_or_default(),
            root_container_id,
            base: self.base,
            entry: self.entry,
            template: self.template.unwrap_or_else(default_template),
            template_file: self.template_file,
            entries,
            critical_css,
            renderer: self
                .renderer
                .unwrap_or_else(|| DEFAULT_RENDERER.to_string()),
            copy_filter: self.copy_filter,
            copy_target: self.copy_target,
        })
    }
}

/// Resolved, immutable options for one build run.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildOptions {
    pub script: ScriptMode,
    pub mock: bool,
    pub formatting: Formatting,
    pub format: ModuleFormat,
    pub root_container_id: String,
    pub base: Option<String>,
    /// Explicit script entry; `None` means detect it from the shell.
    pub entry: Option<String>,
    pub template: String,
    pub template_file: Option<String>,
    /// Explicit entries; empty means a single synthesized entry.
    pub entries: Vec<EntrySpec>,
    /// Critical CSS processor options, `None` when disabled.
    pub critical_css: Option<serde_json::Value>,
    /// Module specifier providing `renderToString`.
    pub renderer: String,
    pub copy_filter: Option<Vec<String>>,
    pub copy_target: Option<String>,
}

impl BuildOptions {
    /// Whether an explicit entry list was given.
    pub fn is_multi_entry(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Ordered entries to process.
    ///
    /// `script_entry` is the application entry for the synthesized entry; it is
    /// ignored when an explicit list exists.
    pub fn entry_specs(&self, script_entry: impl FnOnce() -> String) -> Vec<EntrySpec> {
        if self.is_multi_entry() {
            return self.entries.clone();
        }
        vec![EntrySpec {
            name: template_name(&self.template),
            template: self.template.clone(),
            entry: self.entry.clone().unwrap_or_else(script_entry),
            template_file: self.template_file.clone(),
        }]
    }
}

/// `pages/about.html` -> `pages/about`
pub fn template_name(template: &str) -> String {
    let path = Path::new(template);
    match (path.parent(), path.file_stem()) {
        (Some(parent), Some(stem)) if !parent.as_os_str().is_empty() => parent
            .join(stem)
            .to_string_lossy()
            .replace('\\', "/"),
        (_, Some(stem)) => stem.to_string_lossy().into_owned(),
        _ => template.to_string(),
    }
}
