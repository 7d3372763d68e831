//! [`Bundler`] backed by the project's own Vite installation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use vite_ssg_core::SsgOptions;

use crate::bundler::{BuildTarget, Bundler, ResolveRequest, ResolvedConfig};
use crate::error::{BuildError, Result};
use crate::node::{emit_result, input_prelude, NodeRunner};

const INLINE_CONFIG: &str = r#"
const inlineConfig = { root: input.root, configFile: input.configFile ?? undefined, mode: input.mode };
"#;

/// The host config decides `root`; the script runs from the project directory.
const HOST_ROOT_CONFIG: &str = r#"
const inlineConfig = { configFile: input.configFile ?? undefined, mode: input.mode };
"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigInput<'a> {
    root: &'a Path,
    config_file: Option<&'a Path>,
    mode: &'a str,
    node_env: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigOutput {
    root: PathBuf,
    out_dir: PathBuf,
    mode: String,
    #[serde(default)]
    ssg_options: Option<SsgOptions>,
}

#[derive(Deserialize)]
struct ResolveIdOutput {
    id: Option<String>,
}

pub struct ViteBundler {
    node: NodeRunner,
    node_env: String,
}

impl ViteBundler {
    pub fn new(node: NodeRunner, node_env: impl Into<String>) -> Self {
        Self {
            node,
            node_env: node_env.into(),
        }
    }

    fn config_input<'a>(&'a self, config: &'a ResolvedConfig) -> ConfigInput<'a> {
        ConfigInput {
            root: &config.root,
            config_file: config.config_file.as_deref(),
            mode: &config.mode,
            node_env: &self.node_env,
        }
    }
}

/// `resolveConfig` script printing root, outDir, mode and `ssgOptions`.
fn resolve_config_script(input: &ConfigInput<'_>) -> Result<String> {
    Ok(format!(
        r#"import {{ resolveConfig }} from 'vite';
import {{ isAbsolute, join }} from 'node:path';
{prelude}{HOST_ROOT_CONFIG}
const config = await resolveConfig(inlineConfig, 'build', input.mode, input.nodeEnv);
const outDir = config.build.outDir || 'dist';
{emit}"#,
        prelude = input_prelude(input)?,
        emit = emit_result(
            "{ root: config.root, outDir: isAbsolute(outDir) ? outDir : join(config.root, outDir), mode: config.mode, ssgOptions: config.ssgOptions ?? null }"
        ),
    ))
}

/// `createResolver` script printing the resolved id or `null`.
fn resolve_id_script(input: &ConfigInput<'_>, id: &str) -> Result<String> {
    Ok(format!(
        r#"import {{ resolveConfig }} from 'vite';
{prelude}{INLINE_CONFIG}
const config = await resolveConfig(inlineConfig, 'build', input.mode, input.nodeEnv);
const resolver = config.createResolver();
const id = await resolver({id}, config.root);
{emit}"#,
        prelude = input_prelude(input)?,
        id = serde_json::to_string(id).map_err(|e| BuildError::Bundler(e.to_string()))?,
        emit = emit_result("{ id: id ?? null }"),
    ))
}

/// `build(mergeConfig(inlineConfig, overrides))`
fn build_script(input: &ConfigInput<'_>, overrides: &Value) -> Result<String> {
    Ok(format!(
        r#"import {{ build, mergeConfig }} from 'vite';
{prelude}{INLINE_CONFIG}
const overrides = JSON.parse({overrides});
await build(mergeConfig(inlineConfig, overrides));
"#,
        prelude = input_prelude(input)?,
        overrides = serde_json::to_string(&overrides.to_string())
            .map_err(|e| BuildError::Bundler(e.to_string()))?,
    ))
}

/// Vite inline config layered over the user's config for `target`.
pub fn build_overrides(target: &BuildTarget) -> Value {
    let mut overrides = match target {
        BuildTarget::Client {
            name,
            template,
            mode,
            ..
        } => {
            let mut input = serde_json::Map::new();
            input.insert(name.clone(), json!(template));
            json!({
                "mode": mode,
                "build": {
                    // the output directory is cleared once per run, not per entry
                    "emptyOutDir": false,
                    "rollupOptions": { "input": input },
                },
            })
        }
        BuildTarget::Server {
            entry,
            out_dir,
            format,
            mode,
            ..
        } => json!({
            "mode": mode,
            "build": {
                "ssr": entry,
                "outDir": out_dir,
                "emptyOutDir": false,
                "minify": false,
                "cssCodeSplit": false,
                "rollupOptions": {
                    "output": {
                        "entryFileNames": format!("[name]{}", format.extension()),
                        "format": format.rollup_format(),
                    },
                },
            },
            "ssr": { "noExternal": true, "target": "webworker" },
        }),
    };

    let base = match target {
        BuildTarget::Client { base, .. } | BuildTarget::Server { base, .. } => base,
    };
    if let (Some(base), Some(object)) = (base, overrides.as_object_mut()) {
        object.insert("base".to_string(), Value::String(base.clone()));
    }
    overrides
}

#[async_trait]
impl Bundler for ViteBundler {
    async fn resolve_config(&self, request: &ResolveRequest) -> Result<ResolvedConfig> {
        let input = ConfigInput {
            root: &request.root,
            config_file: request.config_file.as_deref(),
            mode: &request.mode,
            node_env: &request.node_env,
        };
        let output: ConfigOutput = self
            .node
            .eval("resolve-config", &resolve_config_script(&input)?, None, &[])
            .await?;

        tracing::debug!(root = %output.root.display(), out_dir = %output.out_dir.display(), mode = %output.mode, "resolved vite config");
        Ok(ResolvedConfig {
            root: output.root,
            out_dir: output.out_dir,
            mode: output.mode,
            config_file: request.config_file.clone(),
            ssg_options: output.ssg_options.unwrap_or_default(),
        })
    }

    async fn build(&self, config: &ResolvedConfig, target: &BuildTarget) -> Result<()> {
        let script = build_script(&self.config_input(config), &build_overrides(target))?;
        self.node
            .run("build", &script, &[("VITE_SSG", target.ssg_flag())])
            .await
            .map_err(|e| BuildError::Bundler(e.to_string()))
    }

    async fn resolve_id(&self, config: &ResolvedConfig, id: &str) -> Result<Option<PathBuf>> {
        let script = resolve_id_script(&self.config_input(config), id)?;
        let output: ResolveIdOutput = self.node.eval("resolve-id", &script, None, &[]).await?;
        Ok(output.id.map(PathBuf::from))
    }
}

#[cfg(test)]
mod tests {
    use vite_ssg_core::ModuleFormat;

    use super::*;

    fn input() -> ConfigInput<'static> {
        ConfigInput {
            root: Path::new("/project"),
            config_file: None,
            mode: "production",
            node_env: "production",
        }
    }

    #[test]
    fn test_client_overrides() {
        let overrides = build_overrides(&BuildTarget::Client {
            name: "index".to_string(),
            template: PathBuf::from("/project/index.html"),
            base: Some("/docs/".to_string()),
            mode: "production".to_string(),
        });
        assert_eq!(
            overrides,
            json!({
                "mode": "production",
                "base": "/docs/",
                "build": {
                    "emptyOutDir": false,
                    "rollupOptions": { "input": { "index": "/project/index.html" } },
                },
            })
        );
    }

    #[test]
    fn test_server_overrides() {
        let overrides = build_overrides(&BuildTarget::Server {
            entry: PathBuf::from("/project/.vite-ssg-temp/x/shim/main.mjs"),
            out_dir: PathBuf::from("/project/.vite-ssg-temp/x/dist"),
            format: ModuleFormat::Esm,
            base: None,
            mode: "production".to_string(),
        });
        assert_eq!(overrides["build"]["minify"], json!(false));
        assert_eq!(overrides["build"]["cssCodeSplit"], json!(false));
        assert_eq!(overrides["build"]["rollupOptions"]["output"]["entryFileNames"], json!("[name].mjs"));
        assert_eq!(overrides["build"]["rollupOptions"]["output"]["format"], json!("esm"));
        assert_eq!(overrides["ssr"]["noExternal"], json!(true));
        assert!(overrides.get("base").is_none());
    }

    #[test]
    fn test_resolve_config_script_imports_vite() {
        let script = resolve_config_script(&input()).unwrap();
        assert!(script.starts_with("import { resolveConfig } from 'vite';"));
        assert!(script.contains("const input = JSON.parse("));
        assert!(script.contains("config.ssgOptions ?? null"));
    }

    #[test]
    fn test_resolve_config_script_leaves_root_to_host_config() {
        let script = resolve_config_script(&input()).unwrap();
        assert!(!script.contains("root: input.root"));
        assert!(script.contains("const inlineConfig = { configFile: input.configFile ?? undefined, mode: input.mode };"));
    }

    #[test]
    fn test_later_scripts_pin_resolved_root() {
        let build = build_script(&input(), &json!({})).unwrap();
        let resolve = resolve_id_script(&input(), "@/main.ts").unwrap();
        assert!(build.contains("root: input.root"));
        assert!(resolve.contains("root: input.root"));
    }

    #[test]
    fn test_resolve_id_script_quotes_id() {
        let script = resolve_id_script(&input(), "@/main.ts").unwrap();
        assert!(script.contains(r#"await resolver("@/main.ts", config.root)"#));
    }

    #[test]
    fn test_build_script_merges_overrides() {
        let script = build_script(&input(), &json!({ "mode": "production" })).unwrap();
        assert!(script.contains(r#"const overrides = JSON.parse("{\"mode\":\"production\"}");"#));
        assert!(script.contains("await build(mergeConfig(inlineConfig, overrides));"));
    }
}
