//! Running generated ES module scripts under node.
//!
//! Scripts run with the project root as working directory, so bare imports
//! (`vite`, `prettier`, ...) resolve from the project's own `node_modules`.
//! Inputs are passed with `JSON.parse` of a double-encoded string and a
//! result is printed as one marker-prefixed JSON line on stdout.

use std::path::PathBuf;
use std::process::Stdio;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{BuildError, Result};

/// Prefix of the result line printed by scripts.
pub const RESULT_MARKER: &str = "__VITE_SSG_RESULT__";

/// `const input = JSON.parse(...)` for `value`.
pub fn input_prelude<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).map_err(|e| BuildError::Node {
        script: "input",
        reason: e.to_string(),
    })?;
    let escaped = serde_json::to_string(&json).map_err(|e| BuildError::Node {
        script: "input",
        reason: e.to_string(),
    })?;
    Ok(format!("const input = JSON.parse({escaped});\n"))
}

/// JS statement printing `expr` as the result line.
pub fn emit_result(expr: &str) -> String {
    format!("process.stdout.write('\\n{RESULT_MARKER}' + JSON.stringify({expr}) + '\\n');\n")
}

/// Last result line in `stdout`, marker stripped.
pub fn extract_result(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(RESULT_MARKER))
}

/// Stdin reader shared by the formatter scripts.
pub const READ_STDIN: &str = r#"
const readStdin = async () => {
    const chunks = [];
    for await (const chunk of process.stdin) chunks.push(chunk);
    return Buffer.concat(chunks).toString('utf8');
};
"#;

#[derive(Debug, Clone)]
pub struct NodeRunner {
    node: String,
    cwd: PathBuf,
}

impl NodeRunner {
    pub fn new(node: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            node: node.into(),
            cwd: cwd.into(),
        }
    }

    fn command(&self, script: &str, envs: &[(&str, &str)]) -> Command {
        let mut cmd = Command::new(&self.node);
        cmd.args(["--input-type=module", "--eval", script])
            .current_dir(&self.cwd)
            .kill_on_drop(true);
        for (key, value) in envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run `script` with its output streamed to the terminal.
    pub async fn run(&self, name: &'static str, script: &str, envs: &[(&str, &str)]) -> Result<()> {
        tracing::debug!(script = name, cwd = %self.cwd.display(), "running node script");
        let status = self
            .command(script, envs)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| self.spawn_error(name, e))?;

        if !status.success() {
            return Err(BuildError::Node {
                script: name,
                reason: format!("exited with {status}"),
            });
        }
        Ok(())
    }

    /// Run `script`, feed it `stdin` and decode its result line.
    pub async fn eval<T: DeserializeOwned>(
        &self,
        name: &'static str,
        script: &str,
        stdin: Option<&str>,
        envs: &[(&str, &str)],
    ) -> Result<T> {
        tracing::debug!(script = name, cwd = %self.cwd.display(), "evaluating node script");
        let mut child = self
            .command(script, envs)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(name, e))?;

        // the script may exit before reading all of stdin; its exit status wins
        let writer = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => {
                let input = input.to_owned();
                Some(tokio::spawn(async move {
                    let written = pipe.write_all(input.as_bytes()).await;
                    drop(pipe);
                    written
                }))
            }
            _ => None,
        };

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| BuildError::io(&self.cwd, e))?;

        let write_error = match writer {
            Some(task) => match task.await {
                Ok(written) => written.err(),
                Err(e) => Some(std::io::Error::other(e)),
            },
            None => None,
        };
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = [stderr.trim(), stdout.trim()]
                .into_iter()
                .find(|text| !text.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("exited with {}", output.status));
            return Err(BuildError::Node {
                script: name,
                reason,
            });
        }

        if let Some(e) = write_error {
            return Err(BuildError::io(&self.cwd, e));
        }

        let line = extract_result(&stdout).ok_or_else(|| BuildError::Node {
            script: name,
            reason: "no result was printed".to_string(),
        })?;
        serde_json::from_str(line).map_err(|e| BuildError::Node {
            script: name,
            reason: format!("invalid result: {e}"),
        })
    }

    fn spawn_error(&self, name: &'static str, error: std::io::Error) -> BuildError {
        BuildError::Node {
            script: name,
            reason: format!("could not start `{}`: {error}", self.node),
        }
    }
}
