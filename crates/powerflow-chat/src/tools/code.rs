//! Local code execution tool.
//!
//! Each call gets its own `run-<uuid>` directory under the work directory. The
//! snippet is written there as a temporary script and run with the configured
//! interpreter from inside that directory. PNG files left in it are returned as
//! images, so plots saved with `plt.savefig("x.png")` reach the user and
//! concurrent calls never see each other's files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde_json::{json, Map, Value};
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ToolImage, ToolOutput, ToolProvider};
use crate::config::CodeInterpreterConfig;
use crate::error::{ChatError, ChatResult};
use crate::message::ToolSpec;

pub const TOOL_NAME: &str = "code_interpreter";

#[derive(Debug, Clone)]
pub struct CodeInterpreter {
    command: String,
    args: Vec<String>,
    timeout: Duration,
    work_dir: PathBuf,
    max_output_bytes: usize,
}

impl CodeInterpreter {
    pub fn new(command: impl Into<String>, work_dir: impl Into<PathBuf>) -> ChatResult<Self> {
        let work_dir = work_dir.into();
        fs::create_dir_all(&work_dir)?;
        Ok(Self {
            command: command.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(60),
            work_dir,
            max_output_bytes: 16 * 1024,
        })
    }

    pub fn from_config(config: &CodeInterpreterConfig) -> ChatResult<Self> {
        Ok(Self::new(&config.command, &config.work_dir)?
            .with_args(config.args.clone())
            .with_timeout(config.timeout())
            .with_max_output_bytes(config.max_output_bytes))
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Run `code`; interpreter failures come back as an error [`ToolOutput`], not `Err`.
    pub async fn run(&self, code: &str) -> ChatResult<ToolOutput> {
        let run_dir = self.work_dir.join(format!("run-{}", Uuid::new_v4()));
        fs::create_dir(&run_dir)?;

        let script = tempfile::Builder::new()
            .prefix("snippet-")
            .suffix(".py")
            .tempfile_in(&run_dir)?;
        fs::write(script.path(), code)?;

        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .arg(script.path())
            .current_dir(&run_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        debug!(command = %self.command, script = %script.path().display(), "running snippet");

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return Ok(ToolOutput::error(format!(
                    "cannot run '{}': {err}",
                    self.command
                )))
            }
            Err(_) => {
                return Ok(ToolOutput::error(format!(
                    "execution timed out after {:.1}s",
                    self.timeout.as_secs_f64()
                )))
            }
        };

        let code = output
            .status
            .code()
            .map_or_else(|| "terminated by signal".to_string(), |c| c.to_string());
        let text = format!(
            "exit code: {code}\nstdout:\n{}\nstderr:\n{}",
            truncate(&String::from_utf8_lossy(&output.stdout), self.max_output_bytes),
            truncate(&String::from_utf8_lossy(&output.stderr), self.max_output_bytes),
        );

        Ok(ToolOutput {
            text,
            images: collect_images(&run_dir),
            is_error: !output.status.success(),
        })
    }
}

#[async_trait]
impl ToolProvider for CodeInterpreter {
    fn tools(&self) -> Vec<ToolSpec> {
        vec![ToolSpec {
            name: TOOL_NAME.to_string(),
            description: "Execute Python code and return its exit code, stdout and stderr. \
                PNG files saved to the working directory are shown to the user."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "code": {"type": "string", "description": "Python source to execute"}
                },
                "required": ["code"]
            }),
        }]
    }

    async fn call(&self, name: &str, arguments: Map<String, Value>) -> ChatResult<ToolOutput> {
        let code = arguments
            .get("code")
            .and_then(Value::as_str)
            .ok_or_else(|| ChatError::InvalidArguments {
                tool: name.to_string(),
                message: "missing string field 'code'".to_string(),
            })?;
        self.run(code).await
    }
}

fn collect_images(dir: &Path) -> Vec<ToolImage> {
    let mut paths: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")))
            .collect(),
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "cannot scan run directory for images");
            return Vec::new();
        }
    };
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| match fs::read(&path) {
            Ok(bytes) => Some(ToolImage::png(
                base64::engine::general_purpose::STANDARD.encode(bytes),
            )),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read image");
                None
            }
        })
        .collect()
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated {} bytes]", &text[..end], text.len() - end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc... [truncated 3 bytes]");
        // 'é' is two bytes
        assert_eq!(truncate("éé", 3), "é... [truncated 2 bytes]");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_script_and_reports_output() {
        let dir = tempfile::tempdir().unwrap();
        let interpreter = CodeInterpreter::new("sh", dir.path()).unwrap();
        let out = interpreter.run("echo hello\necho oops >&2").await.unwrap();
        assert!(!out.is_error);
        assert!(out.text.starts_with("exit code: 0\n"));
        assert!(out.text.contains("stdout:\nhello\n"));
        assert!(out.text.contains("stderr:\noops\n"));
        assert!(out.images.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_an_error_output() {
        let dir = tempfile::tempdir().unwrap();
        let interpreter = CodeInterpreter::new("sh", dir.path()).unwrap();
        let out = interpreter.run("exit 3").await.unwrap();
        assert!(out.is_error);
        assert!(out.text.starts_with("exit code: 3"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_script_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let interpreter = CodeInterpreter::new("sh", dir.path())
            .unwrap()
            .with_timeout(Duration::from_millis(200));
        let out = interpreter.run("sleep 5").await.unwrap();
        assert!(out.is_error);
        assert!(out.text.contains("timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn new_png_files_become_images() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.png"), b"old").unwrap();
        let interpreter = CodeInterpreter::new("sh", dir.path()).unwrap();
        let out = interpreter.run("printf 'PNGDATA' > plot.png").await.unwrap();
        assert_eq!(out.images.len(), 1);
        assert_eq!(out.images[0].mime_type, "image/png");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&out.images[0].data)
            .unwrap();
        assert_eq!(bytes, b"PNGDATA");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn concurrent_runs_keep_their_own_images() {
        let dir = tempfile::tempdir().unwrap();
        let interpreter = CodeInterpreter::new("sh", dir.path()).unwrap();
        let (a, b) = tokio::join!(
            interpreter.run("printf 'AAA' > a.png; sleep 0.2"),
            interpreter.run("printf 'BBB' > b.png; sleep 0.2"),
        );
        for (out, expected) in [(a.unwrap(), b"AAA"), (b.unwrap(), b"BBB")] {
            assert_eq!(out.images.len(), 1);
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&out.images[0].data)
                .unwrap();
            assert_eq!(&bytes, expected);
        }
    }

    #[tokio::test]
    async fn missing_interpreter_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let interpreter = CodeInterpreter::new("/nonexistent/interpreter", dir.path()).unwrap();
        let out = interpreter.run("print(1)").await.unwrap();
        assert!(out.is_error);
        assert!(out.text.contains("cannot run"));
    }

    #[tokio::test]
    async fn call_requires_code_argument() {
        let dir = tempfile::tempdir().unwrap();
        let interpreter = CodeInterpreter::new("sh", dir.path()).unwrap();
        let err = interpreter.call(TOOL_NAME, Map::new()).await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidArguments { .. }));
    }
}
