//! Local enhancement engines run as subprocesses.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::enhancer::Enhancer;
use crate::error::{EngineError, EngineResult};

/// How many trailing stderr bytes to keep for error reporting.
const STDERR_TAIL_BYTES: usize = 4096;

/// Runs a local enhancement program once per segment.
///
/// The program is expected to read `--input`, write its result to
/// `--output` under the same file name, and exit zero. The tuning flags
/// mirror what diffusion-based speech enhancement models take.
#[derive(Debug, Clone)]
pub struct CommandEnhancer {
    program: PathBuf,
    checkpoint: Option<PathBuf>,
    iterations: u32,
    snr: f64,
    device: String,
    extra_args: Vec<String>,
    timeout_secs: Option<u64>,
}

impl CommandEnhancer {
    /// Create an enhancer for `program` with default tuning.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            checkpoint: None,
            iterations: 50,
            snr: 0.33,
            device: "cuda".to_string(),
            extra_args: Vec::new(),
            timeout_secs: None,
        }
    }

    /// Set the model checkpoint passed as `--ckpt`.
    pub fn with_checkpoint(mut self, checkpoint: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(checkpoint.into());
        self
    }

    /// Set the reverse diffusion step count passed as `--N`.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the SNR parameter passed as `--snr`.
    pub fn with_snr(mut self, snr: f64) -> Self {
        self.snr = snr;
        self
    }

    /// Set the compute device passed as `--device`.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Append free-form arguments after the standard ones.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Set a per-invocation timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    fn build_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "--input".to_string(),
            input.to_string_lossy().to_string(),
            "--output".to_string(),
            output.to_string_lossy().to_string(),
        ];
        if let Some(ckpt) = &self.checkpoint {
            args.push("--ckpt".to_string());
            args.push(ckpt.to_string_lossy().to_string());
        }
        args.push("--N".to_string());
        args.push(self.iterations.to_string());
        args.push("--snr".to_string());
        args.push(self.snr.to_string());
        args.push("--device".to_string());
        args.push(self.device.clone());
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl Enhancer for CommandEnhancer {
    async fn enhance(&self, input: &Path, output: &Path) -> EngineResult<()> {
        let program = which::which(&self.program)
            .map_err(|_| EngineError::ProgramNotFound(self.program.display().to_string()))?;

        let args = self.build_args(input, output);
        debug!(
            "Running engine: {} {}",
            program.display(),
            args.join(" ")
        );

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let result = match self.timeout_secs {
            Some(secs) => {
                match tokio::time::timeout(
                    std::time::Duration::from_secs(secs),
                    child.wait_with_output(),
                )
                .await
                {
                    Ok(result) => result?,
                    // kill_on_drop reaps the child when the future is dropped.
                    Err(_) => return Err(EngineError::Timeout(secs)),
                }
            }
            None => child.wait_with_output().await?,
        };

        if result.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail_start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
            Err(EngineError::invocation_failed(
                "engine exited with non-zero status",
                Some(stderr[tail_start..].to_string()),
                result.status.code(),
            ))
        }
    }

    fn label(&self) -> &'static str {
        "command"
    }
}
