use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::config::STDERR_LOG_LIMIT;
use crate::error::AttemptError;
use crate::formats::InvocationRequest;

/// Captured result of one finished process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs one attempt of a request against the external executable
///
/// Implementations must return within roughly `timeout` and must not leave the
/// attempt's process running when they return.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(
        &self,
        request: &InvocationRequest,
        timeout: Duration,
    ) -> Result<ProcessOutput, AttemptError>;
}

/// Invoker that spawns a fresh child process per attempt
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    command: PathBuf,
    args: Vec<String>,
}

impl ProcessInvoker {
    pub fn new(command: impl AsRef<Path>, args: Vec<String>) -> Self {
        Self {
            command: command.as_ref().to_path_buf(),
            args,
        }
    }

    fn spawn(&self) -> Result<Child, AttemptError> {
        Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AttemptError::Spawn {
                command: self.command.display().to_string(),
                source,
            })
    }

    /// Feed the request, close stdin, and collect both output streams until exit
    async fn exchange(child: &mut Child, payload: &[u8]) -> Result<ProcessOutput, AttemptError> {
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let feed = async move {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(payload).await {
                    // The child may exit without reading its input
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                    other => other?,
                }
                // Dropping stdin closes the pipe and signals end of input
            }
            Ok::<_, std::io::Error>(())
        };

        let (_, stdout, stderr, status) =
            tokio::try_join!(feed, drain(stdout), drain(stderr), child.wait())?;

        Ok(ProcessOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

#[async_trait]
impl Invoker for ProcessInvoker {
    async fn invoke(
        &self,
        request: &InvocationRequest,
        timeout: Duration,
    ) -> Result<ProcessOutput, AttemptError> {
        let mut child = self.spawn()?;
        debug!(
            "Job {}: spawned pid {:?}, sending '{}'",
            request.job_id,
            child.id(),
            request.line()
        );

        let result =
            tokio::time::timeout(timeout, Self::exchange(&mut child, request.as_bytes())).await;

        match result {
            Ok(Ok(output)) => {
                if output.exit_code != Some(0) {
                    warn!(
                        "Job {}: process exited with code {:?}",
                        request.job_id, output.exit_code
                    );
                }
                if !output.stderr.is_empty() {
                    let end = output.stderr.len().min(STDERR_LOG_LIMIT);
                    debug!(
                        "Job {}: stderr: {}",
                        request.job_id,
                        String::from_utf8_lossy(&output.stderr[..end])
                    );
                }
                Ok(output)
            }
            Ok(Err(e)) => {
                // Pipe failure; make sure the child does not outlive the attempt
                let _ = child.kill().await;
                Err(e)
            }
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Job {}: failed to kill timed out process: {}", request.job_id, e);
                }
                Err(AttemptError::Timeout(timeout))
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> ProcessInvoker {
        ProcessInvoker::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_request_reaches_stdin() {
        let invoker = shell("cat");
        let request = InvocationRequest::new(1, &[1.5, 2.0, 3.25]);

        let output = invoker
            .invoke(&request, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout, b"3 1.5 2.0 3.25");
    }

    #[tokio::test]
    async fn test_stderr_captured_separately() {
        let invoker = shell("read line; echo \"out $line\"; echo oops >&2");
        let request = InvocationRequest::new(1, &[4.0]);

        let output = invoker
            .invoke(&request, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(output.stdout, b"out 1 4.0\n");
        assert_eq!(output.stderr, b"oops\n");
    }

    #[tokio::test]
    async fn test_child_ignoring_stdin() {
        let invoker = shell("echo done");
        let request = InvocationRequest::new(1, &[1.0, 2.0]);

        let output = invoker
            .invoke(&request, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(output.stdout, b"done\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_still_returns_output() {
        let invoker = shell("echo partial; exit 3");
        let request = InvocationRequest::new(1, &[]);

        let output = invoker
            .invoke(&request, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, b"partial\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let invoker = shell("exec sleep 30");
        let request = InvocationRequest::new(1, &[]);

        let started = std::time::Instant::now();
        let err = invoker
            .invoke(&request, Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(err.is_timeout(), "expected timeout, got {err}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let invoker = ProcessInvoker::new("/nonexistent/game-binary", Vec::new());
        let request = InvocationRequest::new(1, &[]);

        let err = invoker
            .invoke(&request, Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, AttemptError::Spawn { .. }));
    }
}
