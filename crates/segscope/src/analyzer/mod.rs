use std::{process::Stdio, time::Duration};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, DuplexStream},
    process::{Child, Command},
};

use crate::{
    error::{SegscopeError, SegscopeResult},
    util::string_tail,
};

pub mod container;
pub mod duration;
pub mod transport;

/// An external analyzer fed with one copy of a segment's byte stream.
///
/// Implementations must fully drain `input` even when they fail
/// internally, so that the byte tee feeding all analyzers never blocks on
/// a sibling that gave up early.
pub trait Analyzer: Send + Sync + 'static {
    type Report: Send + 'static;

    /// Analyzer name used in error and log messages.
    const NAME: &'static str;

    fn run(
        &self,
        input: DuplexStream,
    ) -> impl std::future::Future<Output = SegscopeResult<Self::Report>> + Send;
}

/// Splits a configured command string into an executable and its leading
/// arguments, e.g. `"tsreport -legacy"`. The executable is resolved
/// through `PATH`.
pub(crate) fn build_command(command: &str, analyzer: &'static str) -> SegscopeResult<Command> {
    let parts = shlex::split(command).ok_or_else(|| SegscopeError::AnalyzerError {
        analyzer,
        message: format!("invalid command string {command:?}"),
    })?;
    let (program, args) = parts
        .split_first()
        .ok_or_else(|| SegscopeError::AnalyzerError {
            analyzer,
            message: "empty command string".to_string(),
        })?;

    let program = which::which(program)?;
    let mut cmd = Command::new(program);
    cmd.args(args);
    // in-flight inspections may be dropped on cancellation
    cmd.kill_on_drop(true);
    Ok(cmd)
}

/// Runs the command with the segment bytes piped to its stdin and returns
/// the combined stdout/stderr output.
pub(crate) async fn run_with_stdin(
    mut cmd: Command,
    mut input: DuplexStream,
    analyzer: &'static str,
    timeout: Duration,
) -> SegscopeResult<String> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn()?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| SegscopeError::AnalyzerError {
            analyzer,
            message: "stdin was not captured".to_string(),
        })?;

    // Feed the child, then keep draining after it stops reading so the
    // upstream tee never blocks on this analyzer.
    let pump = tokio::spawn(async move {
        if let Err(error) = tokio::io::copy(&mut input, &mut stdin).await {
            tracing::debug!("{analyzer} stopped reading its stdin: {error}");
        }
        drop(stdin);
        let _ = tokio::io::copy(&mut input, &mut tokio::io::sink()).await;
    });

    let output = wait_with_output(child, analyzer, timeout).await;
    if output.is_ok() {
        let _ = pump.await;
    }
    // on failure the pump task keeps draining in the background
    output
}

/// Spools the segment bytes to a temporary file and runs the command on
/// its path, for analyzers that need a seekable input.
pub(crate) async fn run_with_temp_file(
    mut cmd: Command,
    mut input: DuplexStream,
    analyzer: &'static str,
    timeout: Duration,
) -> SegscopeResult<String> {
    let temp = tempfile::Builder::new()
        .prefix("segscope-")
        .tempfile()
        .map_err(SegscopeError::IOError)?;

    let mut file = tokio::fs::File::from_std(temp.reopen()?);
    if let Err(error) = tokio::io::copy(&mut input, &mut file).await {
        let _ = tokio::io::copy(&mut input, &mut tokio::io::sink()).await;
        return Err(error.into());
    }
    file.flush().await?;
    drop(file);

    cmd.arg(temp.path());
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let child = cmd.spawn()?;
    wait_with_output(child, analyzer, timeout).await
}

async fn wait_with_output(
    mut child: Child,
    analyzer: &'static str,
    timeout: Duration,
) -> SegscopeResult<String> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    let run = async {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let (status, _, _) = tokio::join!(
            child.wait(),
            async {
                if let Some(stdout) = stdout.as_mut() {
                    let _ = stdout.read_to_end(&mut out).await;
                }
            },
            async {
                if let Some(stderr) = stderr.as_mut() {
                    let _ = stderr.read_to_end(&mut err).await;
                }
            }
        );
        (status, out, err)
    };
    let result = tokio::time::timeout(timeout, run).await;

    let (status, out, err) = match result {
        Ok(finished) => finished,
        Err(_) => {
            let _ = child.kill().await;
            return Err(SegscopeError::AnalyzerTimeout { analyzer, timeout });
        }
    };
    let status = status?;

    let mut combined = String::from_utf8_lossy(&out).into_owned();
    combined.push_str(&String::from_utf8_lossy(&err));
    let combined = combined.trim().to_string();

    if !status.success() {
        return Err(SegscopeError::AnalyzerError {
            analyzer,
            message: format!("{status}: {}", string_tail(&combined, 512)),
        });
    }

    Ok(combined)
}
