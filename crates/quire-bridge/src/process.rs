// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared subprocess runner for all bridges.

use std::ffi::OsString;
use std::time::Duration;

use quire_core::error::{QuireError, Result};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Captured output of a completed tool run.
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Run an external tool to completion with a hard timeout.
///
/// Error mapping:
/// - binary not found on PATH        -> `BridgeUnavailable`
/// - wall-clock limit exceeded       -> `BridgeTimeout` (the child is killed)
/// - nonzero exit                    -> `BridgeFailed` with the stderr tail
#[instrument(skip(args), fields(tool, args_len = args.len()))]
pub async fn run_tool(tool: &str, args: &[OsString], timeout_secs: u64) -> Result<ToolOutput> {
    let mut command = Command::new(tool);
    command.args(args).kill_on_drop(true);

    let run = async {
        command.output().await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                QuireError::BridgeUnavailable { tool: tool.to_string() }
            } else {
                QuireError::BridgeFailed {
                    tool: tool.to_string(),
                    detail: err.to_string(),
                }
            }
        })
    };

    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), run)
        .await
        .map_err(|_| {
            warn!(tool, timeout_secs, "tool timed out, killing");
            QuireError::BridgeTimeout {
                tool: tool.to_string(),
                seconds: timeout_secs,
            }
        })??;

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
        return Err(QuireError::BridgeFailed {
            tool: tool.to_string(),
            detail: stderr_tail(&stderr, output.status.code()),
        });
    }

    debug!(tool, stdout_len = output.stdout.len(), "tool finished");
    Ok(ToolOutput {
        stdout: output.stdout,
        stderr,
    })
}

/// Last few stderr lines plus the exit code, compact enough for an error.
fn stderr_tail(stderr: &str, code: Option<i32>) -> String {
    let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
    let tail: Vec<&str> = tail.into_iter().rev().collect();
    match code {
        Some(code) => format!("exit code {code}: {}", tail.join(" | ")),
        None => format!("killed by signal: {}", tail.join(" | ")),
    }
}

/// Build an argument vector from mixed path/string pieces.
#[macro_export]
macro_rules! tool_args {
    ($($piece:expr),* $(,)?) => {
        vec![$(::std::ffi::OsString::from($piece)),*]
    };
}
