// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deferred removal of intermediate files.
//
// Bridge operations leave scratch files behind; those are deleted shortly
// after the response has been produced. Deletion is best-effort: a file that
// is already gone, or a directory we cannot remove, is logged and forgotten.
// Nothing ever waits on cleanup.

use std::path::PathBuf;
use std::time::Duration;

use quire_core::EngineConfig;
use tracing::{debug, trace};

/// Schedule best-effort deletion of the given paths after the configured
/// delay. Returns immediately.
pub fn schedule_removal(config: &EngineConfig, paths: Vec<PathBuf>) {
    if paths.is_empty() {
        return;
    }
    let delay = Duration::from_secs(config.cleanup_delay_secs);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        for path in paths {
            let outcome = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match outcome {
                Ok(()) => trace!(path = %path.display(), "intermediate removed"),
                Err(err) => debug!(path = %path.display(), %err, "cleanup skipped"),
            }
        }
    });
}
