// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Readable failure text for batch placeholders.
//
// When one item of a batch fails, the batch keeps going and the caller
// receives a placeholder artifact (an error page, or an error text entry in
// the archive) instead of an aborted response. This module produces the
// prose for those placeholders.

use crate::error::QuireError;

/// One-line summary of a failure, suitable for drawing on a placeholder page.
pub fn placeholder_line(filename: &str, err: &QuireError) -> String {
    format!("Error in {filename}: {}", short_reason(err))
}

/// Multi-line report for an `_ERROR.txt` archive entry.
pub fn placeholder_report(filename: &str, err: &QuireError) -> String {
    format!("Failed: {filename}\nReason: {err}\n")
}

/// Compact reason without nested error chains.
fn short_reason(err: &QuireError) -> String {
    match err {
        QuireError::BridgeUnavailable { tool } => {
            format!("required tool '{tool}' is not installed")
        }
        QuireError::BridgeTimeout { tool, .. } => format!("'{tool}' did not finish in time"),
        QuireError::RequiresPassword => "file is password-protected".to_string(),
        QuireError::UnsupportedImageFormat(format) => {
            format!("unsupported image format {format}")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_line_names_the_file() {
        let err = QuireError::BridgeUnavailable { tool: "soffice".into() };
        let line = placeholder_line("budget.xlsx", &err);
        assert!(line.contains("budget.xlsx"));
        assert!(line.contains("soffice"));
    }

    #[test]
    fn report_carries_full_error() {
        let err = QuireError::NoCompressorAvailable;
        let report = placeholder_report("big.pdf", &err);
        assert!(report.starts_with("Failed: big.pdf"));
        assert!(report.contains("no compressor available"));
    }
}
