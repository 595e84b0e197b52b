// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page selector parsing.
//
// Callers address pages with a compact 1-based range syntax ("2,4-6").
// Parsing happens once, at the operation boundary; the document model only
// ever sees validated 0-based indices. Invalid or out-of-range tokens are
// dropped silently — the selector is best-effort by contract, not strict.

/// A parsed, order-preserving page selection, validated against a live
/// page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelector {
    groups: Vec<Vec<usize>>,
}

impl PageSelector {
    /// Parse `spec` into ordered page groups, one group per comma-separated
    /// token. `"1-1,2-2"` yields two single-page groups; `"2,4-6"` yields
    /// `[2]` and `[4,5,6]`. Range bounds are clamped to `[1, page_count]`;
    /// tokens that are not numbers or ranges are dropped. An empty spec
    /// yields one group per page.
    ///
    /// All indices in the result are 0-based.
    pub fn parse_groups(spec: &str, page_count: usize) -> Self {
        let mut groups = Vec::new();
        for token in spec.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if let Some(group) = parse_group(token, page_count) {
                groups.push(group);
            }
        }
        if groups.is_empty() {
            groups = (0..page_count).map(|i| vec![i]).collect();
        }
        Self { groups }
    }

    /// Parse `spec` into a flat, order-preserving sequence of 0-based
    /// indices, deduplicated. Empty spec yields an empty sequence.
    pub fn parse_sequence(spec: &str, page_count: usize) -> Vec<usize> {
        let mut seen = vec![false; page_count];
        let mut sequence = Vec::new();
        for token in spec.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if let Ok(number) = token.parse::<usize>() {
                if number >= 1 && number <= page_count && !seen[number - 1] {
                    seen[number - 1] = true;
                    sequence.push(number - 1);
                }
            }
        }
        sequence
    }

    /// Parse `spec` into a membership set of 0-based indices. Invalid and
    /// out-of-range tokens are dropped.
    pub fn parse_set(spec: &str, page_count: usize) -> std::collections::HashSet<usize> {
        Self::parse_sequence(spec, page_count).into_iter().collect()
    }

    /// Ordered page groups, 0-based.
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Parse one token: either a single page number or an `a-b` range.
/// Returns None for anything unparseable or entirely out of range.
fn parse_group(token: &str, page_count: usize) -> Option<Vec<usize>> {
    if page_count == 0 {
        return None;
    }
    if let Some((start, end)) = token.split_once('-') {
        let start: usize = start.trim().parse().ok()?;
        let end: usize = end.trim().parse().ok()?;
        if start == 0 || end == 0 || start > end || start > page_count {
            return None;
        }
        let start = start.max(1) - 1;
        let end = end.min(page_count) - 1;
        Some((start..=end).collect())
    } else {
        let number: usize = token.trim().parse().ok()?;
        if number >= 1 && number <= page_count {
            Some(vec![number - 1])
        } else {
            None
        }
    }
}
