// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quire — Core types, error taxonomy, and parameter parsing shared across all crates.

pub mod config;
pub mod describe;
pub mod error;
pub mod overlay;
pub mod selector;
pub mod types;

pub use config::EngineConfig;
pub use error::{QuireError, Result};
pub use overlay::OverlayOp;
pub use selector::PageSelector;
pub use types::*;
