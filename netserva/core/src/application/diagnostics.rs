// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Diagnostic channel for owner resolution failures
//!
//! Failed resolutions are reported here before the caller receives an absent
//! result. The CLI routes reports to stderr; library users get `tracing`.

use crate::domain::owner::ResolveError;

pub trait DiagnosticSink: Send + Sync {
    fn report(&self, failure: &ResolveError);
}

/// Emits each failure as a `tracing` warning
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, failure: &ResolveError) {
        tracing::warn!(error = %failure, "Owner resolution failed");
    }
}
