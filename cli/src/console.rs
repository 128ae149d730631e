// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Terminal output for resolution failures

use colored::Colorize;
use std::io::Write;
use std::sync::Mutex;

use netserva_core::application::diagnostics::DiagnosticSink;
use netserva_core::domain::owner::ResolveError;

/// Writes each failure as a red line, to stderr unless told otherwise
pub struct ConsoleDiagnostics {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleDiagnostics {
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out: Mutex::new(out) }
    }
}

impl Default for ConsoleDiagnostics {
    fn default() -> Self {
        Self::stderr()
    }
}

impl DiagnosticSink for ConsoleDiagnostics {
    fn report(&self, failure: &ResolveError) {
        if let Ok(mut out) = self.out.lock() {
            // Nowhere left to report a failed write
            let _ = writeln!(out, "{}", failure.to_string().red());
        }
    }
}
