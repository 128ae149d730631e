// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod diagnostics;
pub mod owner_resolver;
pub mod repository_factory;

// Re-export use cases for convenience
pub use diagnostics::{DiagnosticSink, TracingDiagnostics};
pub use owner_resolver::{ResolveOwnerUseCase, StandardOwnerResolver};
