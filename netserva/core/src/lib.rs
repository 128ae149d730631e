// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! NetServa Core
//!
//! Fleet domain model (Venue → VSite → VNode → VHost), owner resolution for
//! credential commands, and the storage backends behind them.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Shared by every NetServa command surface

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
