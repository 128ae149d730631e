// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Fleet aggregates, owner references and persistence contracts

pub mod fleet;
pub mod owner;
pub mod repository;
pub mod config;
