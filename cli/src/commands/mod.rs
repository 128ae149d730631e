// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for NetServa CLI

pub mod config;
pub mod fleet;
pub mod owner;
pub mod update;

pub use self::config::ConfigCommand;
pub use self::fleet::FleetCommand;
pub use self::owner::OwnerCommand;
pub use self::update::UpdateCommand;
