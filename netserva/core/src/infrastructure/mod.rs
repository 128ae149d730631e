// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod db;
pub mod fleet_inventory;
pub mod repositories;

pub use fleet_inventory::{FleetInventory, InventoryError, InventorySummary};
