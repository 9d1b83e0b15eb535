// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Organization model and the ports the application layer drives.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer

pub mod organization;
pub mod agent;
pub mod resolver;
pub mod deployer_config;
pub mod provisioning;
pub mod notification;
pub mod settling;
pub mod events;
