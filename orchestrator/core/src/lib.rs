// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! orgdeploy core
//!
//! Deploys a multi-agent organization (organization board, groups, subgroup
//! links, role assignments, scheme and normative board) onto a workspace
//! runtime reachable over HTTP.
//!
//! # Architecture
//!
//! - **domain:** organization model, subgroup resolver, provisioning port,
//!   settling policy, configuration manifest, events
//! - **application:** phase execution and the deploy / bootstrap use cases
//! - **infrastructure:** HTTP runtime client, event bus, manifest parser

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
