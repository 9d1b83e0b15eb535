// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod event_bus;
pub mod runtime_client;
pub mod organization_parser;

pub use organization_parser::{OrganizationManifest, ManifestError};
