// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Arcane Relay integration tests.

pub mod harness;

pub use harness::{TestHarness, TestHarnessBuilder};
