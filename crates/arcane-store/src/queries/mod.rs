// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-collection query modules. All functions take `&Database` and go
//! through the single-writer connection.

pub mod messages;
pub mod players;
pub mod sessions;
pub mod story;
