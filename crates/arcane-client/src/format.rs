// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narration text formatting.

/// Collapses whitespace runs to single spaces and trims the ends.
/// Idempotent under re-application.
pub fn format_narration(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
