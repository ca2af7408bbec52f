// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collision-checked session code generation.

use rand::Rng;

use arcane_core::ArcaneError;
use arcane_core::code::{CODE_ALPHABET, CODE_LENGTH};
use arcane_store::DocumentStore;

/// Retry budget bounds tail latency when the code space is contended.
const MAX_ATTEMPTS: u32 = 10;

/// Generates a session code guaranteed not to collide with any existing
/// session, failing with `Internal` once the retry budget is exhausted.
pub async fn generate_session_code(store: &DocumentStore) -> Result<String, ArcaneError> {
    generate_with(store, draw_code).await
}

fn draw_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

async fn generate_with(
    store: &DocumentStore,
    mut draw: impl FnMut() -> String,
) -> Result<String, ArcaneError> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = draw();
        if store.find_session_by_code(&candidate).await?.is_none() {
            return Ok(candidate);
        }
    }
    Err(ArcaneError::Internal(
        "unable to generate session code".to_string(),
    ))
}
