// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field-level JSON document merging.
//!
//! Merge writes never overwrite a whole document: objects merge per key
//! (recursively), while scalars and arrays replace the existing value.
//! This matches the set-with-merge contract the command handlers and the
//! narration handler rely on.

use serde_json::Value;

/// Merges `patch` into `base` in place.
///
/// Object values merge recursively; any other value (including arrays)
/// replaces the existing one. Keys absent from `patch` are untouched.
pub fn merge_document(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.get_mut(key) {
                    Some(slot) if slot.is_object() && patch_value.is_object() => {
                        merge_document(slot, patch_value);
                    }
                    _ => {
                        base_map.insert(key.clone(), patch_value.clone());
                    }
                }
            }
        }
        (base_slot, patch_value) => {
            *base_slot = patch_value.clone();
        }
    }
}
