// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client core for Arcane Relay.
//!
//! Everything a front end needs short of rendering: a typed API client
//! for the command endpoints, the GM narration stream consumer, the live
//! subscription aggregator, and the game-state store the other three feed
//! into.

pub mod api;
pub mod format;
pub mod state;
pub mod stream;
pub mod subscriptions;

pub use api::ApiClient;
pub use format::format_narration;
pub use state::{GameSnapshot, GameStore, PersistedSessionRef};
pub use stream::{GmStreamController, GmStreamHandle, connect};
pub use subscriptions::SubscriptionAggregator;
