// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The loudbot message store.
//!
//! [`MessageStore`] owns the in-memory message set, hands out random
//! messages from a shuffled working set, applies votes and writes pending
//! changes through a [`loudbot_core::MessageBackend`] when flushed.

pub mod message;
pub mod store;

pub use message::Message;
pub use store::{MessageStore, StoreOptions, StoreStats, VoteOutcome};
