// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for loudbot.
//!
//! This crate provides the adapter traits, the error taxonomy and the
//! record types shared by the message store, the storage backends and the
//! chat channel.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LoudbotError;
pub use types::{
    AdapterType, AssignedId, BackendKind, ChannelEvent, HealthStatus, InboundMessage,
    MessageRecord, OutboundMessage, Sender, WriteBatch,
};

pub use traits::{ChannelAdapter, MessageBackend, PluginAdapter};
