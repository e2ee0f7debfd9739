// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for chat protocol integrations (IRC).

use async_trait::async_trait;

use crate::error::LoudbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelEvent, OutboundMessage};

/// Adapter for a bidirectional chat connection.
///
/// Channel adapters connect the bot to a chat network, delivering events
/// one at a time and sending replies.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes the connection and registers with the server.
    async fn connect(&mut self) -> Result<(), LoudbotError>;

    /// Sends a chat line.
    async fn send(&self, msg: OutboundMessage) -> Result<(), LoudbotError>;

    /// Waits for the next event from the network.
    async fn receive(&mut self) -> Result<ChannelEvent, LoudbotError>;

    /// Returns the nickname the bot is currently using.
    fn nickname(&self) -> &str;
}
