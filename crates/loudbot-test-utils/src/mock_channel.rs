// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable events and
//! captured outbound lines. Clones share both queues.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use loudbot_core::{
    AdapterType, ChannelAdapter, ChannelEvent, HealthStatus, InboundMessage, LoudbotError,
    OutboundMessage, PluginAdapter, Sender,
};

/// A mock chat connection.
///
/// - **inbound**: events injected via `inject()` are returned by `receive()`
/// - **sent**: lines passed to `send()` are captured for `sent_messages()`
#[derive(Clone)]
pub struct MockChannel {
    nickname: String,
    inbound: Arc<Mutex<VecDeque<ChannelEvent>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    notify: Arc<Notify>,
    connected: Arc<Mutex<bool>>,
}

impl MockChannel {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            connected: Arc::new(Mutex::new(false)),
        }
    }

    /// Queues an event for the next `receive()`.
    pub async fn inject(&self, event: ChannelEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Queues a channel line from `nick!user@host`.
    pub async fn inject_line(&self, prefix: &str, channel: &str, text: &str) {
        self.inject(ChannelEvent::Message(InboundMessage {
            sender: Sender::from_prefix(prefix),
            target: channel.to_string(),
            text: text.to_string(),
            private: false,
        }))
        .await;
    }

    /// Queues a private line addressed to the bot.
    pub async fn inject_private(&self, prefix: &str, text: &str) {
        self.inject(ChannelEvent::Message(InboundMessage {
            sender: Sender::from_prefix(prefix),
            target: self.nickname.clone(),
            text: text.to_string(),
            private: true,
        }))
        .await;
    }

    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Text of every sent line, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|m| m.text.clone()).collect()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    pub async fn is_connected(&self) -> bool {
        *self.connected.lock().await
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, LoudbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LoudbotError> {
        *self.connected.lock().await = false;
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), LoudbotError> {
        *self.connected.lock().await = true;
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<(), LoudbotError> {
        self.sent.lock().await.push(msg);
        Ok(())
    }

    async fn receive(&mut self) -> Result<ChannelEvent, LoudbotError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            self.notify.notified().await;
        }
    }

    fn nickname(&self) -> &str {
        &self.nickname
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn receive_returns_events_in_order() {
        let mut channel = MockChannel::new("SUPERLOUD");
        channel.inject(ChannelEvent::Connected).await;
        channel.inject_line("Dude!d@h", "#ngs", "HELLO THERE").await;

        assert_eq!(channel.receive().await.unwrap(), ChannelEvent::Connected);
        match channel.receive().await.unwrap() {
            ChannelEvent::Message(msg) => {
                assert_eq!(msg.sender.nick, "Dude");
                assert_eq!(msg.text, "HELLO THERE");
                assert!(!msg.private);
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn clones_share_sent_capture() {
        let channel = MockChannel::new("SUPERLOUD");
        let observer = channel.clone();
        channel
            .send(OutboundMessage::new("#ngs", "OUTBOUND"))
            .await
            .unwrap();
        assert_eq!(observer.sent_texts().await, vec!["OUTBOUND"]);
        observer.clear_sent().await;
        assert!(channel.sent_messages().await.is_empty());
    }

    #[tokio::test]
    async fn receive_waits_for_injection() {
        let mut channel = MockChannel::new("SUPERLOUD");
        let injector = channel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            injector.inject(ChannelEvent::Heartbeat).await;
        });

        let event = tokio::time::timeout(Duration::from_secs(2), channel.receive())
            .await
            .expect("receive timed out")
            .unwrap();
        assert_eq!(event, ChannelEvent::Heartbeat);
    }

    #[tokio::test]
    async fn private_lines_target_the_bot() {
        let mut channel = MockChannel::new("SUPERLOUD");
        channel.inject_private("Dude!d@h", "psst").await;
        match channel.receive().await.unwrap() {
            ChannelEvent::Message(msg) => {
                assert!(msg.private);
                assert_eq!(msg.reply_target(), "Dude");
            }
            other => panic!("expected message, got {other:?}"),
        }
    }
}
