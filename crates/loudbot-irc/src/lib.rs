// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! IRC channel adapter for loudbot.
//!
//! Wraps an `irc` client over plain TCP or TLS: registers, joins the
//! configured channels, follows invites, answers server PINGs and turns
//! PRIVMSGs into [`loudbot_core::ChannelEvent`]s.

pub mod adapter;

pub use adapter::IrcChannel;
