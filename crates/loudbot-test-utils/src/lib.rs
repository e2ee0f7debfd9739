// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for loudbot.
//!
//! In-memory stand-ins for the adapters so store and agent tests run
//! without disks, databases or networks.
//!
//! # Components
//!
//! - [`MockBackend`] - Message backend with scripted failures and write capture
//! - [`MockChannel`] - Chat channel with event injection and send capture

pub mod mock_backend;
pub mod mock_channel;

pub use mock_backend::MockBackend;
pub use mock_channel::MockChannel;
