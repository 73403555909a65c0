// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `banter-core::types` for use across
//! crate boundaries. This module re-exports them for convenience within
//! the storage crate.

pub use banter_core::types::{
    Chatroom, ChatroomSummary, Job, JobPayload, JobState, Message, Plan, RateCounter, Sender,
    Subscription, SubscriptionStatus,
};
