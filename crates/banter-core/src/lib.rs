// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core error taxonomy, domain types, and trait seams for the Banter
//! chat backend.
//!
//! Everything that crosses a crate boundary lives here: the `BanterError`
//! taxonomy, the persisted domain shapes (chatrooms, messages, jobs,
//! subscriptions, rate counters), and the [`ReplyProvider`] seam behind
//! which the AI collaborator sits.

pub mod error;
pub mod traits;
pub mod types;

pub use error::BanterError;
pub use traits::provider::ReplyProvider;
