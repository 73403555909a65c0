// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Billing webhook boundary: signature verification and the idempotent
//! subscription state machine.
//!
//! The payment provider delivers signed events over HTTP. Verification
//! happens against the raw, unparsed body; only verified events reach the
//! state machine, whose handlers assign absolute values so re-delivery
//! converges. Processed event ids are recorded so duplicates are skipped
//! outright.

pub mod event;
pub mod ingestor;
pub mod signature;

pub use event::{BillingEvent, EventKind};
pub use ingestor::{IngestOutcome, WebhookIngestor};
