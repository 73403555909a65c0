// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Each accepts `&Database` and routes through the
//! single background writer thread.

pub mod chatrooms;
pub mod jobs;
pub mod quota;
pub mod subscriptions;
pub mod webhook_events;

/// Current UTC time as an RFC 3339 string with millisecond precision.
///
/// Matches the `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` format used by the
/// SQL column defaults, so Rust-generated and SQL-generated timestamps
/// compare lexicographically.
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Parse a TEXT column into a strum-backed enum, surfacing failures as a
/// rusqlite conversion error.
pub(crate) fn parse_enum<T>(idx: usize, value: &str) -> Result<T, rusqlite::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
