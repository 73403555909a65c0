// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the core pipeline and its external collaborators.

pub mod provider;
