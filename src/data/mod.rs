// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Records flowing between nodes.
//!
//! A producer owns a plain value and mutates it at will. Emitting moves that
//! value into a [`Frozen`] handle shared by every consumer, which only ever
//! sees `&T`.

mod frozen;
mod row;

pub use frozen::Frozen;
pub use row::Row;
