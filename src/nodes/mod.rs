// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in nodes over [`Row`](crate::data::Row) records, and the factory
//! that builds a process graph out of them from a process definition.

mod collect;
mod factory;
mod merge;
mod project;
mod rows;
mod sequence;
#[cfg(test)]
pub mod stub;

pub use collect::CollectSink;
pub use factory::NodeFactory;
pub use merge::MergeNode;
pub use project::ProjectTransform;
pub use rows::RowsSource;
pub use sequence::SequenceSource;
