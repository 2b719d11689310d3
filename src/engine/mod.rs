// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod adapter;
pub mod ports;
pub mod process;
pub mod report;
#[cfg(test)]
mod integration_tests;

pub use adapter::{BroadcastAdapter, IoAdapter};
pub use ports::{InputPort, InputSlot, InputStream, OutputPort};
pub use process::{ContextInitializer, EtlProcess, NodeRef, ProcessBuilder, ProcessSettings};
pub use report::{NodeReport, ProcessReport};
