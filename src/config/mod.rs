// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod validation;

pub mod consts;

pub(crate) use loader::validate;
pub use loader::{
    load_and_validate_config, load_config, ContextConfig, NodeConfig, NodeKind, ProcessConfig,
};
pub use validation::validate_process_config;
