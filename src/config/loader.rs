// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::DEFAULT_PROCESS_NAME;
use crate::config::validation::validate_process_config;
use crate::errors::ConfigError;
use crate::observability::messages::config::{ConfigLoaded, ValidationFailed};
use crate::observability::messages::StructuredLog;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Definition of an ETL process graph.
///
/// Typically loaded from a YAML file; a `.toml` extension selects TOML.
///
/// # Fields
/// * `name` - Process name used in logs and the run report
/// * `cancel_on_failure` - Stop the remaining nodes once one fails (default `false`)
/// * `context` - Settings and state seeded into the pipeline context
/// * `nodes` - Node definitions; `inputs` order is slot order
///
/// # Example
/// ```yaml
/// name: customers
/// cancel_on_failure: true
/// context:
///   config:
///     region: eu-west-1
///   pool_capacity: 512
/// nodes:
///   - id: customers
///     type: rows
///     rows:
///       - { id: 1, name: ada }
///       - { id: 2, name: grace }
///   - id: names
///     type: project
///     columns: [name]
///     inputs: [customers]
///   - id: sink
///     type: collect
///     keep: true
///     inputs: [names]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessConfig {
    #[serde(default = "default_process_name")]
    pub name: String,
    #[serde(default)]
    pub cancel_on_failure: bool,
    #[serde(default)]
    pub context: ContextConfig,
    pub nodes: Vec<NodeConfig>,
}

/// Values the pipeline context starts with.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextConfig {
    #[serde(default)]
    pub config: HashMap<String, String>,
    #[serde(default)]
    pub state: HashMap<String, Value>,
    /// Upper bound on idle pooled rows; defaults to
    /// [`DEFAULT_POOL_CAPACITY`](crate::config::consts::DEFAULT_POOL_CAPACITY).
    pub pool_capacity: Option<usize>,
}

/// One node of the graph.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Ids of the nodes this one reads from; the first fills the primary
    /// input slot, the second the secondary one.
    #[serde(default)]
    pub inputs: Vec<String>,
}

/// The built-in node types.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Emit the listed rows.
    Rows { rows: Vec<Map<String, Value>> },
    /// Emit `count` rows numbered in `field`.
    Sequence {
        count: u64,
        #[serde(default = "default_sequence_field")]
        field: String,
    },
    /// Keep only `columns`.
    Project { columns: Vec<String> },
    /// Forward both inputs in arrival order.
    Merge,
    /// Count rows; optionally keep them or recycle them to the pool.
    Collect {
        #[serde(default)]
        keep: bool,
        #[serde(default)]
        recycle: bool,
    },
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Rows { .. } => "rows",
            NodeKind::Sequence { .. } => "sequence",
            NodeKind::Project { .. } => "project",
            NodeKind::Merge => "merge",
            NodeKind::Collect { .. } => "collect",
        }
    }

    pub fn has_output(&self) -> bool {
        !matches!(self, NodeKind::Collect { .. })
    }

    /// Number of inputs this node type must be given.
    pub fn input_count(&self) -> usize {
        match self {
            NodeKind::Rows { .. } | NodeKind::Sequence { .. } => 0,
            NodeKind::Project { .. } | NodeKind::Collect { .. } => 1,
            NodeKind::Merge => 2,
        }
    }
}

fn default_process_name() -> String {
    DEFAULT_PROCESS_NAME.to_string()
}

fn default_sequence_field() -> String {
    "n".to_string()
}

impl ProcessConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Read a process definition. `.toml` files are parsed as TOML, anything
/// else as YAML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ProcessConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .map(|extension| extension.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    let config = if is_toml {
        ProcessConfig::from_toml(&content)?
    } else {
        ProcessConfig::from_yaml(&content)?
    };

    ConfigLoaded {
        path: &path.display().to_string(),
        process: &config.name,
        node_count: config.nodes.len(),
    }
    .log();
    Ok(config)
}

/// Read a process definition and check its graph.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<ProcessConfig, ConfigError> {
    let config = load_config(path)?;
    validate(&config)?;
    Ok(config)
}

pub(crate) fn validate(config: &ProcessConfig) -> Result<(), ConfigError> {
    validate_process_config(config).map_err(|errors| {
        ValidationFailed {
            process: &config.name,
            errors: &errors,
        }
        .log();
        ConfigError::Validation(errors)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    const PIPELINE_YAML: &str = r#"
name: customers
cancel_on_failure: true
context:
  config:
    region: eu-west-1
  state:
    batch: 7
  pool_capacity: 64
nodes:
  - id: customers
    type: rows
    rows:
      - { id: 1, name: ada }
  - id: numbers
    type: sequence
    count: 10
  - id: both
    type: merge
    inputs: [customers, numbers]
  - id: sink
    type: collect
    keep: true
    inputs: [both]
"#;

    #[test]
    fn test_parse_yaml_definition() {
        let config = ProcessConfig::from_yaml(PIPELINE_YAML).unwrap();

        assert_eq!(config.name, "customers");
        assert!(config.cancel_on_failure);
        assert_eq!(config.context.config["region"], "eu-west-1");
        assert_eq!(config.context.state["batch"], 7);
        assert_eq!(config.context.pool_capacity, Some(64));
        assert_eq!(config.nodes.len(), 4);
        assert_eq!(
            config.nodes[1].kind,
            NodeKind::Sequence {
                count: 10,
                field: "n".to_string()
            }
        );
        assert_eq!(config.nodes[2].inputs, vec!["customers", "numbers"]);
        assert_eq!(
            config.nodes[3].kind,
            NodeKind::Collect {
                keep: true,
                recycle: false
            }
        );
    }

    #[test]
    fn test_defaults_apply() {
        let config = ProcessConfig::from_yaml("nodes: []").unwrap();
        assert_eq!(config.name, DEFAULT_PROCESS_NAME);
        assert!(!config.cancel_on_failure);
        assert!(config.context.config.is_empty());
        assert_eq!(config.context.pool_capacity, None);
    }

    #[test]
    fn test_unknown_node_type_is_rejected() {
        let result = ProcessConfig::from_yaml(
            r#"
nodes:
  - id: x
    type: teleport
"#,
        );
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_load_toml_by_extension() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
name = "numbers"

[[nodes]]
id = "numbers"
type = "sequence"
count = 3
field = "i"

[[nodes]]
id = "sink"
type = "collect"
inputs = ["numbers"]
"#
        )
        .unwrap();

        let config = load_and_validate_config(file.path()).unwrap();
        assert_eq!(config.name, "numbers");
        assert_eq!(config.nodes[0].kind.type_name(), "sequence");
        assert_eq!(config.nodes[1].inputs, vec!["numbers"]);
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PIPELINE_YAML.as_bytes()).unwrap();

        let config = load_and_validate_config(file.path()).unwrap();
        assert_eq!(config.nodes.len(), 4);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_config("/definitely/not/here.yaml").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with("here.yaml")),
            other => panic!("expected Io error, got {}", other),
        }
    }

    #[test]
    fn test_invalid_graph_fails_validation() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
nodes:
  - id: sink
    type: collect
    inputs: [ghost]
"#,
        )
        .unwrap();

        let err = load_and_validate_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(errors) if errors.len() == 1));
    }
}
