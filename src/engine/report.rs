// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::traits::NodeId;

/// Outcome of one node that completed successfully.
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// Records delivered through the node's broadcast adapter. `None` when
    /// nothing was attached to the output: such a port drops what it is given
    /// and the report does not count those records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emitted: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
}

/// Result of a process run in which every node completed.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub process: String,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// In registration order.
    pub nodes: Vec<NodeReport>,
}

impl ProcessReport {
    pub fn node(&self, id: NodeId) -> Option<&NodeReport> {
        self.nodes.iter().find(|report| report.id == id)
    }

    /// First node with the given name. Names need not be unique.
    pub fn node_named(&self, name: &str) -> Option<&NodeReport> {
        self.nodes.iter().find(|report| report.name == name)
    }

    pub fn summary(&self, id: NodeId) -> Option<&Value> {
        self.node(id).and_then(|report| report.summary.as_ref())
    }
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_serializes_without_empty_fields() {
        let id = NodeId::next();
        let report = ProcessReport {
            process: "orders".to_string(),
            elapsed: Duration::from_millis(12),
            nodes: vec![NodeReport {
                id,
                name: "sink".to_string(),
                elapsed: Duration::from_millis(3),
                emitted: None,
                summary: Some(json!({ "rows": 2 })),
            }],
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["elapsed_ms"], 12);
        assert_eq!(value["nodes"][0]["id"], id.as_u64());
        assert!(value["nodes"][0].get("emitted").is_none());
        assert_eq!(report.summary(id), Some(&json!({ "rows": 2 })));
        assert!(report.node_named("sink").is_some());
    }
}
