// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end tests of graph wiring and process execution.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;

use crate::context::{NullLoggerFactory, PipelineContext};
use crate::data::Row;
use crate::engine::{EtlProcess, InputSlot, ProcessBuilder, ProcessSettings};
use crate::errors::{FailureKind, PipelineError};
use crate::nodes::stub::{
    FailingSource, PanickingNode, ProbeNode, SilentSource, TextProbe, TwoFacedSource,
};
use crate::nodes::{CollectSink, MergeNode, ProjectTransform, RowsSource, SequenceSource};
use crate::traits::{Node, NodeWithInput};

const WAIT: Duration = Duration::from_secs(10);

fn process(name: &str) -> EtlProcess {
    ProcessBuilder::new(name)
        .logger_factory(Arc::new(NullLoggerFactory))
        .build()
}

fn letters() -> RowsSource {
    RowsSource::from_values("letters", "letter", ["a", "b", "c"])
}

#[tokio::test]
async fn test_broadcast_reaches_every_sink() {
    let mut process = process("broadcast");
    let source = process.register(letters());
    let first = process.register(CollectSink::new("first").keeping_rows(true));
    let second = process.register(CollectSink::new("second").keeping_rows(true));

    assert!(process.attach_input_to_output::<Row, _, _>(&source, &first).unwrap());
    assert!(process.attach_input_to_output::<Row, _, _>(&source, &second).unwrap());
    assert_eq!(process.adapter_count(), 1);
    assert_eq!(process.consumers_of(source.id()), vec![first.id(), second.id()]);

    let report = timeout(WAIT, process.execute()).await.unwrap().unwrap();

    assert_eq!(report.node(source.id()).unwrap().emitted, Some(3));
    for sink in [first.id(), second.id()] {
        let summary = report.summary(sink).unwrap();
        assert_eq!(summary["rows"], 3);
        assert_eq!(
            summary["data"],
            json!([{ "letter": "a" }, { "letter": "b" }, { "letter": "c" }])
        );
    }
    let names: Vec<&str> = report.nodes.iter().map(|node| node.name.as_str()).collect();
    assert_eq!(names, vec!["letters", "first", "second"]);
}

#[tokio::test]
async fn test_zero_record_source_still_completes() {
    let mut process = process("empty");
    let source = process.register(RowsSource::new("nothing", vec![]));
    let sink = process.register(CollectSink::new("sink"));
    process.attach_input_to_output::<Row, _, _>(&source, &sink).unwrap();

    let report = timeout(WAIT, process.execute()).await.unwrap().unwrap();

    assert_eq!(report.summary(sink.id()).unwrap()["rows"], 0);
    assert_eq!(report.node(source.id()).unwrap().emitted, Some(0));
}

#[tokio::test]
async fn test_repeated_attach_is_a_no_op() {
    let mut process = process("dedup");
    let source = process.register(letters());
    let sink = process.register(CollectSink::new("sink"));

    assert!(process.attach_input_to_output::<Row, _, _>(&source, &sink).unwrap());
    assert!(!process.attach_input_to_output::<Row, _, _>(&source, &sink).unwrap());
    assert_eq!(process.attachment_count(), 1);
    assert!(process.is_attached(source.id(), sink.id()));

    let report = timeout(WAIT, process.execute()).await.unwrap().unwrap();
    assert_eq!(report.summary(sink.id()).unwrap()["rows"], 3);
}

#[tokio::test]
async fn test_dual_input_fills_slots_in_order() {
    let mut process = process("merge");
    let left = process.register(RowsSource::from_values("left", "side", ["l1", "l2"]));
    let right = process.register(RowsSource::from_values("right", "side", ["r1"]));
    let extra = process.register(RowsSource::from_values("extra", "side", ["x"]));
    let merge = process.register(MergeNode::new("merge"));
    let sink = process.register(CollectSink::new("sink").keeping_rows(true));

    process.attach_input_to_output::<Row, _, _>(&left, &merge).unwrap();
    process.attach_input_to_output::<Row, _, _>(&right, &merge).unwrap();
    {
        let merge_node = process.node_mut(&merge).unwrap();
        assert_eq!(merge_node.input_port().producer(), Some(left.id()));
        assert_eq!(merge_node.input2_port().unwrap().producer(), Some(right.id()));
    }

    let err = process
        .attach_input_to_output::<Row, _, _>(&extra, &merge)
        .unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateInput { node, .. } if node == merge.id()));
    assert_eq!(process.attachment_count(), 2);
    assert_eq!(process.adapter_count(), 2);
    assert!(process.consumers_of(extra.id()).is_empty());

    process.attach_input_to_output::<Row, _, _>(&merge, &sink).unwrap();
    let report = timeout(WAIT, process.execute()).await.unwrap().unwrap();

    let summary = report.summary(sink.id()).unwrap();
    assert_eq!(summary["rows"], 3);
    let values: Vec<&str> = summary["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["side"].as_str().unwrap())
        .collect();
    let lefts: Vec<&str> = values.iter().copied().filter(|v| v.starts_with('l')).collect();
    assert_eq!(lefts, vec!["l1", "l2"]);
    assert!(values.contains(&"r1"));
    assert_eq!(report.node(extra.id()).unwrap().emitted, None);
}

#[tokio::test]
async fn test_slot_order_is_primary_then_secondary() {
    let mut process = process("slots");
    let left = process.register(letters());
    let right = process.register(letters());
    let merge = process.register(MergeNode::new("merge"));

    process.attach_input_to_output::<Row, _, _>(&left, &merge).unwrap();
    let merge_node = process.node_mut(&merge).unwrap();
    assert!(merge_node.input_port().is_bound());
    assert!(!merge_node.input2_port().unwrap().is_bound());
    assert_eq!(
        crate::engine::ports::first_open_slot::<Row, _>(merge_node),
        Some(InputSlot::Secondary)
    );

    process.attach_input_to_output::<Row, _, _>(&right, &merge).unwrap();
    let merge_node = process.node_mut(&merge).unwrap();
    assert_eq!(crate::engine::ports::first_open_slot::<Row, _>(merge_node), None);
}

#[tokio::test]
async fn test_transform_chain_leaves_source_rows_untouched() {
    let mut process = process("chain");
    let source = process.register(RowsSource::new(
        "people",
        vec![
            Row::new().with("id", 1).with("name", "ada").with("lang", "en"),
            Row::new().with("id", 2).with("name", "grace").with("lang", "en"),
        ],
    ));
    let project = process.register(ProjectTransform::new("names", ["name"]));
    let raw = process.register(CollectSink::new("raw").keeping_rows(true));
    let projected = process.register(CollectSink::new("projected").keeping_rows(true));

    process.attach_input_to_output::<Row, _, _>(&source, &project).unwrap();
    process.attach_input_to_output::<Row, _, _>(&source, &raw).unwrap();
    process.attach_input_to_output::<Row, _, _>(&project, &projected).unwrap();

    let report = timeout(WAIT, process.execute()).await.unwrap().unwrap();

    assert_eq!(
        report.summary(projected.id()).unwrap()["data"],
        json!([{ "name": "ada" }, { "name": "grace" }])
    );
    assert_eq!(
        report.summary(raw.id()).unwrap()["columns"],
        json!(["id", "name", "lang"])
    );
}

#[tokio::test]
async fn test_failure_cancels_blocked_consumers_when_enabled() {
    let mut process = ProcessBuilder::new("cancelling")
        .logger_factory(Arc::new(NullLoggerFactory))
        .cancel_on_failure(true)
        .build();
    let source = process.register(FailingSource::new("flaky", 2));
    let sink = process.register(CollectSink::new("sink"));
    process.attach_input_to_output::<Row, _, _>(&source, &sink).unwrap();

    let err = timeout(WAIT, process.execute()).await.unwrap().unwrap_err();

    let PipelineError::Execution(error) = err else {
        panic!("expected an execution error");
    };
    assert_eq!(error.process, "cancelling");
    assert_eq!(error.failures.len(), 2);
    assert!(error.completed.is_empty());

    let root_causes: Vec<_> = error.root_causes().collect();
    assert_eq!(root_causes.len(), 1);
    assert_eq!(root_causes[0].node, source.id());
    assert!(matches!(&root_causes[0].kind, FailureKind::Faulted(e) if e.to_string().contains("simulated")));
    assert!(error.failure_for(sink.id()).unwrap().is_cancellation());
}

#[tokio::test]
async fn test_failure_without_cancellation_leaves_consumer_waiting() {
    let mut process = process("hanging");
    let source = process.register(FailingSource::new("flaky", 1));
    let sink = process.register(CollectSink::new("sink"));
    process.attach_input_to_output::<Row, _, _>(&source, &sink).unwrap();

    let outcome = timeout(Duration::from_millis(200), process.execute()).await;
    assert!(outcome.is_err(), "consumer of a faulted producer should still be waiting");
}

#[tokio::test]
async fn test_independent_failure_is_aggregated_after_join() {
    let mut process = process("partial");
    let flaky = process.register(FailingSource::new("flaky", 0));
    let source = process.register(letters());
    let sink = process.register(CollectSink::new("sink"));
    process.attach_input_to_output::<Row, _, _>(&source, &sink).unwrap();

    let err = timeout(WAIT, process.execute()).await.unwrap().unwrap_err();

    match err {
        PipelineError::Execution(error) => {
            assert_eq!(error.failures.len(), 1);
            assert_eq!(error.failures[0].node, flaky.id());
            assert_eq!(error.completed.len(), 2);
            assert!(error.to_string().contains("1 of 3 nodes"));
        }
        other => panic!("expected an execution error, got {}", other),
    }
}

#[tokio::test]
async fn test_panicking_node_is_reported() {
    let mut process = process("panics");
    let bad = process.register(PanickingNode::new("bad"));
    process.register(RowsSource::new("fine", vec![]));

    let err = timeout(WAIT, process.execute()).await.unwrap().unwrap_err();

    let PipelineError::Execution(error) = err else {
        panic!("expected an execution error");
    };
    let failure = error.failure_for(bad.id()).unwrap();
    assert!(matches!(&failure.kind, FailureKind::Panicked(message) if message == "simulated node panic"));
    assert_eq!(error.completed.len(), 1);
}

#[tokio::test]
async fn test_context_initializer_runs_before_nodes() {
    let mut process = ProcessBuilder::new("initialized")
        .logger_factory(Arc::new(NullLoggerFactory))
        .context_initializer(|context| {
            context.set_config("marker", "from-initializer");
            context.set_state("seed", 42);
            Ok(())
        })
        .build();
    let source = process.register(letters());
    let probe = process.register(ProbeNode::new("probe"));
    process.attach_input_to_output::<Row, _, _>(&source, &probe).unwrap();
    assert_eq!(process.context().config_value("marker"), None);

    let report = timeout(WAIT, process.execute()).await.unwrap().unwrap();

    let summary = report.summary(probe.id()).unwrap();
    assert_eq!(summary["received"], 3);
    assert_eq!(summary["marker"], "from-initializer");
    assert_eq!(summary["seed"], 42);
}

#[tokio::test]
async fn test_failing_initializer_starts_nothing() {
    let settings = ProcessSettings {
        context_initializer: Some(Box::new(
            |_: &mut PipelineContext| -> anyhow::Result<()> { Err(anyhow::anyhow!("no credentials")) },
        )),
        logger_factory: Arc::new(NullLoggerFactory),
        ..ProcessSettings::new("broken")
    };
    let mut process = EtlProcess::new(settings);
    process.register(letters());

    let err = timeout(WAIT, process.execute()).await.unwrap().unwrap_err();
    assert!(matches!(err, PipelineError::ContextInitializer { .. }));
    assert!(!err.is_configuration_error());
    assert!(err.to_string().contains("no credentials"));
}

#[test]
fn test_attach_rejects_foreign_nodes() {
    let mut other = process("away");
    let mut process = process("home");
    let source = process.register(letters());
    let stranger = other.register(CollectSink::new("stranger"));

    let err = process
        .attach_input_to_output::<Row, _, _>(&source, &stranger)
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownNode(id) if id == stranger.id()));
    assert!(err.is_configuration_error());
    assert_eq!(process.adapter_count(), 0);
    assert_eq!(process.attachment_count(), 0);
}

#[test]
fn test_attach_rejects_self_loop() {
    let mut process = process("loop");
    let project = process.register(ProjectTransform::new("project", ["a"]));

    let err = process
        .attach_input_to_output::<Row, _, _>(&project, &project)
        .unwrap_err();
    assert!(matches!(err, PipelineError::SelfAttachment { node } if node == project.id()));
}

#[test]
fn test_attach_rejects_second_record_type_on_one_output() {
    let mut process = process("types");
    let source = process.register(TwoFacedSource::new());
    let rows = process.register(ProbeNode::new("rows"));
    let text = process.register(TextProbe::new());

    process.attach_input_to_output::<Row, _, _>(&source, &rows).unwrap();
    let err = process
        .attach_input_to_output::<String, _, _>(&source, &text)
        .unwrap_err();

    assert!(matches!(err, PipelineError::PortTypeMismatch { node, .. } if node == source.id()));
    assert_eq!(process.attachment_count(), 1);
    assert!(!process.node_mut(&text).unwrap().input_port().is_bound());
}

#[tokio::test]
async fn test_sink_recycles_rows_into_pool() {
    let mut process = process("recycling");
    let source = process.register(SequenceSource::new("numbers", 100, "n"));
    let sink = process.register(CollectSink::new("sink").recycling(true));
    process.attach_input_to_output::<Row, _, _>(&source, &sink).unwrap();

    let report = timeout(WAIT, process.execute()).await.unwrap().unwrap();

    let summary = report.summary(sink.id()).unwrap();
    assert_eq!(summary["rows"], 100);
    assert_eq!(summary["recycled"], 100);
    assert_eq!(summary["columns"], json!(["n"]));
}

#[tokio::test]
async fn test_unwired_output_discards_without_an_emitted_count() {
    let mut process = process("silent");
    let silent = process.register(SilentSource::new("silent"));

    let report = timeout(WAIT, process.execute()).await.unwrap().unwrap();
    let node = report.node(silent.id()).unwrap();
    assert_eq!(node.emitted, None);
    assert!(node.summary.is_none());
}

#[tokio::test]
async fn test_stream_is_ended_for_a_source_that_forgot() {
    let mut process = process("forgetful");
    let silent = process.register(SilentSource::new("silent"));
    let sink = process.register(CollectSink::new("sink"));
    process.attach_input_to_output::<Row, _, _>(&silent, &sink).unwrap();

    let report = timeout(WAIT, process.execute()).await.unwrap().unwrap();
    assert_eq!(report.node(silent.id()).unwrap().emitted, Some(1));
    assert_eq!(report.summary(sink.id()).unwrap()["rows"], 1);
}

#[tokio::test]
async fn test_nodes_are_bound_to_one_shared_context() {
    let mut process = process("bound");
    process.context_mut().set_config("marker", "prepared");
    let source = process.register(letters());
    let left = process.register(ProbeNode::new("left"));
    let right = process.register(ProbeNode::new("right"));
    process.attach_input_to_output::<Row, _, _>(&source, &left).unwrap();
    process.attach_input_to_output::<Row, _, _>(&source, &right).unwrap();
    assert_eq!(process.node(&left).unwrap().name(), "left");

    let report = timeout(WAIT, process.execute()).await.unwrap().unwrap();
    for probe in [left.id(), right.id()] {
        assert_eq!(report.summary(probe).unwrap()["marker"], "prepared");
    }
}
