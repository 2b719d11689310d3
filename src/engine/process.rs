// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The process orchestrator.
//!
//! An [`EtlProcess`] owns the node graph. Nodes are registered, wired output
//! to input, and then run all at once: one tokio task per node, with no
//! topological ordering. A consumer waits on its input queue until its
//! producer emits or signals the end, so the execution order falls out of the
//! data dependencies.
//!
//! ## Failure handling
//!
//! By default a failing node does not stop its peers. A consumer of a node
//! that faulted before signalling the end waits forever, and so does
//! [`EtlProcess::execute`]. With [`ProcessSettings::cancel_on_failure`] a
//! shared cancellation token stops every remaining node as soon as one fails;
//! the stopped nodes are reported as cancelled.

use std::any::{type_name, Any};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::consts::DEFAULT_PROCESS_NAME;
use crate::context::{LoggerFactory, PipelineContext, TracingLoggerFactory};
use crate::engine::adapter::{BroadcastAdapter, IoAdapter};
use crate::engine::ports::{first_open_slot, slot_port};
use crate::engine::report::{NodeReport, ProcessReport};
use crate::errors::{ExecutionError, FailureKind, NodeFailure, PipelineError};
use crate::observability::messages::process::{
    AttachmentSkipped, ContextInitializerRunning, InputAttached, NodeCancelled, NodeCompleted,
    NodeFailed, NodeStarted, ProcessCompleted, ProcessFailed, ProcessStarted,
    ResourcesReclaimed, StreamNotEnded,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{Node, NodeId, NodeWithInput, NodeWithOutput};

/// One-shot hook that fills in the context before any node runs.
pub type ContextInitializer =
    Box<dyn FnOnce(&mut PipelineContext) -> anyhow::Result<()> + Send + 'static>;

/// Process-level settings.
pub struct ProcessSettings {
    pub name: String,
    pub logger_factory: Arc<dyn LoggerFactory>,
    pub context_initializer: Option<ContextInitializer>,
    /// Stop every remaining node once one node fails.
    pub cancel_on_failure: bool,
}

impl ProcessSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROCESS_NAME.to_string(),
            logger_factory: Arc::new(TracingLoggerFactory),
            context_initializer: None,
            cancel_on_failure: false,
        }
    }
}

impl fmt::Debug for ProcessSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSettings")
            .field("name", &self.name)
            .field("context_initializer", &self.context_initializer.is_some())
            .field("cancel_on_failure", &self.cancel_on_failure)
            .finish()
    }
}

/// Typed handle to a node owned by a process.
///
/// The type parameter lets [`EtlProcess::attach_input_to_output`] check port
/// capabilities at compile time.
pub struct NodeRef<N> {
    id: NodeId,
    _node: PhantomData<fn() -> N>,
}

impl<N> NodeRef<N> {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl<N> Clone for NodeRef<N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for NodeRef<N> {}

impl<N> fmt::Debug for NodeRef<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef<{}>({})", type_name::<N>(), self.id)
    }
}

/// An ETL process: the node graph plus the context it runs with.
pub struct EtlProcess {
    settings: ProcessSettings,
    context: PipelineContext,
    /// Registration order.
    nodes: Vec<Box<dyn Node>>,
    positions: HashMap<NodeId, usize>,
    /// Creation order; one adapter per output node that has consumers.
    adapters: Vec<Arc<dyn IoAdapter>>,
    adapter_positions: HashMap<NodeId, usize>,
    attachments: HashSet<(NodeId, NodeId)>,
    /// Same pairs as `attachments`, in the order they were made.
    edges: Vec<(NodeId, NodeId)>,
}

impl EtlProcess {
    pub fn new(settings: ProcessSettings) -> Self {
        let context = PipelineContext::with_logger_factory(Arc::clone(&settings.logger_factory));
        Self::with_context(settings, context)
    }

    /// Use a prepared context. Its logger factory is replaced by the one in
    /// `settings`.
    pub fn with_context(settings: ProcessSettings, mut context: PipelineContext) -> Self {
        context.set_logger_factory(Arc::clone(&settings.logger_factory));
        Self {
            settings,
            context,
            nodes: Vec::new(),
            positions: HashMap::new(),
            adapters: Vec::new(),
            adapter_positions: HashMap::new(),
            attachments: HashSet::new(),
            edges: Vec::new(),
        }
    }

    pub fn builder(name: impl Into<String>) -> ProcessBuilder {
        ProcessBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn settings(&self) -> &ProcessSettings {
        &self.settings
    }

    /// The context as it will be frozen at the start of `execute`.
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PipelineContext {
        &mut self.context
    }

    /// Hand a node to the process. The returned handle is how the node is
    /// wired and looked up afterwards.
    pub fn register<N: Node>(&mut self, node: N) -> NodeRef<N> {
        let id = node.id();
        self.positions.insert(id, self.nodes.len());
        self.nodes.push(Box::new(node));
        NodeRef {
            id,
            _node: PhantomData,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn node<N: Node>(&self, node: &NodeRef<N>) -> Option<&N> {
        let position = *self.positions.get(&node.id)?;
        self.nodes[position].as_ref().as_any().downcast_ref::<N>()
    }

    pub fn node_mut<N: Node>(&mut self, node: &NodeRef<N>) -> Option<&mut N> {
        let position = *self.positions.get(&node.id)?;
        self.nodes[position].as_mut().as_any_mut().downcast_mut::<N>()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_attached(&self, output: NodeId, input: NodeId) -> bool {
        self.attachments.contains(&(output, input))
    }

    /// Consumers of `output`, in attachment order.
    pub fn consumers_of(&self, output: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|(from, _)| *from == output)
            .map(|(_, to)| *to)
            .collect()
    }

    /// Wire the first open input slot of `input` to the output of `output`.
    ///
    /// Returns `Ok(false)` when the pair is already attached. The output's
    /// adapter is created on the first attachment. On error the graph is left
    /// as it was.
    pub fn attach_input_to_output<T, O, I>(
        &mut self,
        output: &NodeRef<O>,
        input: &NodeRef<I>,
    ) -> Result<bool, PipelineError>
    where
        T: Send + Sync + 'static,
        O: NodeWithOutput<T>,
        I: NodeWithInput<T>,
    {
        let output_position = self.position(output.id)?;
        let input_position = self.position(input.id)?;

        if output.id == input.id {
            return Err(PipelineError::SelfAttachment { node: output.id });
        }

        let output_name = self.nodes[output_position].name().to_string();
        if self.attachments.contains(&(output.id, input.id)) {
            AttachmentSkipped {
                output: &output_name,
                input: self.nodes[input_position].name(),
            }
            .log();
            return Ok(false);
        }

        if !self.nodes[output_position].as_ref().as_any().is::<O>() {
            return Err(PipelineError::UnknownNode(output.id));
        }

        let existing = self.typed_adapter::<T>(output.id)?;
        let adapter = match &existing {
            Some(adapter) => Arc::clone(adapter),
            None => Arc::new(BroadcastAdapter::<T>::new(output.id, output_name.clone())),
        };

        let consumer = downcast_mut::<I>(&mut self.nodes, input_position, input.id)?;
        let slot = first_open_slot::<T, I>(consumer).ok_or_else(|| {
            PipelineError::DuplicateInput {
                node: input.id,
                name: consumer.name().to_string(),
            }
        })?;
        adapter.attach_consumer(consumer)?;
        let stream = adapter.consuming_stream(input.id)?;
        slot_port::<T, I>(consumer, slot)
            .ok_or(PipelineError::InputNotBound)?
            .bind(stream)?;
        let input_name = consumer.name().to_string();

        if existing.is_none() {
            let producer = downcast_mut::<O>(&mut self.nodes, output_position, output.id)?;
            producer.output_port().set_emitter(Arc::clone(&adapter));
            self.adapter_positions.insert(output.id, self.adapters.len());
            self.adapters.push(adapter);
        }
        self.attachments.insert((output.id, input.id));
        self.edges.push((output.id, input.id));

        InputAttached {
            output: &output_name,
            input: &input_name,
            slot,
        }
        .log();
        Ok(true)
    }

    /// Run every node to a terminal state.
    ///
    /// Runs the context initializer, freezes the context and binds it to
    /// every node, spawns one task per node, and waits for all of them.
    /// Adapters are disposed and the object pool drained before returning,
    /// whatever the outcome.
    pub async fn execute(mut self) -> Result<ProcessReport, PipelineError> {
        let started = Instant::now();
        let process = self.settings.name.clone();

        if let Some(initializer) = self.settings.context_initializer.take() {
            ContextInitializerRunning { process: &process }.log();
            initializer(&mut self.context)
                .map_err(|source| PipelineError::ContextInitializer { source: source.into() })?;
        }

        let context = Arc::new(std::mem::take(&mut self.context));
        for node in self.nodes.iter_mut() {
            node.bind_context(Arc::clone(&context));
        }

        let node_count = self.nodes.len();
        let started_msg = ProcessStarted {
            process: &process,
            node_count,
            adapter_count: self.adapters.len(),
        };
        started_msg.log();
        let process_span = started_msg.span("process_execution");

        let token = self
            .settings
            .cancel_on_failure
            .then(CancellationToken::new);

        let mut watchers = Vec::with_capacity(node_count);
        let nodes = std::mem::take(&mut self.nodes);
        {
            // Node logger spans are created inside the process span.
            let _guard = process_span.enter();
            for node in nodes {
                let id = node.id();
                let name = node.name().to_string();
                let span = context.logger(&name);
                let task = tokio::spawn(run_node(node, token.clone()).instrument(span));
                let adapter = self.adapter(id).cloned();
                watchers.push((
                    id,
                    name.clone(),
                    tokio::spawn(watch_node(id, name, task, adapter, token.clone())),
                ));
            }
        }

        let mut completed = Vec::new();
        let mut failures = Vec::new();
        for (id, name, watcher) in watchers {
            match watcher.await {
                Ok(Ok(mut report)) => {
                    report.emitted = self.adapter(id).map(|adapter| adapter.emitted());
                    completed.push(report);
                }
                Ok(Err(failure)) => failures.push(failure),
                Err(join_error) => failures.push(NodeFailure {
                    node: id,
                    name,
                    elapsed: started.elapsed(),
                    kind: FailureKind::Panicked(panic_message(join_error)),
                }),
            }
        }

        self.reclaim(&process, &context);

        let elapsed = started.elapsed();
        if failures.is_empty() {
            ProcessCompleted {
                process: &process,
                node_count,
                elapsed,
            }
            .log();
            Ok(ProcessReport {
                process,
                elapsed,
                nodes: completed,
            })
        } else {
            ProcessFailed {
                process: &process,
                failed_count: failures.len(),
                node_count,
                elapsed,
            }
            .log();
            Err(PipelineError::Execution(ExecutionError {
                process,
                failures,
                completed,
            }))
        }
    }

    fn reclaim(&mut self, process: &str, context: &PipelineContext) {
        for adapter in &self.adapters {
            adapter.dispose();
        }
        let pooled = context.object_pool().drain();
        ResourcesReclaimed {
            process,
            adapters: self.adapters.len(),
            pooled,
        }
        .log();
        self.adapters.clear();
        self.adapter_positions.clear();
    }

    fn position(&self, id: NodeId) -> Result<usize, PipelineError> {
        self.positions
            .get(&id)
            .copied()
            .ok_or(PipelineError::UnknownNode(id))
    }

    fn adapter(&self, output: NodeId) -> Option<&Arc<dyn IoAdapter>> {
        self.adapter_positions
            .get(&output)
            .map(|&position| &self.adapters[position])
    }

    fn typed_adapter<T: Send + Sync + 'static>(
        &self,
        output: NodeId,
    ) -> Result<Option<Arc<BroadcastAdapter<T>>>, PipelineError> {
        let Some(adapter) = self.adapter(output) else {
            return Ok(None);
        };
        let existing = adapter.item_type();
        Arc::clone(adapter)
            .into_any()
            .downcast::<BroadcastAdapter<T>>()
            .map(Some)
            .map_err(|_| PipelineError::PortTypeMismatch {
                node: output,
                existing,
                requested: type_name::<T>(),
            })
    }
}

impl fmt::Debug for EtlProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EtlProcess")
            .field("name", &self.settings.name)
            .field("nodes", &self.nodes.len())
            .field("adapters", &self.adapters.len())
            .field("attachments", &self.attachments.len())
            .finish()
    }
}

fn downcast_mut<N: Node>(
    nodes: &mut [Box<dyn Node>],
    position: usize,
    id: NodeId,
) -> Result<&mut N, PipelineError> {
    let node: &mut dyn Node = nodes[position].as_mut();
    node.as_any_mut()
        .downcast_mut::<N>()
        .ok_or(PipelineError::UnknownNode(id))
}

async fn run_node(
    mut node: Box<dyn Node>,
    token: Option<CancellationToken>,
) -> (Box<dyn Node>, Result<(), FailureKind>) {
    let span = {
        let started_msg = NodeStarted {
            node: node.name(),
            id: node.id(),
        };
        started_msg.log();
        started_msg.span("node_execution")
    };

    let result = match token {
        Some(token) => {
            tokio::select! {
                biased;
                result = node.execute().instrument(span) => result.map_err(FailureKind::Faulted),
                _ = token.cancelled() => Err(FailureKind::Cancelled),
            }
        }
        None => node
            .execute()
            .instrument(span)
            .await
            .map_err(FailureKind::Faulted),
    };
    (node, result)
}

/// Await one node task, log its outcome and trip the cancellation token when
/// it failed. A node that completes without signalling the end of its output
/// has the stream ended for it, so its consumers are not left waiting.
async fn watch_node(
    id: NodeId,
    name: String,
    task: JoinHandle<(Box<dyn Node>, Result<(), FailureKind>)>,
    adapter: Option<Arc<dyn IoAdapter>>,
    token: Option<CancellationToken>,
) -> Result<NodeReport, NodeFailure> {
    let started = Instant::now();
    let (kind, summary) = match task.await {
        Ok((node, Ok(()))) => (None, node.summary()),
        Ok((_, Err(kind))) => (Some(kind), None),
        Err(join_error) => (Some(FailureKind::Panicked(panic_message(join_error))), None),
    };
    let elapsed = started.elapsed();

    match kind {
        None => {
            if let Some(adapter) = adapter.filter(|adapter| !adapter.is_ended()) {
                StreamNotEnded {
                    output: &name,
                    emitted: adapter.emitted(),
                }
                .log();
                adapter.end_stream();
            }
            NodeCompleted {
                node: &name,
                id,
                elapsed,
            }
            .log();
            Ok(NodeReport {
                id,
                name,
                elapsed,
                emitted: None,
                summary,
            })
        }
        Some(FailureKind::Cancelled) => {
            NodeCancelled { node: &name, id }.log();
            Err(failure(id, name, elapsed, FailureKind::Cancelled))
        }
        Some(kind) => {
            NodeFailed {
                node: &name,
                id,
                error: &kind,
            }
            .log();
            if let Some(token) = &token {
                token.cancel();
            }
            Err(failure(id, name, elapsed, kind))
        }
    }
}

fn failure(node: NodeId, name: String, elapsed: Duration, kind: FailureKind) -> NodeFailure {
    NodeFailure {
        node,
        name,
        elapsed,
        kind,
    }
}

fn panic_message(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload: Box<dyn Any + Send> = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "node panicked".to_string()
    }
}

/// Fluent construction of an [`EtlProcess`].
#[derive(Debug, Default)]
pub struct ProcessBuilder {
    settings: ProcessSettings,
    context: PipelineContext,
}

impl ProcessBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            settings: ProcessSettings::new(name),
            context: PipelineContext::default(),
        }
    }

    pub fn logger_factory(mut self, logger_factory: Arc<dyn LoggerFactory>) -> Self {
        self.settings.logger_factory = logger_factory;
        self
    }

    pub fn context_initializer<F>(mut self, initializer: F) -> Self
    where
        F: FnOnce(&mut PipelineContext) -> anyhow::Result<()> + Send + 'static,
    {
        self.settings.context_initializer = Some(Box::new(initializer));
        self
    }

    pub fn cancel_on_failure(mut self, cancel_on_failure: bool) -> Self {
        self.settings.cancel_on_failure = cancel_on_failure;
        self
    }

    pub fn context(mut self, context: PipelineContext) -> Self {
        self.context = context;
        self
    }

    pub fn build(self) -> EtlProcess {
        EtlProcess::with_context(self.settings, self.context)
    }
}
