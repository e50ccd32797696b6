use std::time::Instant;

use tracing::debug;

use crate::event::ExecutionEvent;
use crate::host::NodeId;
use crate::report::ReportSink;
use crate::run::RunStore;
use crate::tick::Ticker;
use crate::tracker::{MeasuredTiming, NodeTimerTracker};

/// Lifecycle state machine over the backend's execution notifications.
///
/// The backend is untrusted to deliver a clean sequence: any notification
/// may arrive zero or more times, in any order. Every transition is
/// guarded so that the first signal wins and later duplicates are no-ops;
/// the worst outcome of a missing or malformed notification is a stale
/// display, never a stuck state. The controller only observes execution,
/// it never influences it.
pub struct ExecutionController {
    store: RunStore,
    tracker: NodeTimerTracker,
    current_node: Option<NodeId>,
    ticker: Box<dyn Ticker>,
    sink: Box<dyn ReportSink>,
}

impl ExecutionController {
    pub fn new(sink: Box<dyn ReportSink>, ticker: Box<dyn Ticker>) -> Self {
        Self {
            store: RunStore::default(),
            tracker: NodeTimerTracker::default(),
            current_node: None,
            ticker,
            sink,
        }
    }

    pub fn store(&self) -> &RunStore {
        &self.store
    }
    pub fn tracker(&self) -> &NodeTimerTracker {
        &self.tracker
    }
    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    pub fn handle_event(&mut self, event: ExecutionEvent, now: Instant) {
        match event {
            ExecutionEvent::WorkflowStart => self.on_workflow_start(now),
            ExecutionEvent::NodeExecuting(node_id) => self.on_node_executing(node_id, now),
            ExecutionEvent::NodeExecuted(node_id) => self.on_node_executed(node_id, None, now),
            ExecutionEvent::NodeExecutedDetailed {
                node_id,
                execution_time_ms,
                vram_used,
            } => self.on_node_executed(
                node_id,
                Some(MeasuredTiming {
                    execution_time_ms,
                    vram_used,
                }),
                now,
            ),
            ExecutionEvent::WorkflowEnd { execution_time_ms } => {
                self.complete_run(execution_time_ms, now)
            }
            ExecutionEvent::WorkflowSuccess | ExecutionEvent::WorkflowError => {
                self.complete_run_fallback(now)
            }
            ExecutionEvent::StatusUpdate { queue_remaining } => {
                if queue_remaining == 0 {
                    self.complete_run_fallback(now);
                }
            }
        }
    }

    fn on_workflow_start(&mut self, now: Instant) {
        // a duplicate start must not clobber in-flight data
        if self.store.run_in_progress() {
            debug!("Ignoring workflow start while a run is in progress");
            return;
        }

        self.store.begin_run(now);
        self.tracker.clear();
        self.current_node = None;
        self.ticker.start();
    }

    fn on_node_executing(&mut self, node_id: Option<NodeId>, now: Instant) {
        let Some(node_id) = node_id else {
            // an empty node means the workflow finished
            if let Some(previous_node) = self.current_node.take() {
                self.stop_and_record(previous_node, now, None);
            }
            if self.store.run_in_progress() {
                self.complete_run(None, now);
            }
            return;
        };

        if self.current_node == Some(node_id) {
            return;
        }

        // the executor pipelines nodes; a new start implies the previous
        // node is done even when no stop signal arrived for it
        if let Some(previous_node) = self.current_node.take() {
            self.stop_and_record(previous_node, now, None);
        }
        self.tracker.start_node(node_id, now);
        self.current_node = Some(node_id);
    }

    fn on_node_executed(
        &mut self,
        node_id: NodeId,
        measured: Option<MeasuredTiming>,
        now: Instant,
    ) {
        self.stop_and_record(node_id, now, measured);
        if self.current_node == Some(node_id) {
            self.current_node = None;
        }
        self.refresh_sink();
    }

    /// Single calling point for completing a run. Stops the in-flight node
    /// first (the last node may get no completion signal of its own), then
    /// sets the total at most once; duplicate end signals are no-ops.
    fn complete_run(&mut self, execution_time_ms: Option<f64>, now: Instant) {
        if let Some(node_id) = self.current_node.take() {
            self.stop_and_record(node_id, now, None);
        }
        self.ticker.stop();

        let Some(run) = self.store.current_mut() else {
            return;
        };
        let total_ms = execution_time_ms
            .or_else(|| run.elapsed_ms(now))
            .unwrap_or(0.0);
        let completed = run.complete(total_ms);
        run.started_at = None;

        self.tracker.clear_running();

        if completed {
            self.refresh_sink();
        } else {
            debug!("Ignoring duplicate completion signal");
        }
    }

    /// Alternative native end signals (success, error, queue drained) all
    /// funnel through here; only the first one for an in-flight run acts.
    fn complete_run_fallback(&mut self, now: Instant) {
        if self.store.run_in_progress() {
            self.complete_run(None, now);
        }
    }

    fn stop_and_record(&mut self, node_id: NodeId, now: Instant, measured: Option<MeasuredTiming>) {
        if let Some(timing) = self.tracker.stop_node(node_id, now, measured) {
            if let Some(run) = self.store.current_mut() {
                run.upsert(timing);
            }
        }
    }

    fn refresh_sink(&mut self) {
        self.sink
            .refresh(self.store.current(), self.store.previous());
    }
}
