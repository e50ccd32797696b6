use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::host::NodeId;

/// Timing for one node within one run. Unique by node id within a run;
/// insertion order is completion order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeTiming {
    pub node_id: NodeId,
    pub execution_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vram_used: Option<u64>,
}

/// One workflow execution from start notification to end notification.
/// `total_ms` stays unset while the run is in flight and is set exactly once.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub nodes: Vec<NodeTiming>,
    pub total_ms: Option<f64>,

    #[serde(skip)]
    pub started_at: Option<Instant>,
}

impl RunRecord {
    pub fn started(now: Instant) -> Self {
        Self {
            nodes: Vec::new(),
            total_ms: None,
            started_at: Some(now),
        }
    }

    /// Replace the entry for the timing's node id in place, or append.
    /// Keeps at most one entry per node even when the native and the
    /// detailed completion signal both fire for the same node.
    pub fn upsert(&mut self, timing: NodeTiming) {
        match self
            .nodes
            .iter()
            .position(|entry| entry.node_id == timing.node_id)
        {
            Some(index) => self.nodes[index] = timing,
            None => self.nodes.push(timing),
        }
    }

    pub fn node(&self, node_id: NodeId) -> Option<&NodeTiming> {
        self.nodes.iter().find(|entry| entry.node_id == node_id)
    }

    pub fn elapsed_ms(&self, now: Instant) -> Option<f64> {
        self.started_at
            .map(|started_at| now.saturating_duration_since(started_at).as_secs_f64() * 1000.0)
    }

    /// Sets the total exactly once; a second call is a no-op.
    /// Returns whether this call set it.
    pub fn complete(&mut self, total_ms: f64) -> bool {
        if self.total_ms.is_some() {
            return false;
        }
        self.total_ms = Some(total_ms);
        true
    }

    pub fn is_complete(&self) -> bool {
        self.total_ms.is_some()
    }
}

/// Current run plus at most one prior run kept for delta display.
#[derive(Debug, Default)]
pub struct RunStore {
    current: Option<RunRecord>,
    previous: Option<RunRecord>,
}

impl RunStore {
    /// Demotes the current run to "previous" and starts a fresh one.
    pub fn begin_run(&mut self, now: Instant) {
        self.previous = self.current.take();
        self.current = Some(RunRecord::started(now));
    }

    pub fn current(&self) -> Option<&RunRecord> {
        self.current.as_ref()
    }
    pub fn current_mut(&mut self) -> Option<&mut RunRecord> {
        self.current.as_mut()
    }
    pub fn previous(&self) -> Option<&RunRecord> {
        self.previous.as_ref()
    }

    pub fn run_in_progress(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|run| !run.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::host::NodeId;
    use crate::run::{NodeTiming, RunRecord, RunStore};

    fn timing(node_id: NodeId, ms: f64) -> NodeTiming {
        NodeTiming {
            node_id,
            execution_time_ms: ms,
            vram_used: None,
        }
    }

    #[test]
    fn upsert_replaces_by_node_id() {
        let node_a = NodeId::unique();
        let node_b = NodeId::unique();
        let mut run = RunRecord::started(Instant::now());

        run.upsert(timing(node_a, 100.0));
        run.upsert(timing(node_b, 200.0));
        run.upsert(NodeTiming {
            node_id: node_a,
            execution_time_ms: 150.0,
            vram_used: Some(1024),
        });

        assert_eq!(run.nodes.len(), 2);
        assert_eq!(run.nodes[0].execution_time_ms, 150.0);
        assert_eq!(run.nodes[0].vram_used, Some(1024));
        assert_eq!(run.nodes[1].node_id, node_b);
    }

    #[test]
    fn complete_is_idempotent() {
        let mut run = RunRecord::started(Instant::now());

        assert!(run.complete(1200.0));
        assert!(!run.complete(9000.0));
        assert_eq!(run.total_ms, Some(1200.0));
    }

    #[test]
    fn elapsed_from_start_timestamp() {
        let t0 = Instant::now();
        let run = RunRecord::started(t0);

        let elapsed = run
            .elapsed_ms(t0 + Duration::from_millis(250))
            .expect("Run has a start timestamp");
        assert!((elapsed - 250.0).abs() < common::EPSILON);
    }

    #[test]
    fn begin_run_demotes_current_to_previous() {
        let t0 = Instant::now();
        let mut store = RunStore::default();

        store.begin_run(t0);
        let node_a = NodeId::unique();
        store
            .current_mut()
            .expect("Current run missing")
            .upsert(timing(node_a, 100.0));
        assert!(store.run_in_progress());
        assert!(store.previous().is_none());

        store
            .current_mut()
            .expect("Current run missing")
            .complete(500.0);
        assert!(!store.run_in_progress());

        store.begin_run(t0 + Duration::from_millis(700));
        assert!(store.run_in_progress());
        let previous = store.previous().expect("Previous run missing");
        assert_eq!(previous.nodes.len(), 1);
        assert_eq!(previous.total_ms, Some(500.0));
        assert!(store.current().expect("Current run missing").nodes.is_empty());
    }
}
