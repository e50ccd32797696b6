use std::time::Instant;

use hashbrown::HashMap;

use crate::host::NodeId;
use crate::run::NodeTiming;

/// Authoritative timing reported by the backend alongside a completion
/// signal. When present it is preferred over a locally computed elapsed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasuredTiming {
    pub execution_time_ms: f64,
    pub vram_used: Option<u64>,
}

/// Transient per-node timing state. A node holds at most one variant at a
/// time; no entry means the node never ran this session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeTimerState {
    Running { started_at: Instant },
    Finished { execution_time_ms: f64, vram_used: Option<u64> },
}

/// Per-node start/stop accounting, kept as a side map by node id rather
/// than as fields injected onto host-owned nodes.
#[derive(Debug, Default)]
pub struct NodeTimerTracker {
    states: HashMap<NodeId, NodeTimerState>,
}

impl NodeTimerTracker {
    /// Records a start timestamp, unconditionally overwriting any prior
    /// state. Stopping a previously running node is the controller's job;
    /// keeping a single stop call site avoids double-stop bugs.
    pub fn start_node(&mut self, node_id: NodeId, now: Instant) {
        self.states
            .insert(node_id, NodeTimerState::Running { started_at: now });
    }

    /// No-op unless the node is currently running, which makes stopping a
    /// never-started node and double-stopping safe. Returns the finished
    /// timing for the caller to upsert into the run record.
    pub fn stop_node(
        &mut self,
        node_id: NodeId,
        now: Instant,
        measured: Option<MeasuredTiming>,
    ) -> Option<NodeTiming> {
        let started_at = match self.states.get(&node_id) {
            Some(NodeTimerState::Running { started_at }) => *started_at,
            _ => return None,
        };

        let (execution_time_ms, vram_used) = match measured {
            Some(measured) => (measured.execution_time_ms, measured.vram_used),
            None => (
                now.saturating_duration_since(started_at).as_secs_f64() * 1000.0,
                None,
            ),
        };

        self.states.insert(
            node_id,
            NodeTimerState::Finished {
                execution_time_ms,
                vram_used,
            },
        );

        Some(NodeTiming {
            node_id,
            execution_time_ms,
            vram_used,
        })
    }

    pub fn state(&self, node_id: NodeId) -> Option<&NodeTimerState> {
        self.states.get(&node_id)
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Drops residual start markers, keeping finished entries so badges
    /// stay visible until the next run.
    pub fn clear_running(&mut self) {
        self.states
            .retain(|_, state| !matches!(state, NodeTimerState::Running { .. }));
    }
}
