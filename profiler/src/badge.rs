use std::time::Instant;

use crate::format::{format_bytes, format_execution_time};
use crate::host::NodeId;
use crate::tracker::{NodeTimerState, NodeTimerTracker};

/// Text for the overlay badge on a node: live elapsed while running, final
/// time (plus VRAM when reported) once finished, nothing for a node that
/// never ran this session. The host's draw decorator consumes this.
pub fn badge_text(tracker: &NodeTimerTracker, node_id: NodeId, now: Instant) -> Option<String> {
    match tracker.state(node_id)? {
        NodeTimerState::Running { started_at } => {
            let elapsed_ms = now.saturating_duration_since(*started_at).as_secs_f64() * 1000.0;
            Some(format_execution_time(elapsed_ms))
        }
        NodeTimerState::Finished {
            execution_time_ms,
            vram_used,
        } => Some(match vram_used {
            Some(vram_used) => format!(
                "{} | {}",
                format_execution_time(*execution_time_ms),
                format_bytes(*vram_used as f64)
            ),
            None => format_execution_time(*execution_time_ms),
        }),
    }
}
