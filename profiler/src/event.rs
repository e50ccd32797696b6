use serde::Deserialize;
use serde_json::Value;

use crate::host::NodeId;

/// Execution notifications delivered by the backend. Any of these may
/// arrive zero or more times, in any order; the controller reconciles
/// whatever subset actually fires.
#[derive(Clone, Debug, PartialEq)]
pub enum ExecutionEvent {
    WorkflowStart,
    /// `None` means "no node is executing anymore", i.e. the workflow
    /// finished.
    NodeExecuting(Option<NodeId>),
    NodeExecuted(NodeId),
    NodeExecutedDetailed {
        node_id: NodeId,
        execution_time_ms: f64,
        vram_used: Option<u64>,
    },
    WorkflowEnd {
        execution_time_ms: Option<f64>,
    },
    WorkflowSuccess,
    WorkflowError,
    StatusUpdate {
        queue_remaining: u64,
    },
}

#[derive(Deserialize)]
struct DetailedPayload {
    node: String,
    execution_time: f64,
    #[serde(default)]
    vram_used: Option<u64>,
}

impl ExecutionEvent {
    /// Parses a raw notification into an event. Returns `None` for unknown
    /// notification names and for payloads referencing unparseable node
    /// ids; those notifications are skipped without mutating any state.
    pub fn from_notification(name: &str, payload: &Value) -> Option<ExecutionEvent> {
        match name {
            "execution_start" => Some(ExecutionEvent::WorkflowStart),
            // an absent or null node id legitimately means "workflow
            // finished"; a present but garbled one is a skipped
            // notification, never a run completion
            "executing" => match node_field(payload) {
                NodeField::Absent => Some(ExecutionEvent::NodeExecuting(None)),
                NodeField::Id(raw) => raw
                    .parse::<NodeId>()
                    .ok()
                    .map(|node_id| ExecutionEvent::NodeExecuting(Some(node_id))),
                NodeField::Malformed => None,
            },
            "executed" => match node_field(payload) {
                NodeField::Id(raw) => raw.parse::<NodeId>().ok().map(ExecutionEvent::NodeExecuted),
                _ => None,
            },
            "executed_detailed" => {
                let detailed: DetailedPayload = serde_json::from_value(payload.clone()).ok()?;
                let node_id = detailed.node.parse::<NodeId>().ok()?;
                Some(ExecutionEvent::NodeExecutedDetailed {
                    node_id,
                    execution_time_ms: detailed.execution_time,
                    vram_used: detailed.vram_used,
                })
            }
            "execution_end" => Some(ExecutionEvent::WorkflowEnd {
                execution_time_ms: payload.get("execution_time").and_then(Value::as_f64),
            }),
            "execution_success" => Some(ExecutionEvent::WorkflowSuccess),
            "execution_error" => Some(ExecutionEvent::WorkflowError),
            "status" => payload
                .pointer("/exec_info/queue_remaining")
                .and_then(Value::as_u64)
                .map(|queue_remaining| ExecutionEvent::StatusUpdate { queue_remaining }),
            _ => None,
        }
    }
}

enum NodeField<'a> {
    Absent,
    Id(&'a str),
    Malformed,
}

// The node id arrives either as a bare string or wrapped as {"node": id}.
// A key that is present but not a string is malformed, not absent.
fn node_field(payload: &Value) -> NodeField<'_> {
    match payload {
        Value::Null => NodeField::Absent,
        Value::String(raw) => NodeField::Id(raw.as_str()),
        Value::Object(map) => match map.get("node") {
            None | Some(Value::Null) => NodeField::Absent,
            Some(Value::String(raw)) => NodeField::Id(raw.as_str()),
            Some(_) => NodeField::Malformed,
        },
        _ => NodeField::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::event::ExecutionEvent;
    use crate::host::NodeId;

    const NODE: &str = "e69c3f32-ac66-4447-a3f6-9e8528c5d830";

    #[test]
    fn parses_node_id_shapes() {
        let node_id: NodeId = NODE.into();

        assert_eq!(
            ExecutionEvent::from_notification("executing", &json!(NODE)),
            Some(ExecutionEvent::NodeExecuting(Some(node_id)))
        );
        assert_eq!(
            ExecutionEvent::from_notification("executing", &json!({ "node": NODE })),
            Some(ExecutionEvent::NodeExecuting(Some(node_id)))
        );
        assert_eq!(
            ExecutionEvent::from_notification("executing", &json!({ "node": null })),
            Some(ExecutionEvent::NodeExecuting(None))
        );
        assert_eq!(
            ExecutionEvent::from_notification("executed", &json!({ "node": NODE })),
            Some(ExecutionEvent::NodeExecuted(node_id))
        );
    }

    #[test]
    fn parses_detailed_payload() {
        let event = ExecutionEvent::from_notification(
            "executed_detailed",
            &json!({ "node": NODE, "execution_time": 500, "vram_used": 1048576 }),
        );

        assert_eq!(
            event,
            Some(ExecutionEvent::NodeExecutedDetailed {
                node_id: NODE.into(),
                execution_time_ms: 500.0,
                vram_used: Some(1048576),
            })
        );
    }

    #[test]
    fn parses_end_and_fallback_signals() {
        assert_eq!(
            ExecutionEvent::from_notification("execution_end", &json!({ "execution_time": 1500 })),
            Some(ExecutionEvent::WorkflowEnd {
                execution_time_ms: Some(1500.0)
            })
        );
        assert_eq!(
            ExecutionEvent::from_notification("execution_end", &json!({})),
            Some(ExecutionEvent::WorkflowEnd {
                execution_time_ms: None
            })
        );
        assert_eq!(
            ExecutionEvent::from_notification("status", &json!({ "exec_info": { "queue_remaining": 0 } })),
            Some(ExecutionEvent::StatusUpdate { queue_remaining: 0 })
        );
    }

    #[test]
    fn skips_malformed_notifications() {
        assert_eq!(
            ExecutionEvent::from_notification("executed", &json!({ "node": "not-a-uuid" })),
            None
        );
        // a bad id on "executing" must not read as "workflow finished"
        assert_eq!(
            ExecutionEvent::from_notification("executing", &json!({ "node": "not-a-uuid" })),
            None
        );
        // neither must a node id of the wrong type
        assert_eq!(
            ExecutionEvent::from_notification("executing", &json!({ "node": 5 })),
            None
        );
        assert_eq!(
            ExecutionEvent::from_notification("executing", &json!(5)),
            None
        );
        assert_eq!(
            ExecutionEvent::from_notification("executed", &json!({ "node": 5 })),
            None
        );
        assert_eq!(
            ExecutionEvent::from_notification("status", &json!({})),
            None
        );
        assert_eq!(ExecutionEvent::from_notification("unknown", &json!({})), None);
    }
}
