use serde::Serialize;

use crate::format::{format_bytes, format_delta, format_execution_time};
use crate::host::{NodeId, NodeLookup};
use crate::run::RunRecord;

/// Consumes run snapshots and produces the visual artifact (table, badges).
/// Implementations live on the host side; the controller only calls
/// `refresh` when displayable data changed.
pub trait ReportSink: Send {
    fn refresh(&mut self, current: Option<&RunRecord>, previous: Option<&RunRecord>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DeltaDirection {
    Slower,
    Faster,
    Unchanged,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Delta {
    pub diff_ms: f64,
    /// Unset when the previous value is zero.
    pub percent: Option<f64>,
    pub direction: DeltaDirection,
}

impl Delta {
    pub fn between(current_ms: f64, previous_ms: f64) -> Self {
        let diff_ms = current_ms - previous_ms;
        let direction = if diff_ms.abs() < common::EPSILON {
            DeltaDirection::Unchanged
        } else if diff_ms > 0.0 {
            DeltaDirection::Slower
        } else {
            DeltaDirection::Faster
        };
        let percent = (previous_ms.abs() >= common::EPSILON)
            .then(|| diff_ms / previous_ms * 100.0);

        Self {
            diff_ms,
            percent,
            direction,
        }
    }
}

/// One table row. Cells are `None` when the node is absent from that run;
/// the sink renders those as blanks rather than failing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportRow {
    pub node_id: NodeId,
    pub title: Option<String>,
    pub current_ms: Option<f64>,
    pub previous_ms: Option<f64>,
    pub delta: Option<Delta>,
    pub vram_used: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TotalRow {
    pub current_ms: Option<f64>,
    pub previous_ms: Option<f64>,
    pub delta: Option<Delta>,
}

/// Pure table data built from the current and previous run; rendering is
/// the sink's business.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReportSnapshot {
    pub rows: Vec<ReportRow>,
    pub max_execution_time_ms: Option<f64>,
    pub max_vram_used: Option<u64>,
    pub total: TotalRow,
}

impl ReportSnapshot {
    pub fn build(
        current: Option<&RunRecord>,
        previous: Option<&RunRecord>,
        lookup: &dyn NodeLookup,
    ) -> Self {
        let mut rows: Vec<ReportRow> = Vec::new();

        // current-run nodes first, in completion order
        if let Some(current) = current {
            for timing in current.nodes.iter() {
                let previous_ms = previous
                    .and_then(|run| run.node(timing.node_id))
                    .map(|entry| entry.execution_time_ms);
                rows.push(ReportRow {
                    node_id: timing.node_id,
                    title: lookup.node_title(timing.node_id),
                    current_ms: Some(timing.execution_time_ms),
                    previous_ms,
                    delta: previous_ms
                        .map(|previous_ms| Delta::between(timing.execution_time_ms, previous_ms)),
                    vram_used: timing.vram_used,
                });
            }
        }

        // then nodes that only ran in the previous run
        if let Some(previous) = previous {
            for timing in previous.nodes.iter() {
                let already_listed = rows.iter().any(|row| row.node_id == timing.node_id);
                if already_listed {
                    continue;
                }
                rows.push(ReportRow {
                    node_id: timing.node_id,
                    title: lookup.node_title(timing.node_id),
                    current_ms: None,
                    previous_ms: Some(timing.execution_time_ms),
                    delta: None,
                    vram_used: None,
                });
            }
        }

        let max_execution_time_ms = rows
            .iter()
            .filter_map(|row| row.current_ms)
            .fold(None, |max: Option<f64>, ms| {
                Some(max.map_or(ms, |max| max.max(ms)))
            });
        let max_vram_used = rows.iter().filter_map(|row| row.vram_used).max();

        let total_current = current.and_then(|run| run.total_ms);
        let total_previous = previous.and_then(|run| run.total_ms);
        let total = TotalRow {
            current_ms: total_current,
            previous_ms: total_previous,
            delta: match (total_current, total_previous) {
                (Some(current_ms), Some(previous_ms)) => {
                    Some(Delta::between(current_ms, previous_ms))
                }
                _ => None,
            },
        };

        Self {
            rows,
            max_execution_time_ms,
            max_vram_used,
            total,
        }
    }

    /// CSV text of the table, blanks for missing cells.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("Node,Execution Time,Previous,Delta,VRAM Used\n");

        for row in self.rows.iter() {
            let name = row
                .title
                .clone()
                .unwrap_or_else(|| row.node_id.to_string());
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                csv_escape(&name),
                row.current_ms.map(format_execution_time).unwrap_or_default(),
                row.previous_ms.map(format_execution_time).unwrap_or_default(),
                row.delta
                    .as_ref()
                    .map(|delta| csv_escape(&format_delta(delta.diff_ms, delta.percent)))
                    .unwrap_or_default(),
                row.vram_used
                    .map(|vram| format_bytes(vram as f64))
                    .unwrap_or_default(),
            ));
        }

        out.push_str(&format!(
            "Max,{},,,{}\n",
            self.max_execution_time_ms
                .map(format_execution_time)
                .unwrap_or_default(),
            self.max_vram_used
                .map(|vram| format_bytes(vram as f64))
                .unwrap_or_default(),
        ));
        out.push_str(&format!(
            "Total,{},{},{},\n",
            self.total.current_ms.map(format_execution_time).unwrap_or_default(),
            self.total.previous_ms.map(format_execution_time).unwrap_or_default(),
            self.total
                .delta
                .as_ref()
                .map(|delta| csv_escape(&format_delta(delta.diff_ms, delta.percent)))
                .unwrap_or_default(),
        ));

        out
    }
}

/// Date-stamped name for the exported table, e.g.
/// "execution-report-2026-08-29.csv".
pub fn csv_file_name(date: time::Date) -> String {
    format!("execution-report-{}.csv", date)
}

pub fn csv_file_name_today() -> String {
    csv_file_name(time::OffsetDateTime::now_utc().date())
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
