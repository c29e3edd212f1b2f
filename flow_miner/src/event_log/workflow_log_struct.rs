use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Activity label (compared and ordered by its exact value)
pub type ActivityLabel = String;

/// Ordered sequence of [`ActivityLabel`]s executed by one case
pub type Trace = Vec<ActivityLabel>;

///
/// Workflow log: collection of non-empty [`Trace`]s
///
/// Empty traces are dropped on construction, so every contained trace has at least one activity.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowLog {
    traces: Vec<Trace>,
}

impl WorkflowLog {
    /// Create a new [`WorkflowLog`] from the given traces, discarding empty ones
    pub fn new<T, I, S>(traces: T) -> Self
    where
        T: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: Into<ActivityLabel>,
    {
        let mut dropped = 0usize;
        let traces: Vec<Trace> = traces
            .into_iter()
            .filter_map(|t| {
                let trace: Trace = t.into_iter().map(Into::into).collect();
                if trace.is_empty() {
                    dropped += 1;
                    None
                } else {
                    Some(trace)
                }
            })
            .collect();
        if dropped > 0 {
            debug!(dropped, "Dropped empty traces");
        }
        Self { traces }
    }

    /// Add a trace to the log (ignored if empty)
    ///
    /// Returns `true` if the trace was added.
    pub fn add_trace(&mut self, trace: Trace) -> bool {
        if trace.is_empty() {
            return false;
        }
        self.traces.push(trace);
        true
    }

    /// All (non-empty) traces
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Number of traces
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// `true` if the log does not contain a single trace (i.e., it carries no data)
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Total number of events over all traces
    pub fn num_events(&self) -> usize {
        self.traces.iter().map(Vec::len).sum()
    }

    /// Distinct activity labels, in lexicographic order
    pub fn activities(&self) -> BTreeSet<ActivityLabel> {
        self.traces.iter().flatten().cloned().collect()
    }
}

impl<S: Into<ActivityLabel>> FromIterator<Vec<S>> for WorkflowLog {
    fn from_iter<T: IntoIterator<Item = Vec<S>>>(iter: T) -> Self {
        Self::new(iter)
    }
}
