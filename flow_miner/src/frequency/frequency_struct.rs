use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use tracing::debug;

use crate::event_log::{ActivityLabel, WorkflowLog};

/// Number of occurrences per activity
pub type ActivityFrequency = BTreeMap<ActivityLabel, u64>;

/// Number of directly-follows occurrences per ordered pair of activities
pub type TransitionFrequency = BTreeMap<(ActivityLabel, ActivityLabel), u64>;

/// Activities that directly follow an activity at least once
pub type DirectSuccession = BTreeMap<ActivityLabel, BTreeSet<ActivityLabel>>;

///
/// Activity and directly-follows frequencies of a [`WorkflowLog`]
///
/// Unseen activities and transitions have a frequency of `0`.
///
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyAnalysis {
    /// Occurrences of activities
    pub activity_frequencies: ActivityFrequency,
    /// Occurrences of directly-follows transitions
    #[serde_as(as = "Vec<(_, _)>")]
    pub transition_frequencies: TransitionFrequency,
    /// Direct succession relation (`a > b`)
    pub direct_succession: DirectSuccession,
}

impl FrequencyAnalysis {
    /// Create new [`FrequencyAnalysis`] without any activities or transitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Count activities and directly-follows transitions over all traces of a [`WorkflowLog`]
    pub fn from_log(log: &WorkflowLog) -> Self {
        let mut result = Self::new();
        log.traces()
            .iter()
            .for_each(|t| result.add_trace(t.as_slice()));
        debug!(
            activities = result.activity_frequencies.len(),
            transitions = result.transition_frequencies.len(),
            "Computed activity and transition frequencies"
        );
        result
    }

    /// Add the occurrences of a single trace
    ///
    /// Empty traces do not change the frequencies.
    pub fn add_trace<S: AsRef<str>>(&mut self, trace: &[S]) {
        for act in trace {
            self.add_activity(act.as_ref(), 1);
        }
        for pair in trace.windows(2) {
            self.add_transition(pair[0].as_ref(), pair[1].as_ref(), 1);
        }
    }

    /// Add an activity with a frequency
    ///
    /// If the activity already exists, the frequency count is added to the existing activity.
    pub fn add_activity(&mut self, activity: &str, frequency: u64) {
        *self
            .activity_frequencies
            .entry(activity.to_string())
            .or_default() += frequency;
    }

    /// Add a directly-follows transition with a frequency
    ///
    /// Also records `to` as a direct successor of `from`.
    pub fn add_transition(&mut self, from: &str, to: &str, frequency: u64) {
        *self
            .transition_frequencies
            .entry((from.to_string(), to.to_string()))
            .or_default() += frequency;
        self.direct_succession
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Frequency of an activity (`0` if unseen)
    pub fn activity_frequency(&self, activity: &str) -> u64 {
        self.activity_frequencies.get(activity).copied().unwrap_or(0)
    }

    /// Frequency of a directly-follows transition (`0` if unseen)
    pub fn transition_frequency(&self, from: &str, to: &str) -> u64 {
        self.transition_frequencies
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Checks if `to` directly follows `from` at least once
    pub fn directly_follows(&self, from: &str, to: &str) -> bool {
        self.direct_succession
            .get(from)
            .is_some_and(|succ| succ.contains(to))
    }

    /// All activities, in lexicographic order
    pub fn activities(&self) -> impl Iterator<Item = &ActivityLabel> {
        self.activity_frequencies.keys()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&WorkflowLog> for FrequencyAnalysis {
    fn from(log: &WorkflowLog) -> Self {
        Self::from_log(log)
    }
}
