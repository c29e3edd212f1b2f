use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::MinerError,
    event_log::ActivityLabel,
    frequency::FrequencyAnalysis,
    graph::graph_model::{
        activity_id, GraphModel, Node, NodeAttributes, PseudoEvent, END_EVENT_ID, START_EVENT_ID,
    },
};

/// Name of heuristic net graphs
pub const HEURISTIC_GRAPH_NAME: &str = "Heuristic Net";

/// Base color of activity nodes, to which the two-digit hex intensity is appended
pub const HEURISTIC_BASE_COLOR: &str = "#FF9933";

/// Color intensity used if all activities have the same frequency
pub const MID_COLOR_INTENSITY: u8 = 50;

/// Highest color intensity (lightest color)
pub const MAX_COLOR_INTENSITY: u8 = 99;

/// Line weight used if all kept transitions have the same (positive) frequency
pub const MEDIUM_PEN_WIDTH: f64 = 2.0;

/// Line weight of the least frequent transition
pub const MIN_PEN_WIDTH: f64 = 1.0;

/// Line weight of the most frequent transition
pub const MAX_PEN_WIDTH: f64 = 6.0;

///
/// Color intensity of an activity with frequency `count`
///
/// Linearly normalizes `count` into `[0, 1]` wrt. `min`/`max` and inverts it into `[0, 99]`,
/// so that frequent activities get a low intensity (i.e., a darker color).
/// If `min == max`, [`MID_COLOR_INTENSITY`] is used.
///
pub fn color_intensity(count: u64, min: u64, max: u64) -> u8 {
    if max <= min {
        return MID_COLOR_INTENSITY;
    }
    let normalized = (count.clamp(min, max) - min) as f64 / (max - min) as f64;
    MAX_COLOR_INTENSITY - (normalized * f64::from(MAX_COLOR_INTENSITY)).round() as u8
}

/// Fill color for a color intensity: [`HEURISTIC_BASE_COLOR`] followed by two hex digits
pub fn fill_color(intensity: u8) -> String {
    format!("{HEURISTIC_BASE_COLOR}{intensity:02x}")
}

///
/// Line weight of a transition with frequency `count`
///
/// Linearly scaled into `[1, 6]` wrt. `min`/`max`.
/// If `min == max`, [`MEDIUM_PEN_WIDTH`] is used for positive counts.
///
pub fn pen_width(count: u64, min: u64, max: u64) -> f64 {
    if max > min {
        let normalized = (count.clamp(min, max) - min) as f64 / (max - min) as f64;
        MIN_PEN_WIDTH + normalized * (MAX_PEN_WIDTH - MIN_PEN_WIDTH)
    } else if count > 0 {
        MEDIUM_PEN_WIDTH
    } else {
        MIN_PEN_WIDTH
    }
}

/// Activity kept in a [`HeuristicNet`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicActivity {
    /// Activity label
    pub activity: ActivityLabel,
    /// Number of occurrences
    pub frequency: u64,
    /// Color intensity in `[0, 99]` (lower is darker)
    pub color_intensity: u8,
}

impl HeuristicActivity {
    /// Fill color of the activity
    pub fn fill_color(&self) -> String {
        fill_color(self.color_intensity)
    }
}

/// Directly-follows transition kept in a [`HeuristicNet`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicTransition {
    /// Source activity
    pub from: ActivityLabel,
    /// Target activity
    pub to: ActivityLabel,
    /// Number of occurrences
    pub frequency: u64,
    /// Line weight in `[1, 6]`
    pub pen_width: f64,
}

///
/// Frequency-filtered, visually weighted directly-follows graph
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicNet {
    /// Minimal activity frequency used for filtering
    pub min_activity_freq: u64,
    /// Minimal transition frequency used for filtering
    pub min_transition_freq: u64,
    /// Kept activities (in lexicographic order)
    pub activities: Vec<HeuristicActivity>,
    /// Kept transitions (ordered by source and target)
    pub transitions: Vec<HeuristicTransition>,
    /// Kept activities that are not the target of any kept transition
    pub start_activities: BTreeSet<ActivityLabel>,
    /// Kept activities that are not the source of any kept transition
    pub end_activities: BTreeSet<ActivityLabel>,
}

impl HeuristicNet {
    ///
    /// Filter activities and transitions of a [`FrequencyAnalysis`] and derive their visual encoding
    ///
    /// An activity is kept if it occurs at least `min_activity_freq` times; a transition is kept
    /// if it occurs at least `min_transition_freq` times and both of its activities are kept.
    /// Returns [`MinerError::NoActivitiesAboveThreshold`] if no activity is kept.
    ///
    pub fn build(
        frequencies: &FrequencyAnalysis,
        min_activity_freq: u64,
        min_transition_freq: u64,
    ) -> Result<Self, MinerError> {
        let act_freqs = &frequencies.activity_frequencies;
        let kept_acts: BTreeSet<&ActivityLabel> = act_freqs
            .iter()
            .filter(|&(_, &count)| count >= min_activity_freq)
            .map(|(act, _)| act)
            .collect();
        if kept_acts.is_empty() {
            warn!(
                threshold = min_activity_freq,
                "No activity satisfies the activity frequency threshold"
            );
            return Err(MinerError::NoActivitiesAboveThreshold {
                threshold: min_activity_freq,
            });
        }

        let kept_transitions: Vec<(&ActivityLabel, &ActivityLabel, u64)> = frequencies
            .transition_frequencies
            .iter()
            .filter(|&((from, to), &count)| {
                count >= min_transition_freq && kept_acts.contains(from) && kept_acts.contains(to)
            })
            .map(|((from, to), &count)| (from, to, count))
            .collect();
        if kept_transitions.is_empty() && kept_acts.len() > 1 {
            warn!(
                threshold = min_transition_freq,
                "No transition satisfies the transition frequency threshold (or connects kept activities)"
            );
        }

        // Colors are normalized over all activities, not only the kept ones
        let min_act = act_freqs.values().copied().min().unwrap_or(1);
        let max_act = act_freqs.values().copied().max().unwrap_or(1);
        let min_trans = kept_transitions.iter().map(|t| t.2).min().unwrap_or(1);
        let max_trans = kept_transitions.iter().map(|t| t.2).max().unwrap_or(1);

        let activities = kept_acts
            .iter()
            .map(|act| {
                let frequency = act_freqs.get(*act).copied().unwrap_or(0);
                HeuristicActivity {
                    activity: (*act).clone(),
                    frequency,
                    color_intensity: color_intensity(frequency, min_act, max_act),
                }
            })
            .collect();
        let transitions: Vec<HeuristicTransition> = kept_transitions
            .iter()
            .map(|(from, to, count)| HeuristicTransition {
                from: (*from).clone(),
                to: (*to).clone(),
                frequency: *count,
                pen_width: pen_width(*count, min_trans, max_trans),
            })
            .collect();

        let targets: BTreeSet<&ActivityLabel> = kept_transitions.iter().map(|t| t.1).collect();
        let sources: BTreeSet<&ActivityLabel> = kept_transitions.iter().map(|t| t.0).collect();
        let start_activities = kept_acts
            .iter()
            .filter(|a| !targets.contains(*a))
            .map(|a| (*a).clone())
            .collect();
        let end_activities = kept_acts
            .iter()
            .filter(|a| !sources.contains(*a))
            .map(|a| (*a).clone())
            .collect();

        debug!(
            activities = kept_acts.len(),
            transitions = transitions.len(),
            "Built heuristic net"
        );
        Ok(Self {
            min_activity_freq,
            min_transition_freq,
            activities,
            transitions,
            start_activities,
            end_activities,
        })
    }

    ///
    /// Convert into a [`GraphModel`]
    ///
    /// Activity nodes are labeled with their frequency, edges with their frequency and line weight.
    /// The start (end) pseudo-event is only added if there is at least one start (end) activity.
    ///
    /// [`HeuristicNet::transitions`] is the edge list of the net itself. The edges from the start
    /// pseudo-event and to the end pseudo-event exist only in the returned [`GraphModel`].
    ///
    pub fn to_graph_model(&self) -> GraphModel {
        let mut graph = GraphModel::new(HEURISTIC_GRAPH_NAME);
        for act in &self.activities {
            let mut node = Node::activity(act.activity.as_str());
            node.label = format!("{}\n({})", act.activity, act.frequency);
            node.attributes = NodeAttributes::activity(act.fill_color());
            graph.add_node(node);
        }
        for t in &self.transitions {
            graph.add_weighted_edge(
                activity_id(&t.from),
                activity_id(&t.to),
                t.frequency.to_string(),
                t.pen_width,
            );
        }
        if !self.start_activities.is_empty() {
            graph.add_node(Node::pseudo_event(PseudoEvent::Start));
            for act in &self.start_activities {
                graph.add_edge(START_EVENT_ID, activity_id(act));
            }
        }
        if !self.end_activities.is_empty() {
            graph.add_node(Node::pseudo_event(PseudoEvent::End));
            for act in &self.end_activities {
                graph.add_edge(activity_id(act), END_EVENT_ID);
            }
        }
        graph
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
