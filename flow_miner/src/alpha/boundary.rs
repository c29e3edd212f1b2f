use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::relations::FootprintMatrix;
use crate::event_log::ActivityLabel;

///
/// Formal start and end activities derived from a [`FootprintMatrix`]
///
/// An activity is a formal start activity if no other activity is causal or parallel to it,
/// and a formal end activity if it is not causal or parallel to any other activity.
/// These sets are structural and may differ from the activities observed first/last in traces.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySets {
    /// Formal start activities
    pub formal_start: BTreeSet<ActivityLabel>,
    /// Formal end activities
    pub formal_end: BTreeSet<ActivityLabel>,
}

impl BoundarySets {
    /// Compute the boundary sets over all activities of the footprint matrix
    pub fn from_footprint(footprint: &FootprintMatrix) -> Self {
        let activities = footprint.activities();
        let has_predecessor = |a: &ActivityLabel| {
            activities
                .iter()
                .any(|b| b != a && footprint.get(b, a).precedes())
        };
        let has_successor = |a: &ActivityLabel| {
            activities
                .iter()
                .any(|b| b != a && footprint.get(a, b).precedes())
        };
        Self {
            formal_start: activities
                .iter()
                .filter(|a| !has_predecessor(*a))
                .cloned()
                .collect(),
            formal_end: activities
                .iter()
                .filter(|a| !has_successor(*a))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{alpha::relations::AlphaRelations, event_log::WorkflowLog};

    fn boundary_of(traces: Vec<Vec<&str>>) -> BoundarySets {
        let rel = AlphaRelations::from_log(&WorkflowLog::new(traces));
        BoundarySets::from_footprint(&rel.footprint)
    }

    fn set(acts: &[&str]) -> BTreeSet<ActivityLabel> {
        acts.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn sequential_choice() {
        let b = boundary_of(vec![vec!["A", "B", "D"], vec!["A", "C", "D"]]);
        assert_eq!(b.formal_start, set(&["A"]));
        assert_eq!(b.formal_end, set(&["D"]));
    }

    #[test]
    fn parallel_branches_are_not_formal_end() {
        // B || C, so each of them is parallel to another activity
        let b = boundary_of(vec![vec!["A", "B", "C"], vec!["A", "C", "B"]]);
        assert_eq!(b.formal_start, set(&["A"]));
        assert!(b.formal_end.is_empty());
    }

    #[test]
    fn self_loops_do_not_exclude() {
        let b = boundary_of(vec![vec!["A", "A", "B"]]);
        assert_eq!(b.formal_start, set(&["A"]));
        assert_eq!(b.formal_end, set(&["B"]));
    }

    #[test]
    fn structural_sets_differ_from_observed() {
        let log = WorkflowLog::new(vec![vec!["a", "b", "a", "c"], vec!["b", "c"]]);
        let rel = AlphaRelations::from_log(&log);
        let b = BoundarySets::from_footprint(&rel.footprint);
        assert_eq!(rel.observed_start, set(&["a", "b"]));
        // a || b, so neither of them is a formal start activity
        assert!(b.formal_start.is_empty());
        assert_eq!(b.formal_end, set(&["c"]));
    }

    #[test]
    fn unrelated_activities_are_start_and_end() {
        let b = boundary_of(vec![vec!["x"], vec!["y"]]);
        assert_eq!(b.formal_start, set(&["x", "y"]));
        assert_eq!(b.formal_end, set(&["x", "y"]));
    }
}
