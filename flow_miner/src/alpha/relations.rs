use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use tracing::debug;

use crate::event_log::{ActivityLabel, WorkflowLog};
use crate::frequency::DirectSuccession;

///
/// Footprint relation of an ordered pair of activities `(a, b)`
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FootprintRelation {
    /// `a -> b`: `b` directly follows `a`, but never the other way around
    Causal,
    /// `a <- b`: `a` directly follows `b`, but never the other way around
    InverseCausal,
    /// `a || b`: both directly follow each other (concurrency or a short loop)
    Parallel,
    /// `a # b`: neither directly follows the other
    #[default]
    Exclusive,
}

impl FootprintRelation {
    /// Classify a pair given whether `b` directly follows `a` and whether `a` directly follows `b`
    pub fn from_directly_follows(a_to_b: bool, b_to_a: bool) -> Self {
        match (a_to_b, b_to_a) {
            (true, false) => FootprintRelation::Causal,
            (false, true) => FootprintRelation::InverseCausal,
            (true, true) => FootprintRelation::Parallel,
            (false, false) => FootprintRelation::Exclusive,
        }
    }

    /// The relation viewed from the other activity (i.e., of `(b, a)` instead of `(a, b)`)
    pub fn inverse(self) -> Self {
        match self {
            FootprintRelation::Causal => FootprintRelation::InverseCausal,
            FootprintRelation::InverseCausal => FootprintRelation::Causal,
            rel => rel,
        }
    }

    /// Short symbol (`->`, `<-`, `||` or `#`)
    pub fn symbol(&self) -> &'static str {
        match self {
            FootprintRelation::Causal => "->",
            FootprintRelation::InverseCausal => "<-",
            FootprintRelation::Parallel => "||",
            FootprintRelation::Exclusive => "#",
        }
    }

    /// Checks if this relation orders `a` before `b` (i.e., causal or parallel)
    pub fn precedes(&self) -> bool {
        matches!(self, FootprintRelation::Causal | FootprintRelation::Parallel)
    }
}

impl Display for FootprintRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

///
/// Footprint matrix: [`FootprintRelation`] of every ordered pair of activities (including self-pairs)
///
/// Pairs involving unknown activities are [`FootprintRelation::Exclusive`].
///
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootprintMatrix {
    activities: Vec<ActivityLabel>,
    #[serde_as(as = "Vec<(_, _)>")]
    relations: BTreeMap<(ActivityLabel, ActivityLabel), FootprintRelation>,
}

impl FootprintMatrix {
    /// Relation of the ordered pair `(a, b)`
    pub fn get(&self, a: &str, b: &str) -> FootprintRelation {
        self.relations
            .get(&(a.to_string(), b.to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// Activities of the matrix, in lexicographic order
    pub fn activities(&self) -> &[ActivityLabel] {
        &self.activities
    }

    /// All classified pairs, ordered by `(a, b)`
    pub fn iter(&self) -> impl Iterator<Item = (&ActivityLabel, &ActivityLabel, FootprintRelation)> {
        self.relations.iter().map(|((a, b), rel)| (a, b, *rel))
    }

    /// Number of classified ordered pairs
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// `true` if there are no activities
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

impl Display for FootprintMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self
            .activities
            .iter()
            .map(|a| a.chars().count())
            .max()
            .unwrap_or(0)
            .max(2);
        write!(f, "{:width$}", "")?;
        for b in &self.activities {
            write!(f, " {b:width$}")?;
        }
        for a in &self.activities {
            write!(f, "\n{a:width$}")?;
            for b in &self.activities {
                write!(f, " {:width$}", self.get(a, b).symbol())?;
            }
        }
        Ok(())
    }
}

/// Causal successors (or, inverted, causal predecessors) per activity
pub type CausalitySet = BTreeMap<ActivityLabel, BTreeSet<ActivityLabel>>;

///
/// Symmetric set of unordered activity pairs in [`FootprintRelation::Parallel`] relation
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelPairs(BTreeSet<(ActivityLabel, ActivityLabel)>);

impl ParallelPairs {
    fn normalized(a: &str, b: &str) -> (ActivityLabel, ActivityLabel) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    /// Add the unordered pair `{a, b}`
    pub fn insert(&mut self, a: &str, b: &str) -> bool {
        self.0.insert(Self::normalized(a, b))
    }

    /// Checks if `{a, b}` is a parallel pair (independent of argument order)
    pub fn contains(&self, a: &str, b: &str) -> bool {
        self.0.contains(&Self::normalized(a, b))
    }

    /// Checks if any unordered pair of distinct activities drawn from `activities` is parallel
    pub fn any_pair_parallel<'a, I>(&self, activities: I) -> bool
    where
        I: IntoIterator<Item = &'a ActivityLabel>,
        I::IntoIter: Clone,
    {
        activities
            .into_iter()
            .tuple_combinations()
            .any(|(a, b)| self.contains(a, b))
    }

    /// Iterate over the (normalized) pairs
    pub fn iter(&self) -> impl Iterator<Item = &(ActivityLabel, ActivityLabel)> {
        self.0.iter()
    }

    /// Number of unordered pairs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if no pair is parallel
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

///
/// Alpha relations of a workflow log
///
/// Derived from the direct succession relation: footprint matrix, causality (and its transpose),
/// and parallel pairs. Activities are always traversed in lexicographic order.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaRelations {
    /// All activities
    pub activities: BTreeSet<ActivityLabel>,
    /// Direct succession relation (`a > b`)
    pub direct_succession: DirectSuccession,
    /// Footprint matrix
    pub footprint: FootprintMatrix,
    /// Causal successors of each activity (`a -> b`)
    pub causality: CausalitySet,
    /// Causal predecessors of each activity (transpose of [`AlphaRelations::causality`])
    pub inverse_causality: CausalitySet,
    /// Parallel pairs (`a || b`)
    pub parallel: ParallelPairs,
    /// Activities observed as the first event of some trace
    pub observed_start: BTreeSet<ActivityLabel>,
    /// Activities observed as the last event of some trace
    pub observed_end: BTreeSet<ActivityLabel>,
}

impl AlphaRelations {
    /// Compute all relations of a [`WorkflowLog`]
    pub fn from_log(log: &WorkflowLog) -> Self {
        let mut direct_succession = DirectSuccession::new();
        for trace in log.traces() {
            for pair in trace.windows(2) {
                direct_succession
                    .entry(pair[0].clone())
                    .or_default()
                    .insert(pair[1].clone());
            }
        }
        let mut ret = Self::from_direct_succession(log.activities(), direct_succession);
        ret.observed_start = log.traces().iter().filter_map(|t| t.first()).cloned().collect();
        ret.observed_end = log.traces().iter().filter_map(|t| t.last()).cloned().collect();
        ret
    }

    /// Compute the relations from a direct succession relation over the given activities
    ///
    /// The observed start/end sets are left empty, as they require the traces.
    pub fn from_direct_succession(
        activities: BTreeSet<ActivityLabel>,
        direct_succession: DirectSuccession,
    ) -> Self {
        let follows = |a: &ActivityLabel, b: &ActivityLabel| {
            direct_succession
                .get(a)
                .is_some_and(|succ| succ.contains(b))
        };
        let mut relations = BTreeMap::new();
        let mut causality = CausalitySet::new();
        let mut parallel = ParallelPairs::default();
        for a in &activities {
            for b in &activities {
                let rel = FootprintRelation::from_directly_follows(follows(a, b), follows(b, a));
                match rel {
                    FootprintRelation::Causal => {
                        causality.entry(a.clone()).or_default().insert(b.clone());
                    }
                    FootprintRelation::Parallel => {
                        parallel.insert(a, b);
                    }
                    FootprintRelation::InverseCausal | FootprintRelation::Exclusive => {}
                }
                relations.insert((a.clone(), b.clone()), rel);
            }
        }
        let inverse_causality = invert_causality(&causality);
        debug!(
            activities = activities.len(),
            causal = causality.values().map(BTreeSet::len).sum::<usize>(),
            parallel = parallel.len(),
            "Computed alpha relations"
        );
        Self {
            footprint: FootprintMatrix {
                activities: activities.iter().cloned().collect(),
                relations,
            },
            activities,
            direct_succession,
            causality,
            inverse_causality,
            parallel,
            observed_start: BTreeSet::new(),
            observed_end: BTreeSet::new(),
        }
    }

    /// Relation of the ordered pair `(a, b)`
    pub fn relation(&self, a: &str, b: &str) -> FootprintRelation {
        self.footprint.get(a, b)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Transpose a [`CausalitySet`] (successors per source into predecessors per target)
pub fn invert_causality(causality: &CausalitySet) -> CausalitySet {
    let mut inverted = CausalitySet::new();
    for (source, targets) in causality {
        for target in targets {
            inverted
                .entry(target.clone())
                .or_default()
                .insert(source.clone());
        }
    }
    inverted
}
