#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]

#![doc = include_str!("../README.md")]

///
/// Workflow logs (traces of activity labels) and their import from XES
///
pub mod event_log {
    /// Constants
    pub mod constants;
    /// XES Import (activity labels only)
    pub mod import_xes;
    /// [`WorkflowLog`] struct
    pub mod workflow_log_struct;

    #[doc(inline)]
    pub use workflow_log_struct::{ActivityLabel, Trace, WorkflowLog};

    #[cfg(test)]
    mod tests;
}

/// Activity and directly-follows frequencies
pub mod frequency;

///
/// Alpha relations and gateway synthesis
///
pub mod alpha {
    /// Formal start and end activities
    pub mod boundary;
    /// Gateway synthesis
    pub mod graph_synthesis;
    /// Footprint relations (causal, parallel, exclusive)
    pub mod relations;

    #[doc(inline)]
    pub use boundary::BoundarySets;
    #[doc(inline)]
    pub use graph_synthesis::{synthesize_alpha_graph, GatewayPolicy, GraphSynthesizer};
    #[doc(inline)]
    pub use relations::{AlphaRelations, FootprintMatrix, FootprintRelation};
}

///
/// Heuristic nets (frequency-filtered directly-follows graphs)
///
pub mod heuristic {
    /// [`HeuristicNet`] struct and its visual encoding
    pub mod heuristic_net;

    #[doc(inline)]
    pub use heuristic_net::HeuristicNet;
}

///
/// Renderer-independent graphs
///
pub mod graph {
    /// [`GraphModel`] struct and sub-structs
    pub mod graph_model;
    #[cfg(feature = "graphviz-export")]
    /// Export [`GraphModel`] to DOT and images (SVG, PNG, ...)
    ///
    /// __Requires the `graphviz-export` feature to be enabled__
    ///
    /// Rendering images also requires an active graphviz installation in the PATH.
    /// See also <https://github.com/besok/graphviz-rust?tab=readme-ov-file#caveats> and <https://graphviz.org/download/>
    pub mod image_export;

    #[doc(inline)]
    pub use graph_model::GraphModel;
}

/// Miner configuration
pub mod config;

/// Errors
pub mod error;

#[cfg(test)]
mod utils;

use tracing::{debug, info};

use alpha::{AlphaRelations, BoundarySets, GatewayPolicy, GraphSynthesizer};
use frequency::FrequencyAnalysis;

#[doc(inline)]
pub use config::{MinerConfig, MinerType};

#[doc(inline)]
pub use error::MinerError;

#[doc(inline)]
pub use event_log::WorkflowLog;

#[doc(inline)]
pub use event_log::import_xes::import_xes_file;

#[doc(inline)]
pub use event_log::import_xes::import_xes_slice;

#[doc(inline)]
pub use event_log::import_xes::XESImportOptions;

#[doc(inline)]
pub use graph::GraphModel;

#[doc(inline)]
pub use heuristic::HeuristicNet;

#[cfg(feature = "graphviz-export")]
#[doc(inline)]
pub use graph::image_export::graph_model_to_dot;

#[cfg(feature = "graphviz-export")]
#[doc(inline)]
pub use graph::image_export::export_graph_image_png;

#[cfg(feature = "graphviz-export")]
#[doc(inline)]
pub use graph::image_export::export_graph_image_svg;

///
/// Result of the alpha miner: relations, boundary sets and the synthesized graph
///
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlphaMiningResult {
    /// Footprint, causality and parallelism of the log
    pub relations: AlphaRelations,
    /// Formal start and end activities
    pub boundary: BoundarySets,
    /// Gateway-annotated graph
    pub graph: GraphModel,
}

///
/// Build a [`HeuristicNet`] of a [`WorkflowLog`] using the thresholds of the [`MinerConfig`]
///
/// Returns [`MinerError::NoData`] for logs without any (non-empty) trace and
/// [`MinerError::NoActivitiesAboveThreshold`] if the activity threshold filters out everything.
///
pub fn mine_heuristic_net(
    log: &WorkflowLog,
    config: &MinerConfig,
) -> Result<HeuristicNet, MinerError> {
    if log.is_empty() {
        return Err(MinerError::NoData);
    }
    let frequencies = FrequencyAnalysis::from_log(log);
    debug!(
        activities = frequencies.activity_frequencies.len(),
        transitions = frequencies.transition_frequencies.len(),
        "Counted frequencies"
    );
    HeuristicNet::build(
        &frequencies,
        config.min_activity_freq,
        config.min_transition_freq,
    )
}

///
/// Run the alpha miner on a [`WorkflowLog`] (with [`GatewayPolicy::Auto`])
///
/// Also see [`mine_alpha_graph_with_policy`].
///
pub fn mine_alpha_graph(log: &WorkflowLog) -> Result<AlphaMiningResult, MinerError> {
    mine_alpha_graph_with_policy(log, GatewayPolicy::default())
}

///
/// Run the alpha miner on a [`WorkflowLog`], choosing gateway types according to `policy`
///
pub fn mine_alpha_graph_with_policy(
    log: &WorkflowLog,
    policy: GatewayPolicy,
) -> Result<AlphaMiningResult, MinerError> {
    if log.is_empty() {
        return Err(MinerError::NoData);
    }
    let relations = AlphaRelations::from_log(log);
    let boundary = BoundarySets::from_footprint(&relations.footprint);
    debug!(
        activities = relations.activities.len(),
        parallel_pairs = relations.parallel.len(),
        formal_start = boundary.formal_start.len(),
        formal_end = boundary.formal_end.len(),
        "Classified alpha relations"
    );
    let graph = GraphSynthesizer::from_relations(&relations)
        .with_gateway_policy(policy)
        .synthesize(&boundary);
    Ok(AlphaMiningResult {
        relations,
        boundary,
        graph,
    })
}

///
/// Run the miner selected in the [`MinerConfig`] and return the resulting [`GraphModel`]
///
pub fn mine(log: &WorkflowLog, config: &MinerConfig) -> Result<GraphModel, MinerError> {
    info!(
        miner = ?config.miner,
        traces = log.len(),
        events = log.num_events(),
        "Mining workflow log"
    );
    match config.miner {
        MinerType::Heuristic => Ok(mine_heuristic_net(log, config)?.to_graph_model()),
        MinerType::Alpha => Ok(mine_alpha_graph_with_policy(log, config.gateway_policy)?.graph),
    }
}
