use std::{fs::File, io::BufReader, path::Path};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{alpha::graph_synthesis::GatewayPolicy, error::MinerError};

/// Default output base name of heuristic nets
pub const HEURISTIC_OUTPUT_BASE: &str = "heuristic_net";

/// Default output base name of alpha graphs
pub const ALPHA_OUTPUT_BASE: &str = "alpha_bpmn_graph";

/// Which miner to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MinerType {
    /// Frequency-filtered directly-follows graph
    #[default]
    Heuristic,
    /// Alpha relations with synthesized gateways
    Alpha,
}

impl MinerType {
    /// Default output base name for graphs of this miner
    pub fn default_output_base(&self) -> &'static str {
        match self {
            MinerType::Heuristic => HEURISTIC_OUTPUT_BASE,
            MinerType::Alpha => ALPHA_OUTPUT_BASE,
        }
    }
}

///
/// Miner configuration
///
/// The frequency thresholds are only used by the heuristic miner, the gateway policy only by the alpha miner.
/// Missing fields fall back to their default when deserializing, so `{}` is a valid configuration.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MinerConfig {
    /// Miner to run
    pub miner: MinerType,
    /// Minimal number of occurrences of a kept activity
    pub min_activity_freq: u64,
    /// Minimal number of occurrences of a kept transition
    pub min_transition_freq: u64,
    /// Type of gateways inserted by the alpha miner
    pub gateway_policy: GatewayPolicy,
}

impl MinerConfig {
    /// Parse a [`MinerConfig`] from a JSON string
    pub fn from_json(json: &str) -> Result<Self, MinerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a [`MinerConfig`] from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MinerError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// JSON schema of the serialized [`MinerConfig`]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(MinerConfig)
    }

    ///
    /// Base name (without extension) of output files for this configuration
    ///
    /// Heuristic nets encode their thresholds in the name (see [`heuristic_output_base`]).
    ///
    pub fn output_base(&self) -> String {
        let base = self.miner.default_output_base();
        match self.miner {
            MinerType::Heuristic => heuristic_output_base(base, self),
            MinerType::Alpha => base.to_string(),
        }
    }
}

/// Append the frequency thresholds of `config` to `base`: `{base}_filtered_act{a}_trans{t}`
pub fn heuristic_output_base(base: &str, config: &MinerConfig) -> String {
    format!(
        "{base}_filtered_act{}_trans{}",
        config.min_activity_freq, config.min_transition_freq
    )
}
