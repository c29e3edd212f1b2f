use thiserror::Error;

use crate::event_log::import_xes::XESImportError;

///
/// Errors reported by the mining entry points
///
/// Degenerate-but-valid inputs (e.g., activities without any surviving transition)
/// are not errors and produce a graph instead.
///
#[derive(Error, Debug)]
pub enum MinerError {
    /// The log contained no non-empty trace (or no activity at all)
    #[error("no data: the event log does not contain any non-empty trace")]
    NoData,
    /// No activity reached the activity frequency threshold
    #[error("no activity occurs at least {threshold} time(s)")]
    NoActivitiesAboveThreshold {
        /// Minimal activity frequency that was requested
        threshold: u64,
    },
    /// Importing the event log failed
    #[error("failed to import event log")]
    Import(#[from] XESImportError),
    /// Rendering a graph failed
    #[error("failed to render graph")]
    Render(#[source] std::io::Error),
    /// Invalid configuration
    #[error("invalid miner configuration")]
    Config(#[from] serde_json::Error),
    /// Other IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),
}
