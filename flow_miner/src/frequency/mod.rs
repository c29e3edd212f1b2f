//! Activity and directly-follows frequencies of a workflow log
pub mod frequency_struct;

#[doc(inline)]
pub use frequency_struct::{
    ActivityFrequency, DirectSuccession, FrequencyAnalysis, TransitionFrequency,
};
