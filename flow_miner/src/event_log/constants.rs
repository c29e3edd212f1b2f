/// Common identifying field for event identities (i.e., activities) in the XES concept extension
///
/// _Note_: Some XES files do not use `concept:name` but a plain `Activity` attribute (see [`ACTIVITY_KEY`]).
pub const ACTIVITY_NAME: &str = "concept:name";
/// Plain `Activity` attribute key, used by several exported logs instead of [`ACTIVITY_NAME`]
///
/// Takes precedence over [`ACTIVITY_NAME`] when both are present on an event.
pub const ACTIVITY_KEY: &str = "Activity";
