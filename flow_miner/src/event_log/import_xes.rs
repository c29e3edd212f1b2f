use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use flate2::bufread::GzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Error as QuickXMLError;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::constants::{ACTIVITY_KEY, ACTIVITY_NAME};
use super::workflow_log_struct::{ActivityLabel, Trace, WorkflowLog};

///
/// Error encountered while importing a [`WorkflowLog`] from XES
///
#[derive(Debug, Clone)]
pub enum XESImportError {
    /// There is no top-level `<log>`
    NoTopLevelLog,
    /// IO error
    IOError(Arc<std::io::Error>),
    /// XML error (e.g., incorrect XML format)
    XMLParsingError(QuickXMLError),
}

impl std::fmt::Display for XESImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to import XES: {self:?}")
    }
}

impl std::error::Error for XESImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XESImportError::IOError(e) => Some(e.as_ref()),
            XESImportError::XMLParsingError(e) => Some(e),
            XESImportError::NoTopLevelLog => None,
        }
    }
}

impl From<std::io::Error> for XESImportError {
    fn from(e: std::io::Error) -> Self {
        Self::IOError(Arc::new(e))
    }
}

impl From<QuickXMLError> for XESImportError {
    fn from(e: QuickXMLError) -> Self {
        Self::XMLParsingError(e)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
///
/// Options for extracting activity labels from XES
///
pub struct XESImportOptions {
    /// Event attribute keys that carry the activity label, by descending priority
    ///
    /// The first key present on an event determines its label.
    /// Events carrying none of these keys are omitted from their trace.
    pub label_keys: Vec<String>,
}

impl Default for XESImportOptions {
    fn default() -> Self {
        Self {
            label_keys: vec![ACTIVITY_KEY.to_string(), ACTIVITY_NAME.to_string()],
        }
    }
}

/// Label candidates of the event currently being parsed (one slot per label key)
struct OpenEvent {
    label_slots: Vec<Option<ActivityLabel>>,
    nested_depth: usize,
}

impl OpenEvent {
    fn new(num_keys: usize) -> Self {
        Self {
            label_slots: vec![None; num_keys],
            nested_depth: 0,
        }
    }

    fn record_attribute(&mut self, t: &BytesStart<'_>, options: &XESImportOptions) {
        let Some(key) = get_attribute_string(t, "key") else {
            return;
        };
        if let Some(pos) = options.label_keys.iter().position(|k| k == &key) {
            if self.label_slots[pos].is_none() {
                self.label_slots[pos] = get_attribute_string(t, "value");
            }
        }
    }

    fn into_label(self) -> Option<ActivityLabel> {
        self.label_slots.into_iter().flatten().next()
    }
}

fn get_attribute_string(t: &BytesStart<'_>, key: &str) -> Option<String> {
    match t.try_get_attribute(key) {
        Ok(Some(attr)) => Some(
            attr.unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string()),
        ),
        _ => None,
    }
}

///
/// Import a [`WorkflowLog`] from a XES reader
///
/// Only activity labels are extracted (see [`XESImportOptions::label_keys`]).
/// Events without a label are omitted and traces that end up empty are dropped.
///
pub fn import_xes<R: BufRead>(
    reader: R,
    options: &XESImportOptions,
) -> Result<WorkflowLog, XESImportError> {
    let mut reader = Reader::from_reader(reader);
    reader.config_mut().trim_text(true);
    let mut buf: Vec<u8> = Vec::new();

    let mut log = WorkflowLog::default();
    let mut encountered_log = false;
    let mut current_trace: Option<Trace> = None;
    let mut current_event: Option<OpenEvent> = None;
    let mut trace_index = 0usize;
    let mut omitted_events = 0usize;
    let mut dropped_traces = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(t) => {
                if let Some(ev) = current_event.as_mut() {
                    if ev.nested_depth == 0 {
                        ev.record_attribute(&t, options);
                    }
                    ev.nested_depth += 1;
                } else {
                    match t.name().as_ref() {
                        b"log" => encountered_log = true,
                        b"trace" => current_trace = Some(Vec::new()),
                        b"event" => current_event = Some(OpenEvent::new(options.label_keys.len())),
                        _ => {}
                    }
                }
            }
            Event::Empty(t) => {
                if let Some(ev) = current_event.as_mut() {
                    if ev.nested_depth == 0 {
                        ev.record_attribute(&t, options);
                    }
                } else {
                    match t.name().as_ref() {
                        b"log" => encountered_log = true,
                        b"trace" => {
                            dropped_traces += 1;
                            trace_index += 1;
                        }
                        b"event" if current_trace.is_some() => {
                            warn!(trace = trace_index, "Event without attributes, omitting it");
                            omitted_events += 1;
                        }
                        _ => {}
                    }
                }
            }
            Event::End(t) => {
                if let Some(ev) = current_event.as_mut() {
                    if ev.nested_depth > 0 {
                        ev.nested_depth -= 1;
                    } else if let Some(ev) = current_event.take() {
                        match (ev.into_label(), current_trace.as_mut()) {
                            (Some(label), Some(trace)) => trace.push(label),
                            (None, Some(_)) => {
                                warn!(trace = trace_index, "Event has no activity label, omitting it");
                                omitted_events += 1;
                            }
                            (_, None) => warn!("Invalid XES format: event outside of trace"),
                        }
                    }
                } else if t.name().as_ref() == b"trace" {
                    if let Some(trace) = current_trace.take() {
                        if !log.add_trace(trace) {
                            dropped_traces += 1;
                        }
                    }
                    trace_index += 1;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !encountered_log {
        return Err(XESImportError::NoTopLevelLog);
    }
    if dropped_traces > 0 {
        warn!(dropped_traces, "Dropped traces without any labeled event");
    }
    debug!(
        traces = log.len(),
        events = log.num_events(),
        omitted_events,
        "Imported workflow log from XES"
    );
    Ok(log)
}

///
/// Import a [`WorkflowLog`] from a XES byte slice
///
/// Set `is_compressed_gz` for gzipped (`.xes.gz`) data.
///
pub fn import_xes_slice(
    xes_data: &[u8],
    is_compressed_gz: bool,
    options: &XESImportOptions,
) -> Result<WorkflowLog, XESImportError> {
    if is_compressed_gz {
        import_xes(BufReader::new(GzDecoder::new(xes_data)), options)
    } else {
        import_xes(xes_data, options)
    }
}

///
/// Import a [`WorkflowLog`] from a XES file (auto-detecting gz compression from the file extension)
///
pub fn import_xes_file<P: AsRef<Path>>(
    path: P,
    options: &XESImportOptions,
) -> Result<WorkflowLog, XESImportError> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);
    let is_gz = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));
    if is_gz {
        import_xes(BufReader::new(GzDecoder::new(file)), options)
    } else {
        import_xes(file, options)
    }
}
