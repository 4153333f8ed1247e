//! Defensive conversion of a catalog payload into scenarios.
//!
//! The payload is authored by hand in a spreadsheet and served by a script,
//! so every field is checked. A scenario record that fails a check is
//! rejected as a whole and reported; the remaining records still load.
//!
//! Accepted shapes per field:
//! - `id`: non-empty string or JSON number (normalized to its string form)
//! - `label`: string; absent, null or blank falls back to the id
//! - `category`: string or null
//! - `messages`: array of objects
//! - `text`, `timeLabel`: string or null
//! - `delay` (or `delayMs` / `delay_ms`): non-negative integer, a string
//!   holding one, or null; negative, fractional and non-numeric values reject
//!   the scenario

use std::collections::HashSet;
use std::fmt;

use linesim_core::{MessageTemplate, Scenario, ScenarioId};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{CatalogError, CatalogResult};

const DELAY_KEYS: &[&str] = &["delay", "delayMs", "delay_ms"];
const TIME_LABEL_KEYS: &[&str] = &["timeLabel", "time_label"];

/// Why a scenario record was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The record is not a JSON object.
    NotAnObject,
    /// The record has no usable `id`.
    MissingId,
    /// An earlier record already used this id.
    DuplicateId,
    /// `messages` is absent or not an array.
    MissingMessages,
    /// A message entry is not a JSON object.
    MessageNotObject {
        /// Position of the message within the scenario.
        index: usize,
    },
    /// A message delay is negative, fractional or not a number.
    InvalidDelay {
        /// Position of the message within the scenario.
        index: usize,
        /// The offending value as JSON.
        found: String,
    },
    /// A field has the wrong JSON type.
    InvalidField {
        /// Position of the message, or `None` for scenario-level fields.
        index: Option<usize>,
        /// Field name.
        field: &'static str,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => f.write_str("record is not an object"),
            Self::MissingId => f.write_str("missing or invalid id"),
            Self::DuplicateId => f.write_str("duplicate id"),
            Self::MissingMessages => f.write_str("messages is missing or not an array"),
            Self::MessageNotObject { index } => write!(f, "message #{index} is not an object"),
            Self::InvalidDelay { index, found } => {
                write!(f, "message #{index} has an invalid delay: {found}")
            },
            Self::InvalidField {
                index: Some(index),
                field,
            } => write!(f, "message #{index} field '{field}' must be a string"),
            Self::InvalidField { index: None, field } => {
                write!(f, "field '{field}' must be a string")
            },
        }
    }
}

/// A rejected catalog record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Position in the payload array.
    pub position: usize,
    /// The record's id, when one could be read.
    pub id: Option<String>,
    /// Why it was rejected.
    pub reason: RejectReason,
}

impl fmt::Display for RejectedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "entry {} ('{id}'): {}", self.position, self.reason),
            None => write!(f, "entry {}: {}", self.position, self.reason),
        }
    }
}

/// Result of ingesting an array payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ingested {
    /// Accepted scenarios in payload order.
    pub scenarios: Vec<Scenario>,
    /// Rejected records in payload order.
    pub rejected: Vec<RejectedEntry>,
}

/// Convert a catalog payload into scenarios.
///
/// # Errors
///
/// Returns [`CatalogError::Server`] if the payload is an object with a string
/// `error` field, or [`CatalogError::Shape`] for any other non-array payload.
/// Problems with individual records never fail the whole payload.
pub fn ingest(payload: &Value) -> CatalogResult<Ingested> {
    let records = match payload {
        Value::Array(records) => records,
        Value::Object(obj) => {
            if let Some(Value::String(message)) = obj.get("error") {
                return Err(CatalogError::Server(message.clone()));
            }
            return Err(CatalogError::Shape { found: "object" });
        },
        other => {
            return Err(CatalogError::Shape {
                found: json_type(other),
            });
        },
    };

    let mut out = Ingested::default();
    let mut seen = HashSet::new();

    for (position, record) in records.iter().enumerate() {
        match parse_scenario(record) {
            Ok(scenario) => {
                if seen.insert(scenario.id.clone()) {
                    out.scenarios.push(scenario);
                } else {
                    reject(&mut out, position, Some(scenario.id.0), RejectReason::DuplicateId);
                }
            },
            Err(reason) => {
                let id = record.as_object().and_then(|obj| read_id(obj).ok());
                reject(&mut out, position, id, reason);
            },
        }
    }

    debug!(
        accepted = out.scenarios.len(),
        rejected = out.rejected.len(),
        "catalog payload ingested"
    );
    Ok(out)
}

fn reject(out: &mut Ingested, position: usize, id: Option<String>, reason: RejectReason) {
    let entry = RejectedEntry {
        position,
        id,
        reason,
    };
    warn!(%entry, "catalog entry rejected");
    out.rejected.push(entry);
}

fn parse_scenario(record: &Value) -> Result<Scenario, RejectReason> {
    let obj = record.as_object().ok_or(RejectReason::NotAnObject)?;
    let id = read_id(obj)?;

    let label = optional_string(obj, "label").map_err(|()| RejectReason::InvalidField {
        index: None,
        field: "label",
    })?;
    let label = match label {
        Some(l) if !l.trim().is_empty() => l,
        _ => id.clone(),
    };
    let category = optional_string(obj, "category").map_err(|()| RejectReason::InvalidField {
        index: None,
        field: "category",
    })?;

    let raw_messages = obj
        .get("messages")
        .and_then(Value::as_array)
        .ok_or(RejectReason::MissingMessages)?;
    let messages = raw_messages
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_message(index, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Scenario {
        id: ScenarioId(id),
        label,
        category,
        messages,
    })
}

fn parse_message(index: usize, raw: &Value) -> Result<MessageTemplate, RejectReason> {
    let obj = raw
        .as_object()
        .ok_or(RejectReason::MessageNotObject { index })?;

    let text = optional_string(obj, "text").map_err(|()| RejectReason::InvalidField {
        index: Some(index),
        field: "text",
    })?;
    let time_label = first_present(obj, TIME_LABEL_KEYS)
        .map(|v| match v {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            _ => Err(RejectReason::InvalidField {
                index: Some(index),
                field: "timeLabel",
            }),
        })
        .transpose()?
        .flatten();
    let delay_ms = match first_present(obj, DELAY_KEYS) {
        None => 0,
        Some(v) => parse_delay(v).ok_or_else(|| RejectReason::InvalidDelay {
            index,
            found: v.to_string(),
        })?,
    };

    Ok(MessageTemplate {
        text,
        delay_ms,
        time_label,
    })
}

fn parse_delay(value: &Value) -> Option<u64> {
    match value {
        Value::Null => Some(0),
        Value::Number(n) => n.as_u64(),
        Value::String(s) if s.trim().is_empty() => Some(0),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn read_id(obj: &Map<String, Value>) -> Result<String, RejectReason> {
    match obj.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_owned()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(RejectReason::MissingId),
    }
}

/// `Ok(None)` for absent or null, `Err(())` for a non-string value.
fn optional_string(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, ()> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(()),
    }
}

fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
