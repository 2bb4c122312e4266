//! Compact transfer-code payloads.
//!
//! Records are flattened into JSON with one- or two-letter keys so a whole
//! match fits in a single optical code. Qualitative detail travels as a
//! JSON-encoded string inside each action entry, and auto-path steps as
//! `"<tag>:<value>"` tokens.
//!
//! Decoding never rejects a record for a bad field. A scanned code cannot be
//! re-sent, so anything unreadable is dropped and reported in
//! [`Decoded::warnings`]. Only input that is not a JSON object is an error.

use crate::actions::{ActionRecord, ActionType, QualitativeData};
use crate::error::{Error, Result};
use crate::types::{AutoPath, AutoPathStep, MatchPhase, MatchScoutData, PitScoutData, StepType};
use serde::Serialize;
use serde_json::{Map, Value};

/// Payload schema version.
pub const PAYLOAD_VERSION: u64 = 1;

/// Type discriminator of pit payloads.
pub const PIT_PAYLOAD_TYPE: &str = "pit";

/// Byte capacity of a version 40 QR code at error correction M in byte mode.
pub const TRANSFER_CODE_CAPACITY: usize = 2331;

/// Whether a payload fits in a single transfer code.
pub fn fits_transfer_code(payload: &str) -> bool {
    payload.len() <= TRANSFER_CODE_CAPACITY
}

/// `<event>_<match>_<designation>_<team>`, used to name exported codes.
pub fn match_transfer_label(data: &MatchScoutData) -> String {
    format!(
        "{}_{}_{}_{}",
        data.event, data.match_number, data.robot_designation, data.team_number
    )
}

/// `Pit_<team>`, used to name exported codes.
pub fn pit_transfer_label(data: &PitScoutData) -> String {
    format!("Pit_{}", data.team_number)
}

// ============================================
// Encoding
// ============================================

#[derive(Serialize)]
struct MatchPayload<'a> {
    v: u64,
    e: &'a str,
    m: &'a str,
    rd: &'a str,
    sn: &'a str,
    t: &'a str,
    sp: &'a str,
    l: bool,
    ns: bool,
    a: Vec<ActionEntry>,
}

#[derive(Serialize)]
struct ActionEntry {
    p: MatchPhase,
    at: &'static str,
    d: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    qd: Option<String>,
}

#[derive(Serialize)]
struct PitPayload<'a> {
    v: u64,
    #[serde(rename = "type")]
    kind: &'static str,
    e: &'a str,
    t: u32,
    dt: &'a str,
    pr: &'a str,
    pp: &'a str,
    ap: Vec<PathEntry<'a>>,
}

#[derive(Serialize)]
struct PathEntry<'a> {
    n: &'a str,
    s: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    d: Option<&'a str>,
}

/// Encode a match record.
pub fn encode_match(data: &MatchScoutData) -> Result<String> {
    let actions = data
        .action_records
        .iter()
        .map(|record| {
            Ok(ActionEntry {
                p: record.phase(),
                at: record.action_type().name(),
                d: record.duration_ms(),
                qd: record
                    .qualitative_data()
                    .map(QualitativeData::to_json)
                    .transpose()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let payload = MatchPayload {
        v: PAYLOAD_VERSION,
        e: &data.event,
        m: &data.match_number,
        rd: &data.robot_designation,
        sn: &data.scout_name,
        t: &data.team_number,
        sp: &data.start_position,
        l: data.loaded,
        ns: data.no_show,
        a: actions,
    };
    Ok(serde_json::to_string(&payload)?)
}

/// Encode a pit record. The photo is never included.
pub fn encode_pit(data: &PitScoutData) -> Result<String> {
    let paths = data
        .auto_paths
        .iter()
        .map(|path| PathEntry {
            n: &path.name,
            s: path.steps.iter().map(step_token).collect(),
            d: path.drawing_path.as_deref().map(file_name),
        })
        .collect();

    let payload = PitPayload {
        v: PAYLOAD_VERSION,
        kind: PIT_PAYLOAD_TYPE,
        e: &data.event,
        t: data.team_number,
        dt: &data.drivetrain_type,
        pr: &data.preferred_role,
        pp: &data.preferred_path,
        ap: paths,
    };
    Ok(serde_json::to_string(&payload)?)
}

fn step_token(step: &AutoPathStep) -> String {
    format!("{}:{}", step.step_type.tag(), step.value)
}

/// Text after the last `/`.
fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

// ============================================
// Decoding
// ============================================

/// A decoded record plus everything that had to be dropped to get it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> Decoded<T> {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// A payload of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Match(MatchScoutData),
    Pit(PitScoutData),
}

/// Decode a payload, choosing the record kind from its `type` key.
pub fn decode(text: &str) -> Result<Decoded<Payload>> {
    let object = parse_object(text)?;
    if object.get("type").and_then(Value::as_str) == Some(PIT_PAYLOAD_TYPE) {
        let Decoded { value, warnings } = decode_pit_object(object);
        Ok(Decoded {
            value: Payload::Pit(value),
            warnings,
        })
    } else {
        let Decoded { value, warnings } = decode_match_object(object);
        Ok(Decoded {
            value: Payload::Match(value),
            warnings,
        })
    }
}

/// Decode a match payload.
///
/// Decoded records start at 0 and end at their duration.
pub fn decode_match(text: &str) -> Result<Decoded<MatchScoutData>> {
    Ok(decode_match_object(parse_object(text)?))
}

/// Decode a pit payload.
pub fn decode_pit(text: &str) -> Result<Decoded<PitScoutData>> {
    Ok(decode_pit_object(parse_object(text)?))
}

fn parse_object(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::Decode(format!(
            "payload must be a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(Error::Decode(format!("payload is not JSON: {}", e))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Collects warnings while reading fields of one payload.
struct Reader {
    warnings: Vec<String>,
}

impl Reader {
    fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!(%message, "payload decode");
        self.warnings.push(message);
    }

    fn check_version(&mut self, object: &Map<String, Value>) {
        match object.get("v").and_then(Value::as_u64) {
            Some(PAYLOAD_VERSION) => {}
            Some(v) => self.warn(format!("unknown payload version {}", v)),
            None => self.warn("missing payload version".to_string()),
        }
    }

    /// A string field; numbers are accepted and rendered as text.
    fn string(&mut self, object: &Map<String, Value>, key: &str) -> String {
        match object.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                self.warn(format!("field '{}' is {}, expected a string", key, json_kind(other)));
                String::new()
            }
        }
    }

    fn boolean(&mut self, object: &Map<String, Value>, key: &str) -> bool {
        match object.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                self.warn(format!("field '{}' is {}, expected a boolean", key, json_kind(other)));
                false
            }
        }
    }

    fn array<'a>(&mut self, object: &'a Map<String, Value>, key: &str) -> &'a [Value] {
        match object.get(key) {
            None | Some(Value::Null) => &[],
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.warn(format!("field '{}' is {}, expected an array", key, json_kind(other)));
                &[]
            }
        }
    }

    fn action(&mut self, index: usize, entry: &Value) -> Option<ActionRecord> {
        let Some(entry) = entry.as_object() else {
            self.warn(format!("action {} is not an object", index));
            return None;
        };

        let phase_name = entry.get("p").and_then(Value::as_str).unwrap_or_default();
        let type_name = entry.get("at").and_then(Value::as_str).unwrap_or_default();
        let resolved = phase_name
            .parse::<MatchPhase>()
            .ok()
            .and_then(|phase| Some((phase, ActionType::resolve(type_name, phase)?)));
        let Some((phase, action_type)) = resolved else {
            self.warn(format!(
                "action {}: unknown action '{}' in phase '{}'",
                index, type_name, phase_name
            ));
            return None;
        };

        let duration = match entry.get("d") {
            None => 0,
            Some(d) => match d.as_u64().and_then(|d| i64::try_from(d).ok()) {
                Some(d) => d,
                None => {
                    self.warn(format!("action {}: invalid duration {}", index, d));
                    0
                }
            },
        };

        let qualitative_data = match entry.get("qd") {
            None | Some(Value::Null) => None,
            Some(Value::String(json)) => {
                match QualitativeData::from_json(action_type.qualitative_kind(), json) {
                    Ok(data) => Some(data),
                    Err(e) => {
                        self.warn(format!("action {}: dropped qualitative data: {}", index, e));
                        None
                    }
                }
            }
            Some(other) => {
                self.warn(format!(
                    "action {}: qualitative data is {}, expected a string",
                    index,
                    json_kind(other)
                ));
                None
            }
        };

        match ActionRecord::new(phase, action_type, 0, Some(duration), qualitative_data) {
            Ok(record) => Some(record),
            Err(e) => {
                self.warn(format!("action {}: {}", index, e));
                None
            }
        }
    }

    fn auto_path(&mut self, index: usize, entry: &Value) -> Option<AutoPath> {
        let Some(entry) = entry.as_object() else {
            self.warn(format!("auto path {} is not an object", index));
            return None;
        };

        let name = self.string(entry, "n");
        let mut steps = Vec::new();
        for token in self.array(entry, "s") {
            match token.as_str().and_then(parse_step_token) {
                Some(step) => steps.push(step),
                None => self.warn(format!("auto path {}: bad step token {}", index, token)),
            }
        }
        let drawing = self.string(entry, "d");

        Some(AutoPath {
            name,
            steps,
            drawing_path: (!drawing.is_empty()).then_some(drawing),
        })
    }
}

fn parse_step_token(token: &str) -> Option<AutoPathStep> {
    let (tag, value) = token.split_once(':')?;
    let mut chars = tag.chars();
    let step_type = StepType::from_tag(chars.next()?)?;
    if chars.next().is_some() {
        return None;
    }
    Some(AutoPathStep::new(step_type, value))
}

fn decode_match_object(object: Map<String, Value>) -> Decoded<MatchScoutData> {
    let mut reader = Reader::new();
    reader.check_version(&object);

    let mut data = MatchScoutData {
        event: reader.string(&object, "e"),
        match_number: reader.string(&object, "m"),
        robot_designation: reader.string(&object, "rd"),
        scout_name: reader.string(&object, "sn"),
        team_number: reader.string(&object, "t"),
        start_position: reader.string(&object, "sp"),
        loaded: reader.boolean(&object, "l"),
        no_show: reader.boolean(&object, "ns"),
        ..Default::default()
    };

    let entries = reader.array(&object, "a");
    data.action_records = entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| reader.action(i, entry))
        .collect();

    Decoded {
        value: data,
        warnings: reader.warnings,
    }
}

fn decode_pit_object(object: Map<String, Value>) -> Decoded<PitScoutData> {
    let mut reader = Reader::new();
    reader.check_version(&object);

    let team = reader.string(&object, "t");
    let team_number = match team.trim().parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            reader.warn(format!("invalid team number '{}'", team));
            0
        }
    };

    let mut data = PitScoutData {
        event: reader.string(&object, "e"),
        team_number,
        drivetrain_type: reader.string(&object, "dt"),
        preferred_role: reader.string(&object, "pr"),
        preferred_path: reader.string(&object, "pp"),
        ..Default::default()
    };

    let entries = reader.array(&object, "ap");
    data.auto_paths = entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| reader.auto_path(i, entry))
        .collect();

    Decoded {
        value: data,
        warnings: reader.warnings,
    }
}
