//! Action types, qualitative detail payloads and the per-match action log.
//!
//! [`ActionType`] is the closed registry of things a robot can be observed
//! doing. Which variants exist depends on the match phase, and the same
//! display name ("Climb") maps to different variants in different phases.
//!
//! [`ActionLog`] accumulates [`ActionRecord`]s for the match being scouted.

use crate::error::{Error, Result};
use crate::types::MatchPhase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================
// Action type registry
// ============================================

/// Kind of action a robot performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Load,
    Shoot,
    Ferry,
    AutonClimb,
    Defense,
    Incapacitated,
    Tipped,
    Foul,
    Damaged,
    EndGameClimb,
}

const AUTON_ACTIONS: &[ActionType] = &[
    ActionType::Load,
    ActionType::Shoot,
    ActionType::Ferry,
    ActionType::AutonClimb,
    ActionType::Foul,
];

const TELEOP_ACTIONS: &[ActionType] = &[
    ActionType::Load,
    ActionType::Shoot,
    ActionType::Ferry,
    ActionType::Defense,
    ActionType::Foul,
    ActionType::Incapacitated,
    ActionType::Tipped,
    ActionType::Damaged,
];

const ENDGAME_ACTIONS: &[ActionType] = &[ActionType::EndGameClimb];

impl ActionType {
    pub const ALL: [ActionType; 10] = [
        ActionType::Load,
        ActionType::Shoot,
        ActionType::Ferry,
        ActionType::AutonClimb,
        ActionType::Defense,
        ActionType::Incapacitated,
        ActionType::Tipped,
        ActionType::Foul,
        ActionType::Damaged,
        ActionType::EndGameClimb,
    ];

    /// Display name, also used as the `at` field of a transfer payload.
    ///
    /// Not unique: both climb variants are called "Climb".
    pub fn name(&self) -> &'static str {
        match self {
            ActionType::Load => "Load",
            ActionType::Shoot => "Shoot",
            ActionType::Ferry => "Ferry",
            ActionType::AutonClimb | ActionType::EndGameClimb => "Climb",
            ActionType::Defense => "Defense",
            ActionType::Incapacitated => "Incapacitated",
            ActionType::Tipped => "Tipped",
            ActionType::Foul => "Foul",
            ActionType::Damaged => "Damaged",
        }
    }

    /// Unique storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Load => "load",
            ActionType::Shoot => "shoot",
            ActionType::Ferry => "ferry",
            ActionType::AutonClimb => "auton_climb",
            ActionType::Defense => "defense",
            ActionType::Incapacitated => "incapacitated",
            ActionType::Tipped => "tipped",
            ActionType::Foul => "foul",
            ActionType::Damaged => "damaged",
            ActionType::EndGameClimb => "endgame_climb",
        }
    }

    /// Whether the UI measures how long the action took.
    pub fn has_timer(&self) -> bool {
        !matches!(self, ActionType::Foul | ActionType::Damaged)
    }

    /// Whether repeated occurrences are tallied on screen.
    pub fn has_counter(&self) -> bool {
        !matches!(self, ActionType::Foul | ActionType::Damaged)
    }

    /// Which qualitative payload this action carries.
    pub fn qualitative_kind(&self) -> QualitativeKind {
        match self {
            ActionType::Load => QualitativeKind::Load,
            ActionType::Shoot => QualitativeKind::Shoot,
            ActionType::Ferry => QualitativeKind::Ferry,
            ActionType::AutonClimb | ActionType::EndGameClimb => QualitativeKind::Climb,
            ActionType::Defense => QualitativeKind::Defense,
            ActionType::Incapacitated | ActionType::Tipped => QualitativeKind::Empty,
            ActionType::Foul => QualitativeKind::Foul,
            ActionType::Damaged => QualitativeKind::Damaged,
        }
    }

    /// Actions offered during `phase`, in on-screen order.
    pub fn available_in(phase: MatchPhase) -> &'static [ActionType] {
        match phase {
            MatchPhase::Auton => AUTON_ACTIONS,
            MatchPhase::Teleop => TELEOP_ACTIONS,
            MatchPhase::Endgame => ENDGAME_ACTIONS,
        }
    }

    pub fn is_legal_in(&self, phase: MatchPhase) -> bool {
        Self::available_in(phase).contains(self)
    }

    /// Resolve a display name in the context of a phase.
    ///
    /// Case-insensitive. Returns `None` when the phase has no action by that name.
    pub fn resolve(name: &str, phase: MatchPhase) -> Option<ActionType> {
        Self::available_in(phase)
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ActionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown action type: {}", s))
    }
}

// ============================================
// Qualitative data
// ============================================

/// Which payload shape an action type uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualitativeKind {
    Load,
    Shoot,
    Ferry,
    Climb,
    Defense,
    Foul,
    Damaged,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadData {
    pub load_location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShootData {
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FerryData {
    /// "Shoot" or "Dump"
    pub ferry_type: String,
    pub ferry_delivery: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClimbData {
    pub result: String,
    pub phase: MatchPhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefenseData {
    pub types: BTreeSet<String>,
    /// Designation of the robot being defended, e.g. "Blue2"
    pub target_robot: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoulData {
    #[serde(rename = "type")]
    pub foul_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagedData {
    pub components: BTreeSet<String>,
}

/// Structured detail attached to an action record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualitativeData {
    Load(LoadData),
    Shoot(ShootData),
    Ferry(FerryData),
    Climb(ClimbData),
    Defense(DefenseData),
    Foul(FoulData),
    Damaged(DamagedData),
    /// Incapacitated / Tipped carry no fields
    Empty,
}

impl QualitativeData {
    pub fn kind(&self) -> QualitativeKind {
        match self {
            QualitativeData::Load(_) => QualitativeKind::Load,
            QualitativeData::Shoot(_) => QualitativeKind::Shoot,
            QualitativeData::Ferry(_) => QualitativeKind::Ferry,
            QualitativeData::Climb(_) => QualitativeKind::Climb,
            QualitativeData::Defense(_) => QualitativeKind::Defense,
            QualitativeData::Foul(_) => QualitativeKind::Foul,
            QualitativeData::Damaged(_) => QualitativeKind::Damaged,
            QualitativeData::Empty => QualitativeKind::Empty,
        }
    }

    pub fn load(location: impl Into<String>) -> Self {
        QualitativeData::Load(LoadData {
            load_location: location.into(),
        })
    }

    pub fn shoot(location: impl Into<String>) -> Self {
        QualitativeData::Shoot(ShootData {
            location: location.into(),
        })
    }

    pub fn ferry(ferry_type: impl Into<String>, delivery: impl Into<String>) -> Self {
        QualitativeData::Ferry(FerryData {
            ferry_type: ferry_type.into(),
            ferry_delivery: delivery.into(),
        })
    }

    pub fn climb(result: impl Into<String>, phase: MatchPhase) -> Self {
        QualitativeData::Climb(ClimbData {
            result: result.into(),
            phase,
        })
    }

    pub fn defense<I, S>(types: I, target_robot: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QualitativeData::Defense(DefenseData {
            types: types.into_iter().map(Into::into).collect(),
            target_robot: target_robot.into(),
        })
    }

    pub fn foul(foul_type: impl Into<String>) -> Self {
        QualitativeData::Foul(FoulData {
            foul_type: foul_type.into(),
        })
    }

    pub fn damaged<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QualitativeData::Damaged(DamagedData {
            components: components.into_iter().map(Into::into).collect(),
        })
    }

    /// The payload as a JSON value with its own camelCase field names.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        let value = match self {
            QualitativeData::Load(d) => serde_json::to_value(d)?,
            QualitativeData::Shoot(d) => serde_json::to_value(d)?,
            QualitativeData::Ferry(d) => serde_json::to_value(d)?,
            QualitativeData::Climb(d) => serde_json::to_value(d)?,
            QualitativeData::Defense(d) => serde_json::to_value(d)?,
            QualitativeData::Foul(d) => serde_json::to_value(d)?,
            QualitativeData::Damaged(d) => serde_json::to_value(d)?,
            QualitativeData::Empty => serde_json::json!({ "placeholder": "" }),
        };
        Ok(value)
    }

    /// The payload serialized as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_value()?)?)
    }

    /// Parse a payload of the given kind from its JSON string form.
    pub fn from_json(kind: QualitativeKind, json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(kind, value)
    }

    /// Parse a payload of the given kind from a JSON value.
    pub fn from_value(kind: QualitativeKind, value: serde_json::Value) -> Result<Self> {
        let data = match kind {
            QualitativeKind::Load => QualitativeData::Load(serde_json::from_value(value)?),
            QualitativeKind::Shoot => QualitativeData::Shoot(serde_json::from_value(value)?),
            QualitativeKind::Ferry => QualitativeData::Ferry(serde_json::from_value(value)?),
            QualitativeKind::Climb => QualitativeData::Climb(serde_json::from_value(value)?),
            QualitativeKind::Defense => QualitativeData::Defense(serde_json::from_value(value)?),
            QualitativeKind::Foul => QualitativeData::Foul(serde_json::from_value(value)?),
            QualitativeKind::Damaged => QualitativeData::Damaged(serde_json::from_value(value)?),
            QualitativeKind::Empty => {
                // Any object is accepted, with or without the placeholder key.
                if !value.is_object() {
                    return Err(Error::Decode("empty payload must be a JSON object".to_string()));
                }
                QualitativeData::Empty
            }
        };
        Ok(data)
    }
}

// ============================================
// Action record
// ============================================

/// One observed action. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    phase: MatchPhase,
    action_type: ActionType,
    start_time_ms: i64,
    end_time_ms: Option<i64>,
    qualitative_data: Option<QualitativeData>,
}

impl ActionRecord {
    /// Build a record, checking that the type is legal in the phase, that the
    /// interval is not reversed, and that the payload fits the type.
    pub fn new(
        phase: MatchPhase,
        action_type: ActionType,
        start_time_ms: i64,
        end_time_ms: Option<i64>,
        qualitative_data: Option<QualitativeData>,
    ) -> Result<Self> {
        if !action_type.is_legal_in(phase) {
            return Err(Error::InvalidRecord(format!(
                "{} is not a {} action",
                action_type.name(),
                phase
            )));
        }
        if let Some(end) = end_time_ms {
            if end < start_time_ms {
                return Err(Error::InvalidRecord(format!(
                    "end time {} precedes start time {}",
                    end, start_time_ms
                )));
            }
        }
        if let Some(data) = &qualitative_data {
            if data.kind() != action_type.qualitative_kind() {
                return Err(Error::InvalidRecord(format!(
                    "{:?} detail does not belong to a {} action",
                    data.kind(),
                    action_type.name()
                )));
            }
        }
        Ok(Self {
            phase,
            action_type,
            start_time_ms,
            end_time_ms,
            qualitative_data,
        })
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn start_time_ms(&self) -> i64 {
        self.start_time_ms
    }

    pub fn end_time_ms(&self) -> Option<i64> {
        self.end_time_ms
    }

    pub fn qualitative_data(&self) -> Option<&QualitativeData> {
        self.qualitative_data.as_ref()
    }

    /// Elapsed time, zero when no end time was recorded.
    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms
            .map(|end| (end - self.start_time_ms) as u64)
            .unwrap_or(0)
    }

    pub fn matches(&self, phase: MatchPhase, action_type: ActionType) -> bool {
        self.phase == phase && self.action_type == action_type
    }
}

// ============================================
// Action log
// ============================================

/// Ordered actions recorded during the current match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionLog {
    records: Vec<ActionRecord>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: ActionRecord) {
        self.records.push(record);
    }

    /// Remove the most recently appended record matching both filters.
    pub fn remove_last_matching(
        &mut self,
        phase: MatchPhase,
        action_type: ActionType,
    ) -> Option<ActionRecord> {
        let index = self
            .records
            .iter()
            .rposition(|r| r.matches(phase, action_type))?;
        Some(self.records.remove(index))
    }

    pub fn count_matching(&self, phase: MatchPhase, action_type: ActionType) -> usize {
        self.records
            .iter()
            .filter(|r| r.matches(phase, action_type))
            .count()
    }

    pub fn total_duration_matching(&self, phase: MatchPhase, action_type: ActionType) -> u64 {
        self.records
            .iter()
            .filter(|r| r.matches(phase, action_type))
            .map(ActionRecord::duration_ms)
            .sum()
    }

    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn into_records(self) -> Vec<ActionRecord> {
        self.records
    }
}

impl From<Vec<ActionRecord>> for ActionLog {
    fn from(records: Vec<ActionRecord>) -> Self {
        Self { records }
    }
}
