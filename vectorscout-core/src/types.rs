//! Core domain types for vectorscout
//!
//! These types describe what a scout records about a robot, either while
//! watching a match or while interviewing a team in the pits.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Event** | A competition, identified by its event code (e.g. `2026miket`) |
//! | **Alliance** | One of two three-robot groups (Red/Blue) in a match |
//! | **Designation** | Alliance color plus slot (`Red1` .. `Blue3`) of the scouted robot |
//! | **Phase** | Autonomous, teleoperated or end-game segment of a match |
//! | **Action** | A timed, located thing the robot did (load, shoot, climb, ...) |
//! | **Auto path** | A pit-reported autonomous routine as start/action/location steps |

use crate::actions::{ActionRecord, ActionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Match phase
// ============================================

/// Time segment of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchPhase {
    Auton,
    Teleop,
    Endgame,
}

impl MatchPhase {
    pub const ALL: [MatchPhase; 3] = [MatchPhase::Auton, MatchPhase::Teleop, MatchPhase::Endgame];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPhase::Auton => "AUTON",
            MatchPhase::Teleop => "TELEOP",
            MatchPhase::Endgame => "ENDGAME",
        }
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MatchPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUTON" => Ok(MatchPhase::Auton),
            "TELEOP" => Ok(MatchPhase::Teleop),
            "ENDGAME" => Ok(MatchPhase::Endgame),
            _ => Err(format!("unknown match phase: {}", s)),
        }
    }
}

// ============================================
// Alliance / robot designation
// ============================================

/// Alliance color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alliance {
    Red,
    Blue,
}

impl Alliance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alliance::Red => "Red",
            Alliance::Blue => "Blue",
        }
    }

    pub fn opponent(&self) -> Alliance {
        match self {
            Alliance::Red => Alliance::Blue,
            Alliance::Blue => Alliance::Red,
        }
    }
}

/// Which of the six robots in a match is being scouted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RobotDesignation {
    Red1,
    Red2,
    Red3,
    Blue1,
    Blue2,
    Blue3,
}

impl RobotDesignation {
    pub const ALL: [RobotDesignation; 6] = [
        RobotDesignation::Red1,
        RobotDesignation::Red2,
        RobotDesignation::Red3,
        RobotDesignation::Blue1,
        RobotDesignation::Blue2,
        RobotDesignation::Blue3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RobotDesignation::Red1 => "Red1",
            RobotDesignation::Red2 => "Red2",
            RobotDesignation::Red3 => "Red3",
            RobotDesignation::Blue1 => "Blue1",
            RobotDesignation::Blue2 => "Blue2",
            RobotDesignation::Blue3 => "Blue3",
        }
    }

    pub fn alliance(&self) -> Alliance {
        match self {
            RobotDesignation::Red1 | RobotDesignation::Red2 | RobotDesignation::Red3 => {
                Alliance::Red
            }
            RobotDesignation::Blue1 | RobotDesignation::Blue2 | RobotDesignation::Blue3 => {
                Alliance::Blue
            }
        }
    }

    /// Slot within the alliance, 1 to 3.
    pub fn slot(&self) -> u8 {
        match self {
            RobotDesignation::Red1 | RobotDesignation::Blue1 => 1,
            RobotDesignation::Red2 | RobotDesignation::Blue2 => 2,
            RobotDesignation::Red3 | RobotDesignation::Blue3 => 3,
        }
    }

    /// The three designations on the given alliance.
    pub fn of_alliance(alliance: Alliance) -> [RobotDesignation; 3] {
        match alliance {
            Alliance::Red => [
                RobotDesignation::Red1,
                RobotDesignation::Red2,
                RobotDesignation::Red3,
            ],
            Alliance::Blue => [
                RobotDesignation::Blue1,
                RobotDesignation::Blue2,
                RobotDesignation::Blue3,
            ],
        }
    }
}

impl std::fmt::Display for RobotDesignation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RobotDesignation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RobotDesignation::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown robot designation: {}", s))
    }
}

// ============================================
// Match scouting record
// ============================================

/// Everything recorded about one robot in one match.
///
/// `match_number` and `team_number` are kept as entered; the transfer
/// payload carries them as strings.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchScoutData {
    /// Store-assigned ID, `None` until persisted
    pub id: Option<i64>,
    pub event: String,
    pub match_number: String,
    pub robot_designation: String,
    pub scout_name: String,
    pub team_number: String,
    /// Start zone label from the start-position diagram
    pub start_position: String,
    /// Robot started with a preloaded game piece
    pub loaded: bool,
    /// Robot never showed up for the match
    pub no_show: bool,
    pub action_records: Vec<ActionRecord>,
    pub created_at: DateTime<Utc>,
    /// A transfer code has been rendered for this record
    pub transfer_generated: bool,
}

impl Default for MatchScoutData {
    fn default() -> Self {
        Self {
            id: None,
            event: String::new(),
            match_number: String::new(),
            robot_designation: String::new(),
            scout_name: String::new(),
            team_number: String::new(),
            start_position: String::new(),
            loaded: false,
            no_show: false,
            action_records: Vec::new(),
            created_at: Utc::now(),
            transfer_generated: false,
        }
    }
}

impl MatchScoutData {
    /// Number of recorded actions of `action_type` in `phase`.
    pub fn action_count(&self, phase: MatchPhase, action_type: ActionType) -> usize {
        self.action_records
            .iter()
            .filter(|r| r.matches(phase, action_type))
            .count()
    }

    /// Total time spent on `action_type` in `phase`, in milliseconds.
    pub fn total_action_time(&self, phase: MatchPhase, action_type: ActionType) -> u64 {
        self.action_records
            .iter()
            .filter(|r| r.matches(phase, action_type))
            .map(ActionRecord::duration_ms)
            .sum()
    }

    /// Parsed designation, if the stored string is one of the six known values.
    pub fn designation(&self) -> Option<RobotDesignation> {
        self.robot_designation.parse().ok()
    }
}

// ============================================
// Pit scouting record
// ============================================

/// Category of an auto-path step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepType {
    Start,
    Action,
    Location,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Start => "START",
            StepType::Action => "ACTION",
            StepType::Location => "LOCATION",
        }
    }

    /// Single-letter tag used in compact step tokens (`S`, `A`, `L`).
    pub fn tag(&self) -> char {
        match self {
            StepType::Start => 'S',
            StepType::Action => 'A',
            StepType::Location => 'L',
        }
    }

    pub fn from_tag(tag: char) -> Option<StepType> {
        match tag.to_ascii_uppercase() {
            'S' => Some(StepType::Start),
            'A' => Some(StepType::Action),
            'L' => Some(StepType::Location),
            _ => None,
        }
    }
}

/// One step of an auto path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoPathStep {
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub value: String,
}

impl AutoPathStep {
    pub fn new(step_type: StepType, value: impl Into<String>) -> Self {
        Self {
            step_type,
            value: value.into(),
        }
    }

    pub fn start(value: impl Into<String>) -> Self {
        Self::new(StepType::Start, value)
    }

    pub fn action(value: impl Into<String>) -> Self {
        Self::new(StepType::Action, value)
    }

    pub fn location(value: impl Into<String>) -> Self {
        Self::new(StepType::Location, value)
    }
}

/// A named autonomous routine reported during pit scouting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AutoPath {
    pub name: String,
    pub steps: Vec<AutoPathStep>,
    /// Device path of a freehand drawing of the route
    pub drawing_path: Option<String>,
}

/// Team-level record captured in the pits.
#[derive(Debug, Clone, PartialEq)]
pub struct PitScoutData {
    /// Store-assigned ID, `None` until persisted
    pub id: Option<i64>,
    pub event: String,
    pub team_number: u32,
    pub drivetrain_type: String,
    pub preferred_role: String,
    pub preferred_path: String,
    /// Device path of the robot photo; never transferred in a payload
    pub photo_path: Option<String>,
    pub auto_paths: Vec<AutoPath>,
    pub created_at: DateTime<Utc>,
}

impl Default for PitScoutData {
    fn default() -> Self {
        Self {
            id: None,
            event: String::new(),
            team_number: 0,
            drivetrain_type: String::new(),
            preferred_role: String::new(),
            preferred_path: String::new(),
            photo_path: None,
            auto_paths: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

// ============================================
// Fixed option lists
// ============================================

/// Option lists offered by the scouting forms.
pub mod options {
    pub const START_LOCATIONS: &[&str] = &["L1", "L2", "L3", "L3a", "L3b", "L4", "L5"];
    pub const SHOOT_LOCATIONS: &[&str] = &["H", "R1", "R2", "L1", "L2"];
    pub const FERRY_TYPES: &[&str] = &["Shoot", "Dump"];
    pub const AUTON_CLIMB_RESULTS: &[&str] = &["L1", "Fail"];
    pub const TELEOP_CLIMB_RESULTS: &[&str] = &["L1", "L2", "L3", "Fail"];
    pub const DEFENSE_TYPES: &[&str] = &["Pin", "Altered Shot", "Block"];
    pub const FOUL_TYPES: &[&str] = &["Major", "Minor"];
    pub const DAMAGED_COMPONENTS: &[&str] = &["Drivetrain", "Intake", "Shooter", "Climber"];

    pub const DRIVETRAIN_TYPES: &[&str] = &["Swerve", "Tank", "Mecanum", "Other"];
    pub const PREFERRED_ROLES: &[&str] = &["Score", "Ferry", "Defense"];
    pub const PREFERRED_PATHS: &[&str] = &["Trench", "Bump", "Both"];
    pub const PIT_START_POSITIONS: &[&str] = &["1", "2", "3", "3a", "3b", "4", "5"];
    pub const PATH_ACTIONS: &[&str] = &["Load", "Score", "Ferry", "Move", "Climb"];

    /// Climb results offered in a phase.
    pub fn climb_results(phase: super::MatchPhase) -> &'static [&'static str] {
        match phase {
            super::MatchPhase::Auton => AUTON_CLIMB_RESULTS,
            _ => TELEOP_CLIMB_RESULTS,
        }
    }
}
