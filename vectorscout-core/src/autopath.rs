//! Auto-path step builder.
//!
//! A pit-reported autonomous routine is one START step followed by
//! alternating ACTION and LOCATION steps. The category expected next is a
//! pure function of the steps so far. Choosing "Climb" ends the path at a
//! fixed location, so the builder appends that location itself.

use crate::error::{Error, Result};
use crate::types::{AutoPathStep, StepType};

/// Action that ends a path at [`CLIMB_TERMINAL_LOCATION`].
pub const CLIMB_ACTION: &str = "Climb";

/// Location appended after a Climb action.
pub const CLIMB_TERMINAL_LOCATION: &str = "L1";

pub const LOAD_LOCATIONS: &[&str] = &["Neutral", "Depot", "Outpost", "Alliance"];
pub const SCORE_LOCATIONS: &[&str] = &["H", "R1", "R2", "L1", "L2"];
pub const FERRY_LOCATIONS: &[&str] = &["Shoot Alliance", "Dump Alliance", "Dump Outpost"];
pub const MOVE_LOCATIONS: &[&str] = &["Neutral", "Alliance", "Depot", "Outpost"];
pub const CLIMB_LOCATIONS: &[&str] = &[CLIMB_TERMINAL_LOCATION];

/// Category the next step must have.
pub fn next_expected_category(steps: &[AutoPathStep]) -> StepType {
    match steps.last().map(|s| s.step_type) {
        None => StepType::Start,
        Some(StepType::Start) | Some(StepType::Location) => StepType::Action,
        Some(StepType::Action) => StepType::Location,
    }
}

/// Value of the most recent ACTION step.
pub fn last_action(steps: &[AutoPathStep]) -> Option<&str> {
    steps
        .iter()
        .rev()
        .find(|s| s.step_type == StepType::Action)
        .map(|s| s.value.as_str())
}

/// Locations offered after an action.
pub fn location_options(action: &str) -> &'static [&'static str] {
    match action {
        "Load" => LOAD_LOCATIONS,
        "Score" => SCORE_LOCATIONS,
        "Ferry" => FERRY_LOCATIONS,
        "Move" => MOVE_LOCATIONS,
        CLIMB_ACTION => CLIMB_LOCATIONS,
        _ => &[],
    }
}

/// Accumulates the steps of one auto path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoPathBuilder {
    steps: Vec<AutoPathStep>,
}

impl AutoPathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[AutoPathStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<AutoPathStep> {
        self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn next_expected_category(&self) -> StepType {
        next_expected_category(&self.steps)
    }

    /// Append a step of the expected category.
    ///
    /// `{ACTION, "Climb"}` is followed by `{LOCATION, "L1"}` in the same call.
    pub fn add_step(&mut self, step: AutoPathStep) -> Result<()> {
        let expected = self.next_expected_category();
        if step.step_type != expected {
            return Err(Error::InvalidRecord(format!(
                "expected a {} step, got {} '{}'",
                expected.as_str(),
                step.step_type.as_str(),
                step.value
            )));
        }

        let climbs = step.step_type == StepType::Action && step.value == CLIMB_ACTION;
        self.steps.push(step);
        if climbs {
            self.steps.push(AutoPathStep::location(CLIMB_TERMINAL_LOCATION));
        }
        Ok(())
    }

    /// Keep only the first `index` steps.
    pub fn delete_from_index(&mut self, index: usize) {
        self.steps.truncate(index);
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn last_action(&self) -> Option<&str> {
        last_action(&self.steps)
    }

    pub fn location_options_for_last_action(&self) -> &'static [&'static str] {
        self.last_action().map(location_options).unwrap_or(&[])
    }
}

impl From<Vec<AutoPathStep>> for AutoPathBuilder {
    fn from(steps: Vec<AutoPathStep>) -> Self {
        Self { steps }
    }
}
