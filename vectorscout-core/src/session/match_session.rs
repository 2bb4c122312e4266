//! Match scouting session.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::actions::{ActionLog, ActionRecord, ActionType, QualitativeData, QualitativeKind};
use crate::clock::ActionClock;
use crate::config::Config;
use crate::db::RecordStore;
use crate::error::Result;
use crate::geometry::{DiagramKind, DiagramSet, FieldView, Point};
use crate::schedule::{EventSchedule, ScheduleCache, ScheduleFetcher};
use crate::types::{Alliance, MatchPhase, MatchScoutData, RobotDesignation};

use super::{next_match_number, require, CancelPolicy, SubmitError};

/// The match form at one point in time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchState {
    pub event: String,
    pub event_code: String,
    pub match_number: String,
    pub robot_designation: String,
    pub scout_name: String,
    pub team_number: String,
    /// `team_number` was filled in from the schedule
    pub team_number_auto_filled: bool,
    pub loaded: bool,
    pub no_show: bool,
    /// Field-orientation toggle: blue alliance drawn on the right
    pub blue_right: bool,
    /// Selected zone label per diagram
    pub zone_selections: BTreeMap<DiagramKind, String>,
    pub action_log: ActionLog,
    pub schedule: Option<Arc<EventSchedule>>,
    /// Scout types the team number; the schedule does not override it
    pub manual_entry: bool,
    /// Opposing alliance of the current match, empty when unknown
    pub opposing_teams: Vec<(RobotDesignation, u32)>,
    pub status_message: Option<String>,
    pub errors: Vec<String>,
}

impl MatchState {
    /// Start zone label, empty when none is selected.
    pub fn start_position(&self) -> &str {
        self.zone_selection(DiagramKind::StartPosition)
            .unwrap_or_default()
    }

    pub fn zone_selection(&self, kind: DiagramKind) -> Option<&str> {
        self.zone_selections.get(&kind).map(String::as_str)
    }

    /// View used to resolve taps. An unknown designation is drawn as red.
    pub fn field_view(&self) -> FieldView {
        let alliance = self
            .robot_designation
            .parse::<RobotDesignation>()
            .map(|d| d.alliance())
            .unwrap_or(Alliance::Red);
        FieldView::new(alliance, self.blue_right)
    }

    pub fn action_count(&self, phase: MatchPhase, action_type: ActionType) -> usize {
        self.action_log.count_matching(phase, action_type)
    }

    pub fn total_action_time(&self, phase: MatchPhase, action_type: ActionType) -> u64 {
        self.action_log.total_duration_matching(phase, action_type)
    }

    /// The record that submitting now would persist.
    pub fn to_scout_data(&self) -> MatchScoutData {
        MatchScoutData {
            id: None,
            event: self.event.trim().to_string(),
            match_number: self.match_number.trim().to_string(),
            robot_designation: self.robot_designation.trim().to_string(),
            scout_name: self.scout_name.trim().to_string(),
            team_number: self.team_number.trim().to_string(),
            start_position: self.start_position().to_string(),
            loaded: self.loaded,
            no_show: self.no_show,
            action_records: self.action_log.records().to_vec(),
            created_at: Utc::now(),
            transfer_generated: false,
        }
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        require(&mut errors, &self.event, "Event is required");
        require(&mut errors, &self.match_number, "Match number is required");
        require(
            &mut errors,
            &self.robot_designation,
            "Robot designation is required",
        );
        require(&mut errors, &self.scout_name, "Scout name is required");
        require(&mut errors, &self.team_number, "Team number is required");
        errors
    }

    /// Fill the team number and opposing alliance from the attached schedule.
    ///
    /// Needs a numeric match number and a known designation. In manual entry
    /// mode only the opposing alliance is refreshed.
    fn autofill(&mut self) {
        let Ok(match_number) = self.match_number.trim().parse::<u32>() else {
            return;
        };
        let Ok(designation) = self.robot_designation.parse::<RobotDesignation>() else {
            return;
        };

        let Some(schedule) = self.schedule.clone() else {
            self.opposing_teams.clear();
            return;
        };

        self.opposing_teams = schedule
            .opposing_teams(match_number, designation)
            .map(Vec::from)
            .unwrap_or_default();

        if self.manual_entry {
            return;
        }

        if let Some(team) = schedule
            .team_number(match_number, designation)
            .filter(|team| *team > 0)
        {
            self.team_number = team.to_string();
            self.team_number_auto_filled = true;
        }
    }

    /// Fresh form for the next match, keeping what the scout reuses.
    fn carry_over(&self) -> MatchState {
        let mut next = MatchState {
            event: self.event.clone(),
            event_code: self.event_code.clone(),
            match_number: next_match_number(&self.match_number),
            robot_designation: self.robot_designation.clone(),
            scout_name: self.scout_name.clone(),
            blue_right: self.blue_right,
            schedule: self.schedule.clone(),
            manual_entry: self.manual_entry,
            ..Default::default()
        };
        next.autofill();
        next
    }
}

/// An action whose detail entry is open.
///
/// The clock starts when the draft is created; commit or cancel consumes it.
#[derive(Debug)]
pub struct ActionDraft {
    phase: MatchPhase,
    action_type: ActionType,
    clock: ActionClock,
}

impl ActionDraft {
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    /// Clock backing the elapsed-time display.
    pub fn clock(&self) -> &ActionClock {
        &self.clock
    }
}

/// Controller for scouting one robot through a match.
pub struct MatchSession {
    state: Arc<MatchState>,
    diagrams: Arc<DiagramSet>,
    cancel_policy: CancelPolicy,
}

impl MatchSession {
    pub fn new(diagrams: Arc<DiagramSet>, cancel_policy: CancelPolicy) -> Self {
        Self {
            state: Arc::new(MatchState::default()),
            diagrams,
            cancel_policy,
        }
    }

    /// Session using the configured diagrams and cancel policy.
    pub fn from_config(config: &Config) -> Result<Self> {
        let diagrams = DiagramSet::from_config(&config.geometry)?;
        Ok(Self::new(Arc::new(diagrams), config.session.cancel_policy))
    }

    /// Current snapshot. Later transitions do not change it.
    pub fn snapshot(&self) -> Arc<MatchState> {
        Arc::clone(&self.state)
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn cancel_policy(&self) -> CancelPolicy {
        self.cancel_policy
    }

    fn update<T>(&mut self, f: impl FnOnce(&mut MatchState) -> T) -> T {
        f(Arc::make_mut(&mut self.state))
    }

    // ============================================
    // Form fields
    // ============================================

    pub fn set_event(&mut self, event: impl Into<String>, event_code: impl Into<String>) {
        let (event, event_code) = (event.into(), event_code.into());
        self.update(|s| {
            s.event = event;
            s.event_code = event_code;
            s.autofill();
        });
    }

    pub fn set_match_number(&mut self, match_number: impl Into<String>) {
        let match_number = match_number.into();
        self.update(|s| {
            s.match_number = match_number;
            s.autofill();
        });
    }

    pub fn set_robot_designation(&mut self, designation: impl Into<String>) {
        let designation = designation.into();
        self.update(|s| {
            s.robot_designation = designation;
            s.autofill();
        });
    }

    pub fn set_scout_name(&mut self, scout_name: impl Into<String>) {
        let scout_name = scout_name.into();
        self.update(|s| s.scout_name = scout_name);
    }

    /// Typed team number. Clears the auto-filled marker.
    pub fn set_team_number(&mut self, team_number: impl Into<String>) {
        let team_number = team_number.into();
        self.update(|s| {
            s.team_number = team_number;
            s.team_number_auto_filled = false;
        });
    }

    pub fn set_start_position(&mut self, label: impl Into<String>) {
        let label = label.into();
        self.update(|s| {
            if label.is_empty() {
                s.zone_selections.remove(&DiagramKind::StartPosition);
            } else {
                s.zone_selections.insert(DiagramKind::StartPosition, label);
            }
        });
    }

    pub fn set_loaded(&mut self, loaded: bool) {
        self.update(|s| s.loaded = loaded);
    }

    pub fn set_no_show(&mut self, no_show: bool) {
        self.update(|s| s.no_show = no_show);
    }

    /// Flip which side of the diagrams the blue alliance is drawn on.
    ///
    /// Existing zone selections are kept as they are.
    pub fn toggle_field_orientation(&mut self) {
        self.update(|s| s.blue_right = !s.blue_right);
    }

    /// Resolve a tap on a diagram and update that diagram's selection.
    ///
    /// A tap on the selected zone clears it; a tap outside every zone leaves
    /// the selection alone. Returns the selection after the tap.
    pub fn select_zone(&mut self, kind: DiagramKind, point: Point) -> Option<String> {
        let view = self.state.field_view();
        let tapped = self.diagrams.resolve(kind, point, view);

        self.update(|s| {
            if let Some(label) = tapped {
                if s.zone_selection(kind) == Some(label.as_str()) {
                    s.zone_selections.remove(&kind);
                } else {
                    s.zone_selections.insert(kind, label);
                }
            }
            s.zone_selections.get(&kind).cloned()
        })
    }

    pub fn clear_zone(&mut self, kind: DiagramKind) {
        self.update(|s| {
            s.zone_selections.remove(&kind);
        });
    }

    // ============================================
    // Schedule
    // ============================================

    /// Attach (or detach) the schedule used for auto-fill.
    pub fn attach_schedule(&mut self, schedule: Option<Arc<EventSchedule>>) {
        self.update(|s| {
            s.schedule = schedule;
            s.autofill();
        });
    }

    /// Switch between typed and schedule-filled team numbers.
    pub fn set_manual_entry(&mut self, manual: bool) {
        self.update(|s| {
            s.manual_entry = manual;
            s.autofill();
        });
    }

    /// Load the current event's schedule through `cache` and attach it.
    ///
    /// Returns the status line, which is also kept in the snapshot.
    pub async fn load_schedule<F: ScheduleFetcher>(&mut self, cache: &mut ScheduleCache<F>) -> String {
        let (code, name) = (self.state.event_code.clone(), self.state.event.clone());
        let result = cache.get_or_load(&code, &name).await;
        self.finish_schedule_load(cache.current(), result, "Failed to load schedule")
    }

    /// Import a schedule file for the current event and attach it.
    pub fn import_schedule<F: ScheduleFetcher>(
        &mut self,
        cache: &mut ScheduleCache<F>,
        path: &Path,
    ) -> String {
        let (code, name) = (self.state.event_code.clone(), self.state.event.clone());
        let result = cache.import_file(path, &code, &name);
        self.finish_schedule_load(cache.current(), result, "Failed to import schedule")
    }

    fn finish_schedule_load(
        &mut self,
        schedule: Option<Arc<EventSchedule>>,
        result: Result<crate::schedule::LoadOutcome>,
        failure: &str,
    ) -> String {
        let message = match result {
            Ok(outcome) => {
                self.update(|s| {
                    s.schedule = schedule;
                    s.manual_entry = false;
                    s.autofill();
                });
                outcome.message()
            }
            Err(e) => {
                tracing::warn!(event = %self.state.event_code, error = %e, "{}", failure);
                failure.to_string()
            }
        };
        self.update(|s| s.status_message = Some(message.clone()));
        message
    }

    // ============================================
    // Actions
    // ============================================

    /// Open the detail entry for an action and start its clock.
    ///
    /// `None` when the phase has no action called `name`.
    pub fn begin_action(&self, name: &str, phase: MatchPhase) -> Option<ActionDraft> {
        let action_type = ActionType::resolve(name, phase)?;
        Some(ActionDraft {
            phase,
            action_type,
            clock: ActionClock::start(),
        })
    }

    /// Record a drafted action ending now.
    ///
    /// Actions without a timer get a zero-length interval. Types whose detail
    /// has no fields get it filled in when none is given.
    pub fn commit_action(
        &mut self,
        draft: ActionDraft,
        qualitative_data: Option<QualitativeData>,
    ) -> Result<()> {
        let elapsed = draft.clock.stop();
        let elapsed = if draft.action_type.has_timer() {
            elapsed as i64
        } else {
            0
        };
        let now = Utc::now().timestamp_millis();

        let qualitative_data = qualitative_data.or_else(|| {
            (draft.action_type.qualitative_kind() == QualitativeKind::Empty)
                .then_some(QualitativeData::Empty)
        });

        let record = ActionRecord::new(
            draft.phase,
            draft.action_type,
            now - elapsed,
            Some(now),
            qualitative_data,
        )?;

        tracing::debug!(
            phase = %draft.phase,
            action = draft.action_type.as_str(),
            duration_ms = record.duration_ms(),
            "action recorded"
        );
        self.update(|s| s.action_log.append(record));
        Ok(())
    }

    /// Close a draft without recording it.
    ///
    /// Under [`CancelPolicy::UndoTally`] the latest matching record of a
    /// counted action is removed and returned.
    pub fn cancel_action(&mut self, draft: ActionDraft) -> Option<ActionRecord> {
        draft.clock.stop();
        match self.cancel_policy {
            CancelPolicy::Discard => None,
            CancelPolicy::UndoTally if draft.action_type.has_counter() => {
                self.remove_last_action(draft.phase, draft.action_type)
            }
            CancelPolicy::UndoTally => None,
        }
    }

    /// Remove the most recent record of `action_type` in `phase`.
    pub fn remove_last_action(
        &mut self,
        phase: MatchPhase,
        action_type: ActionType,
    ) -> Option<ActionRecord> {
        if self.state.action_count(phase, action_type) == 0 {
            return None;
        }
        self.update(|s| s.action_log.remove_last_matching(phase, action_type))
    }

    // ============================================
    // Submit
    // ============================================

    /// Validate and persist the form, then start the next match.
    ///
    /// On a validation failure nothing changes. On a store failure the form is
    /// kept and the message added to `errors`.
    pub fn submit(&mut self, store: &dyn RecordStore) -> std::result::Result<i64, SubmitError> {
        let errors = self.state.validate();
        if !errors.is_empty() {
            return Err(SubmitError::Validation(errors));
        }

        let data = self.state.to_scout_data();
        match store.insert_match_scout(&data) {
            Ok(id) => {
                tracing::info!(
                    id,
                    event = %data.event,
                    match_number = %data.match_number,
                    team = %data.team_number,
                    actions = data.action_records.len(),
                    "match record saved"
                );
                let next = self.state.carry_over();
                self.state = Arc::new(next);
                Ok(id)
            }
            Err(e) => {
                let message = format!("Error saving match: {}", e);
                tracing::error!(error = %e, "failed to save match record");
                self.update(|s| s.errors = vec![message.clone()]);
                Err(SubmitError::Store(message))
            }
        }
    }
}
