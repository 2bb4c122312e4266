//! Pit scouting session.

use std::sync::Arc;

use chrono::Utc;

use crate::autopath::AutoPathBuilder;
use crate::db::RecordStore;
use crate::error::Result;
use crate::geometry::Point;
use crate::types::{AutoPath, AutoPathStep, PitScoutData, StepType};

use super::{require, SubmitError};

/// One freehand stroke of a path drawing.
pub type Stroke = Vec<Point>;

/// An auto path being entered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathDraft {
    pub name: String,
    pub builder: AutoPathBuilder,
    /// Saved image of the drawing
    pub drawing_path: Option<String>,
    /// Strokes of the drawing in progress
    pub strokes: Vec<Stroke>,
}

impl PathDraft {
    fn named(index: usize) -> Self {
        Self {
            name: path_name(index),
            ..Default::default()
        }
    }

    fn to_auto_path(&self) -> AutoPath {
        AutoPath {
            name: self.name.clone(),
            steps: self.builder.steps().to_vec(),
            drawing_path: self.drawing_path.clone(),
        }
    }
}

/// `A1`, `A2`, ... for zero-based `index`.
fn path_name(index: usize) -> String {
    format!("A{}", index + 1)
}

/// The pit form at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PitState {
    pub event: String,
    pub event_code: String,
    pub team_number: String,
    pub drivetrain_type: String,
    pub preferred_role: String,
    pub preferred_path: String,
    pub photo_path: Option<String>,
    /// Never empty
    pub paths: Vec<PathDraft>,
    pub current_path: usize,
    pub status_message: Option<String>,
    pub errors: Vec<String>,
}

impl Default for PitState {
    fn default() -> Self {
        Self {
            event: String::new(),
            event_code: String::new(),
            team_number: String::new(),
            drivetrain_type: String::new(),
            preferred_role: String::new(),
            preferred_path: String::new(),
            photo_path: None,
            paths: vec![PathDraft::named(0)],
            current_path: 0,
            status_message: None,
            errors: Vec::new(),
        }
    }
}

impl PitState {
    pub fn current(&self) -> &PathDraft {
        &self.paths[self.current_path]
    }

    fn current_mut(&mut self) -> &mut PathDraft {
        &mut self.paths[self.current_path]
    }

    /// Category the current path expects next.
    pub fn next_expected_category(&self) -> StepType {
        self.current().builder.next_expected_category()
    }

    /// Locations offered after the current path's last action.
    pub fn location_options(&self) -> &'static [&'static str] {
        self.current().builder.location_options_for_last_action()
    }

    /// Paths with at least one step, as they would be saved.
    pub fn completed_paths(&self) -> Vec<AutoPath> {
        self.paths
            .iter()
            .filter(|p| !p.builder.is_empty())
            .map(PathDraft::to_auto_path)
            .collect()
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        require(&mut errors, &self.event, "Event is required");
        require(&mut errors, &self.team_number, "Team number is required");
        if !self.team_number.trim().is_empty() && self.team_number.trim().parse::<u32>().is_err() {
            errors.push("Team number must be a number".to_string());
        }
        require(&mut errors, &self.drivetrain_type, "Drivetrain type is required");
        require(&mut errors, &self.preferred_role, "Preferred role is required");
        require(&mut errors, &self.preferred_path, "Preferred path is required");
        if self.paths.iter().all(|p| p.builder.is_empty()) {
            errors.push("At least one auto path is required".to_string());
        }
        errors
    }

    fn to_scout_data(&self, team_number: u32) -> PitScoutData {
        PitScoutData {
            id: None,
            event: self.event.trim().to_string(),
            team_number,
            drivetrain_type: self.drivetrain_type.clone(),
            preferred_role: self.preferred_role.clone(),
            preferred_path: self.preferred_path.clone(),
            photo_path: self.photo_path.clone(),
            auto_paths: self.completed_paths(),
            created_at: Utc::now(),
        }
    }
}

/// Controller for one pit interview.
#[derive(Default)]
pub struct PitSession {
    state: Arc<PitState>,
}

impl PitSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot. Later transitions do not change it.
    pub fn snapshot(&self) -> Arc<PitState> {
        Arc::clone(&self.state)
    }

    pub fn state(&self) -> &PitState {
        &self.state
    }

    fn update<T>(&mut self, f: impl FnOnce(&mut PitState) -> T) -> T {
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
        });
    }

    pub fn set_team_number(&mut self, team_number: impl Into<String>) {
        let team_number = team_number.into();
        self.update(|s| s.team_number = team_number);
    }

    pub fn set_drivetrain_type(&mut self, drivetrain_type: impl Into<String>) {
        let drivetrain_type = drivetrain_type.into();
        self.update(|s| s.drivetrain_type = drivetrain_type);
    }

    pub fn set_preferred_role(&mut self, role: impl Into<String>) {
        let role = role.into();
        self.update(|s| s.preferred_role = role);
    }

    pub fn set_preferred_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.update(|s| s.preferred_path = path);
    }

    pub fn set_photo_path(&mut self, photo_path: Option<String>) {
        self.update(|s| s.photo_path = photo_path);
    }

    // ============================================
    // Auto paths
    // ============================================

    /// Append a new empty path and make it current.
    pub fn add_path(&mut self) {
        self.update(|s| {
            s.paths.push(PathDraft::named(s.paths.len()));
            s.current_path = s.paths.len() - 1;
        });
    }

    /// Remove the current path unless it is the only one.
    ///
    /// Remaining paths are renamed `A1`.. in order.
    pub fn remove_current_path(&mut self) -> bool {
        if self.state.paths.len() <= 1 {
            return false;
        }
        self.update(|s| {
            s.paths.remove(s.current_path);
            for (i, path) in s.paths.iter_mut().enumerate() {
                path.name = path_name(i);
            }
            s.current_path = s.current_path.min(s.paths.len() - 1);
        });
        true
    }

    pub fn select_path(&mut self, index: usize) -> bool {
        if index >= self.state.paths.len() {
            return false;
        }
        self.update(|s| s.current_path = index);
        true
    }

    /// Add a step to the current path.
    pub fn add_step(&mut self, step: AutoPathStep) -> Result<()> {
        let mut builder = self.state.current().builder.clone();
        builder.add_step(step)?;
        self.update(|s| s.current_mut().builder = builder);
        Ok(())
    }

    /// Keep only the first `index` steps of the current path.
    pub fn delete_steps_from(&mut self, index: usize) {
        self.update(|s| s.current_mut().builder.delete_from_index(index));
    }

    pub fn clear_steps(&mut self) {
        self.update(|s| s.current_mut().builder.clear());
    }

    pub fn set_drawing_path(&mut self, drawing_path: Option<String>) {
        self.update(|s| s.current_mut().drawing_path = drawing_path);
    }

    pub fn add_stroke(&mut self, stroke: Stroke) {
        if stroke.is_empty() {
            return;
        }
        self.update(|s| s.current_mut().strokes.push(stroke));
    }

    pub fn set_strokes(&mut self, strokes: Vec<Stroke>) {
        self.update(|s| s.current_mut().strokes = strokes);
    }

    pub fn clear_strokes(&mut self) {
        self.update(|s| s.current_mut().strokes.clear());
    }

    pub fn undo_stroke(&mut self) -> Option<Stroke> {
        self.update(|s| s.current_mut().strokes.pop())
    }

    // ============================================
    // Submit
    // ============================================

    /// Validate and persist the interview, then clear the form.
    ///
    /// Only paths with steps are saved. The event is kept for the next team.
    pub fn submit(&mut self, store: &dyn RecordStore) -> std::result::Result<i64, SubmitError> {
        let errors = self.state.validate();
        if !errors.is_empty() {
            return Err(SubmitError::Validation(errors));
        }

        let team_number = self
            .state
            .team_number
            .trim()
            .parse::<u32>()
            .map_err(|_| SubmitError::Validation(vec!["Team number must be a number".to_string()]))?;
        let data = self.state.to_scout_data(team_number);

        match store.insert_pit_scout(&data) {
            Ok(id) => {
                tracing::info!(
                    id,
                    event = %data.event,
                    team = data.team_number,
                    paths = data.auto_paths.len(),
                    "pit record saved"
                );
                self.state = Arc::new(PitState {
                    event: self.state.event.clone(),
                    event_code: self.state.event_code.clone(),
                    status_message: Some(format!("Saved team {}", team_number)),
                    ..Default::default()
                });
                Ok(id)
            }
            Err(e) => {
                let message = format!("Failed to save: {}", e);
                tracing::error!(error = %e, "failed to save pit record");
                self.update(|s| s.errors = vec![message.clone()]);
                Err(SubmitError::Store(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn store() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn fill_required(session: &mut PitSession) {
        session.set_event("Kettering", "2026miket");
        session.set_team_number("5460");
        session.set_drivetrain_type("Swerve");
        session.set_preferred_role("Score");
        session.set_preferred_path("Trench");
        session.add_step(AutoPathStep::start("3")).unwrap();
    }

    #[test]
    fn test_starts_with_one_path() {
        let session = PitSession::new();
        assert_eq!(session.state().paths.len(), 1);
        assert_eq!(session.state().current().name, "A1");
        assert_eq!(session.state().next_expected_category(), StepType::Start);
    }

    #[test]
    fn test_add_remove_and_rename_paths() {
        let mut session = PitSession::new();
        session.add_path();
        session.add_path();
        assert_eq!(session.state().current_path, 2);
        assert_eq!(session.state().current().name, "A3");

        assert!(session.select_path(0));
        assert!(!session.select_path(3));
        assert!(session.remove_current_path());
        let names: Vec<_> = session.state().paths.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A1", "A2"]);

        session.select_path(1);
        assert!(session.remove_current_path());
        assert_eq!(session.state().current_path, 0);
        assert!(!session.remove_current_path());
        assert_eq!(session.state().paths.len(), 1);
    }

    #[test]
    fn test_steps_follow_builder_rules() {
        let mut session = PitSession::new();
        assert!(session.add_step(AutoPathStep::action("Load")).is_err());

        session.add_step(AutoPathStep::start("1")).unwrap();
        session.add_step(AutoPathStep::action("Ferry")).unwrap();
        assert_eq!(
            session.state().location_options(),
            &["Shoot Alliance", "Dump Alliance", "Dump Outpost"]
        );

        session.add_step(AutoPathStep::location("Dump Outpost")).unwrap();
        session.add_step(AutoPathStep::action("Climb")).unwrap();
        assert_eq!(session.state().current().builder.steps().len(), 5);
        assert_eq!(session.state().next_expected_category(), StepType::Action);

        session.delete_steps_from(1);
        assert_eq!(session.state().next_expected_category(), StepType::Action);
        session.clear_steps();
        assert!(session.state().current().builder.is_empty());
    }

    #[test]
    fn test_strokes_are_per_path() {
        let mut session = PitSession::new();
        session.add_stroke(vec![Point::new(0.1, 0.1), Point::new(0.2, 0.2)]);
        session.add_stroke(vec![Point::new(0.5, 0.5)]);
        session.add_stroke(vec![]);
        assert_eq!(session.state().current().strokes.len(), 2);

        assert_eq!(session.undo_stroke(), Some(vec![Point::new(0.5, 0.5)]));

        session.add_path();
        assert!(session.state().current().strokes.is_empty());
        session.select_path(0);
        assert_eq!(session.state().current().strokes.len(), 1);
        session.clear_strokes();
        assert!(session.undo_stroke().is_none());
    }

    #[test]
    fn test_submit_validation() {
        let mut session = PitSession::new();
        session.set_team_number("frc5460");

        let err = session.submit(&store()).unwrap_err();
        assert_eq!(
            err.messages(),
            [
                "Event is required",
                "Team number must be a number",
                "Drivetrain type is required",
                "Preferred role is required",
                "Preferred path is required",
                "At least one auto path is required",
            ]
        );
    }

    #[test]
    fn test_submit_saves_paths_with_steps() {
        let db = store();
        let mut session = PitSession::new();
        fill_required(&mut session);
        session.set_drawing_path(Some("/sdcard/a1.png".to_string()));
        session.set_photo_path(Some("/sdcard/robot.jpg".to_string()));
        session.add_path();

        let id = session.submit(&db).unwrap();
        let saved = db.get_pit_scout(id).unwrap().unwrap();
        assert_eq!(saved.team_number, 5460);
        assert_eq!(saved.auto_paths.len(), 1);
        assert_eq!(saved.auto_paths[0].drawing_path.as_deref(), Some("/sdcard/a1.png"));

        let state = session.state();
        assert_eq!(state.event, "Kettering");
        assert_eq!(state.event_code, "2026miket");
        assert!(state.team_number.is_empty());
        assert!(state.photo_path.is_none());
        assert_eq!(state.paths.len(), 1);
    }

    #[test]
    fn test_submit_store_failure_keeps_form() {
        let mut session = PitSession::new();
        fill_required(&mut session);

        let err = session.submit(&Database::open_in_memory().unwrap()).unwrap_err();
        assert!(matches!(err, SubmitError::Store(ref m) if m.starts_with("Failed to save: ")));
        assert_eq!(session.state().team_number, "5460");
        assert_eq!(session.state().errors.len(), 1);
    }
}
