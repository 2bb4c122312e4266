//! Qualification match schedules.
//!
//! A schedule lets a match session fill in the scouted team from the match
//! number and robot designation, and list the opposing alliance for defense
//! notes. Schedules come from The Blue Alliance ([`tba`]) or an imported file
//! and are kept by an explicit [`ScheduleCache`] owned by the host. The
//! [`EventCatalog`] lists the events a scout can pick from.

pub mod cache;
pub mod catalog;
pub mod tba;

pub use cache::{LoadOutcome, ScheduleCache, ScheduleSource};
pub use catalog::{Event, EventCatalog};
pub use tba::{parse_tba_matches, ScheduleFetcher, TbaClient};

use crate::types::{Alliance, RobotDesignation};
use serde::{Deserialize, Serialize};

/// Teams of one qualification match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScheduleEntry {
    pub match_number: u32,
    pub red1: u32,
    pub red2: u32,
    pub red3: u32,
    pub blue1: u32,
    pub blue2: u32,
    pub blue3: u32,
}

impl MatchScheduleEntry {
    pub fn team(&self, designation: RobotDesignation) -> u32 {
        match designation {
            RobotDesignation::Red1 => self.red1,
            RobotDesignation::Red2 => self.red2,
            RobotDesignation::Red3 => self.red3,
            RobotDesignation::Blue1 => self.blue1,
            RobotDesignation::Blue2 => self.blue2,
            RobotDesignation::Blue3 => self.blue3,
        }
    }

    /// Designations and teams of one alliance, in slot order.
    pub fn alliance_teams(&self, alliance: Alliance) -> [(RobotDesignation, u32); 3] {
        RobotDesignation::of_alliance(alliance).map(|d| (d, self.team(d)))
    }

    /// Teams of the alliance opposing `designation`.
    pub fn opposing_teams(&self, designation: RobotDesignation) -> [(RobotDesignation, u32); 3] {
        self.alliance_teams(designation.alliance().opponent())
    }
}

/// The qualification schedule of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSchedule {
    pub event_code: String,
    pub event_name: String,
    /// Sorted by match number
    pub matches: Vec<MatchScheduleEntry>,
}

impl EventSchedule {
    pub fn new(
        event_code: impl Into<String>,
        event_name: impl Into<String>,
        mut matches: Vec<MatchScheduleEntry>,
    ) -> Self {
        matches.sort_by_key(|m| m.match_number);
        Self {
            event_code: event_code.into(),
            event_name: event_name.into(),
            matches,
        }
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn find_match(&self, match_number: u32) -> Option<&MatchScheduleEntry> {
        self.matches
            .binary_search_by_key(&match_number, |m| m.match_number)
            .ok()
            .map(|i| &self.matches[i])
    }

    /// Team in `designation`'s slot of a match.
    pub fn team_number(&self, match_number: u32, designation: RobotDesignation) -> Option<u32> {
        self.find_match(match_number).map(|m| m.team(designation))
    }

    /// Teams opposing `designation` in a match.
    pub fn opposing_teams(
        &self,
        match_number: u32,
        designation: RobotDesignation,
    ) -> Option<[(RobotDesignation, u32); 3]> {
        self.find_match(match_number)
            .map(|m| m.opposing_teams(designation))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn entry(match_number: u32, base: u32) -> MatchScheduleEntry {
        MatchScheduleEntry {
            match_number,
            red1: base + 1,
            red2: base + 2,
            red3: base + 3,
            blue1: base + 4,
            blue2: base + 5,
            blue3: base + 6,
        }
    }

    #[test]
    fn test_team_lookup() {
        let schedule = EventSchedule::new("2026miket", "Kettering", vec![entry(2, 200), entry(1, 100)]);
        assert_eq!(schedule.matches[0].match_number, 1);
        assert_eq!(schedule.team_number(1, RobotDesignation::Red2), Some(102));
        assert_eq!(schedule.team_number(2, RobotDesignation::Blue3), Some(206));
        assert_eq!(schedule.team_number(3, RobotDesignation::Blue3), None);
    }

    #[test]
    fn test_opposing_teams() {
        let schedule = EventSchedule::new("e", "E", vec![entry(7, 700)]);
        assert_eq!(
            schedule.opposing_teams(7, RobotDesignation::Red1),
            Some([
                (RobotDesignation::Blue1, 704),
                (RobotDesignation::Blue2, 705),
                (RobotDesignation::Blue3, 706),
            ])
        );
        assert_eq!(
            schedule.opposing_teams(7, RobotDesignation::Blue2).unwrap()[0],
            (RobotDesignation::Red1, 701)
        );
        assert!(schedule.opposing_teams(8, RobotDesignation::Blue2).is_none());
    }
}
