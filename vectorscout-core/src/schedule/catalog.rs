//! Event catalog.
//!
//! The list of events a scout picks from, read from a JSON file of
//! `{"eventName", "eventCode", "date"}` objects. The parsed list is sorted by
//! date, then name, and kept in memory until [`EventCatalog::clear_cache`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One selectable event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_name: String,
    /// TBA event key, e.g. `2026miket`
    pub event_code: String,
    /// ISO date (`YYYY-MM-DD`), so text order is date order
    #[serde(default)]
    pub date: String,
}

/// Sorted, memoized event list backed by a file.
#[derive(Debug)]
pub struct EventCatalog {
    path: PathBuf,
    cached: Option<Arc<Vec<Event>>>,
}

impl EventCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Events sorted by date, then name. Reads the file on first use only.
    pub fn events(&mut self) -> Result<Arc<Vec<Event>>> {
        if let Some(events) = &self.cached {
            return Ok(Arc::clone(events));
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Config(format!(
                "failed to read event catalog {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let events = Arc::new(parse_events(&content)?);
        tracing::debug!(path = %self.path.display(), count = events.len(), "event catalog loaded");
        self.cached = Some(Arc::clone(&events));
        Ok(events)
    }

    /// Event with the given code, if listed.
    pub fn find(&mut self, event_code: &str) -> Result<Option<Event>> {
        Ok(self
            .events()?
            .iter()
            .find(|e| e.event_code == event_code)
            .cloned())
    }

    /// Forget the loaded list; the next call reads the file again.
    pub fn clear_cache(&mut self) {
        self.cached = None;
    }
}

/// Parse and sort a catalog file.
pub fn parse_events(content: &str) -> Result<Vec<Event>> {
    let mut events: Vec<Event> = serde_json::from_str(content)?;
    events.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.event_name.cmp(&b.event_name))
    });
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EVENTS: &str = r#"[
        {"eventName": "Traverse City", "eventCode": "2026mitvc", "date": "2026-03-12"},
        {"eventName": "Kettering", "eventCode": "2026miket", "date": "2026-03-05"},
        {"eventName": "Belleville", "eventCode": "2026mibel", "date": "2026-03-05"}
    ]"#;

    #[test]
    fn test_events_sorted_by_date_then_name() {
        let events = parse_events(EVENTS).unwrap();
        let codes: Vec<&str> = events.iter().map(|e| e.event_code.as_str()).collect();
        assert_eq!(codes, vec!["2026mibel", "2026miket", "2026mitvc"]);
    }

    #[test]
    fn test_catalog_is_memoized_until_cleared() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(&path, EVENTS).unwrap();

        let mut catalog = EventCatalog::new(&path);
        assert_eq!(catalog.events().unwrap().len(), 3);
        assert_eq!(
            catalog.find("2026miket").unwrap().map(|e| e.event_name),
            Some("Kettering".to_string())
        );

        std::fs::write(&path, "[]").unwrap();
        assert_eq!(catalog.events().unwrap().len(), 3);

        catalog.clear_cache();
        assert!(catalog.events().unwrap().is_empty());
        assert_eq!(catalog.find("2026miket").unwrap(), None);
    }

    #[test]
    fn test_missing_or_malformed_catalog_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut catalog = EventCatalog::new(dir.path().join("missing.json"));
        assert!(matches!(catalog.events(), Err(Error::Config(_))));

        assert!(parse_events(r#"{"eventName": "x"}"#).is_err());
    }
}
