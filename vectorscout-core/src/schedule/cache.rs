//! Schedule cache.
//!
//! [`ScheduleCache`] holds the schedule currently in use and a directory of
//! per-event cache files (`<event>_schedule.json`). Loading looks in memory,
//! then on disk, then asks the remote fetcher, and writes fetched or imported
//! schedules back to disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};

use super::tba::{parse_tba_matches, ScheduleFetcher, TbaClient};
use super::{EventSchedule, MatchScheduleEntry};

const CACHE_FILE_SUFFIX: &str = "_schedule.json";

/// Where a loaded schedule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSource {
    Memory,
    Cache,
    Api,
    File,
}

impl ScheduleSource {
    /// Human-readable origin used in status messages.
    pub fn describe(&self) -> &'static str {
        match self {
            ScheduleSource::Memory => "memory",
            ScheduleSource::Cache => "cache",
            ScheduleSource::Api => "The Blue Alliance",
            ScheduleSource::File => "file",
        }
    }
}

/// Result of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub source: ScheduleSource,
    pub match_count: usize,
}

impl LoadOutcome {
    /// Status line shown to the scout.
    pub fn message(&self) -> String {
        match self.source {
            ScheduleSource::File => format!("Imported {} matches from file", self.match_count),
            source => format!(
                "Loaded {} matches from {}",
                self.match_count,
                source.describe()
            ),
        }
    }
}

/// Owner of the current schedule and its on-disk cache.
pub struct ScheduleCache<F = TbaClient> {
    dir: PathBuf,
    fetcher: Option<F>,
    current: Option<Arc<EventSchedule>>,
}

impl ScheduleCache<TbaClient> {
    /// A cache that only reads files and imports; it never goes online.
    pub fn offline(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fetcher: None,
            current: None,
        }
    }
}

impl<F: ScheduleFetcher> ScheduleCache<F> {
    pub fn new(dir: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            dir: dir.into(),
            fetcher: Some(fetcher),
            current: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The schedule currently in use.
    pub fn current(&self) -> Option<Arc<EventSchedule>> {
        self.current.clone()
    }

    /// Make `event_code`'s schedule current.
    ///
    /// Tries memory, then the cache file, then the fetcher. A fetched schedule
    /// is written to the cache. An event with no qualification matches is
    /// reported as [`Error::ScheduleUnavailable`].
    pub async fn get_or_load(&mut self, event_code: &str, event_name: &str) -> Result<LoadOutcome> {
        validate_event_code(event_code)?;

        if let Some(current) = &self.current {
            if current.event_code == event_code {
                return Ok(LoadOutcome {
                    source: ScheduleSource::Memory,
                    match_count: current.match_count(),
                });
            }
        }

        if let Some(matches) = self.read_cache_file(event_code) {
            tracing::info!(event = event_code, count = matches.len(), "schedule loaded from cache");
            return Ok(self.install(event_code, event_name, matches, ScheduleSource::Cache));
        }

        self.fetch_and_install(event_code, event_name).await
    }

    /// Fetch `event_code`'s schedule again, skipping memory and the cache file.
    ///
    /// The cache file and the current schedule are only replaced once the
    /// fetch succeeds; on any error both are left as they were.
    pub async fn refresh(&mut self, event_code: &str, event_name: &str) -> Result<LoadOutcome> {
        validate_event_code(event_code)?;
        self.fetch_and_install(event_code, event_name).await
    }

    async fn fetch_and_install(&mut self, event_code: &str, event_name: &str) -> Result<LoadOutcome> {
        let Some(fetcher) = &self.fetcher else {
            return Err(Error::ScheduleUnavailable(event_code.to_string()));
        };

        let matches = fetcher
            .fetch_matches(event_code)
            .await?
            .filter(|m| !m.is_empty())
            .ok_or_else(|| Error::ScheduleUnavailable(event_code.to_string()))?;

        tracing::info!(event = event_code, count = matches.len(), "schedule fetched");
        self.write_cache_file(event_code, &matches);
        Ok(self.install(event_code, event_name, matches, ScheduleSource::Api))
    }

    /// Import a TBA-format matches file and make it current.
    pub fn import_file(
        &mut self,
        path: &Path,
        event_code: &str,
        event_name: &str,
    ) -> Result<LoadOutcome> {
        validate_event_code(event_code)?;

        let content = std::fs::read_to_string(path)?;
        let matches = parse_tba_matches(&content)?;
        if matches.is_empty() {
            return Err(Error::ScheduleUnavailable(format!(
                "{} (no qualification matches in {})",
                event_code,
                path.display()
            )));
        }

        tracing::info!(event = event_code, path = %path.display(), count = matches.len(), "schedule imported");
        self.write_cache_file(event_code, &matches);
        Ok(self.install(event_code, event_name, matches, ScheduleSource::File))
    }

    /// Forget the in-memory schedule. Cache files are kept.
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    /// Delete an event's cache file, and forget it if it is current.
    pub fn delete_cached(&mut self, event_code: &str) -> Result<()> {
        validate_event_code(event_code)?;
        match std::fs::remove_file(self.cache_file(event_code)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        if self
            .current
            .as_ref()
            .is_some_and(|s| s.event_code == event_code)
        {
            self.current = None;
        }
        Ok(())
    }

    pub fn is_cached(&self, event_code: &str) -> bool {
        validate_event_code(event_code).is_ok() && self.cache_file(event_code).exists()
    }

    /// Event codes with a cache file, sorted.
    pub fn cached_events(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(vec![]);
        }

        let pattern = self.dir.join(format!("*{}", CACHE_FILE_SUFFIX));
        let entries = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| Error::Schedule(format!("Invalid glob pattern: {}", e)))?;

        let mut events: Vec<String> = entries
            .flatten()
            .filter_map(|path| {
                path.file_name()?
                    .to_str()?
                    .strip_suffix(CACHE_FILE_SUFFIX)
                    .map(str::to_string)
            })
            .collect();
        events.sort();
        Ok(events)
    }

    fn install(
        &mut self,
        event_code: &str,
        event_name: &str,
        matches: Vec<MatchScheduleEntry>,
        source: ScheduleSource,
    ) -> LoadOutcome {
        let schedule = EventSchedule::new(event_code, event_name, matches);
        let outcome = LoadOutcome {
            source,
            match_count: schedule.match_count(),
        };
        self.current = Some(Arc::new(schedule));
        outcome
    }

    fn cache_file(&self, event_code: &str) -> PathBuf {
        self.dir.join(format!("{}{}", event_code, CACHE_FILE_SUFFIX))
    }

    /// Cached matches, or None when missing or unreadable.
    fn read_cache_file(&self, event_code: &str) -> Option<Vec<MatchScheduleEntry>> {
        let path = self.cache_file(event_code);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<Vec<MatchScheduleEntry>>(&content) {
            Ok(matches) if !matches.is_empty() => Some(matches),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt schedule cache");
                None
            }
        }
    }

    /// Best effort; a failed write only costs a refetch later.
    fn write_cache_file(&self, event_code: &str, matches: &[MatchScheduleEntry]) {
        let path = self.cache_file(event_code);
        let result = std::fs::create_dir_all(&self.dir)
            .map_err(Error::from)
            .and_then(|_| Ok(serde_json::to_string(matches)?))
            .and_then(|json| Ok(std::fs::write(&path, json)?));
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to write schedule cache");
        }
    }
}

/// Event codes become file names, so only `[A-Za-z0-9_-]` is allowed.
fn validate_event_code(event_code: &str) -> Result<()> {
    let valid = !event_code.is_empty()
        && event_code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::Schedule(format!("invalid event code '{}'", event_code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::tests::entry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Serves a fixed schedule and counts calls.
    struct FakeFetcher {
        matches: Option<Vec<MatchScheduleEntry>>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeFetcher {
        fn new(matches: Option<Vec<MatchScheduleEntry>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    matches,
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl ScheduleFetcher for FakeFetcher {
        async fn fetch_matches(&self, _event_code: &str) -> Result<Option<Vec<MatchScheduleEntry>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.matches.clone())
        }
    }

    const TBA_FILE: &str = r#"[
        {"comp_level": "qm", "match_number": 1, "alliances": {
            "red": {"team_keys": ["frc1", "frc2", "frc3"]},
            "blue": {"team_keys": ["frc4", "frc5", "frc6"]}}}
    ]"#;

    #[tokio::test]
    async fn test_get_or_load_order() {
        let dir = TempDir::new().unwrap();
        let (fetcher, calls) = FakeFetcher::new(Some(vec![entry(1, 10), entry(2, 20)]));
        let mut cache = ScheduleCache::new(dir.path().join("schedules"), fetcher);

        let outcome = cache.get_or_load("2026miket", "Kettering").await.unwrap();
        assert_eq!(outcome.source, ScheduleSource::Api);
        assert_eq!(outcome.match_count, 2);
        assert_eq!(outcome.message(), "Loaded 2 matches from The Blue Alliance");
        assert!(cache.is_cached("2026miket"));

        let outcome = cache.get_or_load("2026miket", "Kettering").await.unwrap();
        assert_eq!(outcome.source, ScheduleSource::Memory);

        cache.invalidate();
        assert!(cache.current().is_none());
        let outcome = cache.get_or_load("2026miket", "Kettering").await.unwrap();
        assert_eq!(outcome.source, ScheduleSource::Cache);
        assert_eq!(outcome.message(), "Loaded 2 matches from cache");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let current = cache.current().unwrap();
        assert_eq!(current.event_name, "Kettering");
        assert_eq!(current.matches[1].red1, 21);
    }

    #[tokio::test]
    async fn test_unknown_event_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let (fetcher, _) = FakeFetcher::new(None);
        let mut cache = ScheduleCache::new(dir.path(), fetcher);
        let err = cache.get_or_load("2026xxxx", "").await.unwrap_err();
        assert!(matches!(err, Error::ScheduleUnavailable(_)));

        let (fetcher, _) = FakeFetcher::new(Some(vec![]));
        let mut cache = ScheduleCache::new(dir.path(), fetcher);
        assert!(cache.get_or_load("2026xxxx", "").await.is_err());
        assert!(!cache.is_cached("2026xxxx"));
    }

    #[tokio::test]
    async fn test_refresh_replaces_cache_only_on_success() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("matches.json");
        std::fs::write(&file, TBA_FILE).unwrap();

        let (fetcher, calls) = FakeFetcher::new(None);
        let mut cache = ScheduleCache::new(dir.path().join("cache"), fetcher);
        cache.import_file(&file, "2026miket", "Kettering").unwrap();

        let err = cache.refresh("2026miket", "Kettering").await.unwrap_err();
        assert!(matches!(err, Error::ScheduleUnavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_cached("2026miket"));
        assert_eq!(cache.current().unwrap().match_count(), 1);

        // A fresh cache still finds the imported copy
        cache.invalidate();
        let outcome = cache.get_or_load("2026miket", "Kettering").await.unwrap();
        assert_eq!(outcome.source, ScheduleSource::Cache);

        let (fetcher, _) = FakeFetcher::new(Some(vec![entry(1, 10), entry(2, 20)]));
        let mut cache = ScheduleCache::new(dir.path().join("cache"), fetcher);
        cache.get_or_load("2026miket", "Kettering").await.unwrap();
        let outcome = cache.refresh("2026miket", "Kettering").await.unwrap();
        assert_eq!(outcome.source, ScheduleSource::Api);
        assert_eq!(outcome.match_count, 2);

        cache.invalidate();
        let outcome = cache.get_or_load("2026miket", "Kettering").await.unwrap();
        assert_eq!(outcome.source, ScheduleSource::Cache);
        assert_eq!(outcome.match_count, 2);
    }

    #[tokio::test]
    async fn test_offline_refresh_keeps_cache_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("matches.json");
        std::fs::write(&file, TBA_FILE).unwrap();

        let mut cache = ScheduleCache::offline(dir.path().join("cache"));
        cache.import_file(&file, "2026miket", "Kettering").unwrap();
        assert!(cache.refresh("2026miket", "Kettering").await.is_err());
        assert!(cache.is_cached("2026miket"));
    }

    #[tokio::test]
    async fn test_offline_cache_never_fetches() {
        let dir = TempDir::new().unwrap();
        let mut cache = ScheduleCache::offline(dir.path());
        let err = cache.get_or_load("2026miket", "").await.unwrap_err();
        assert!(matches!(err, Error::ScheduleUnavailable(_)));
    }

    #[test]
    fn test_import_file_and_delete() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("matches.json");
        std::fs::write(&file, TBA_FILE).unwrap();

        let mut cache = ScheduleCache::offline(dir.path().join("cache"));
        let outcome = cache.import_file(&file, "2026mitvc", "Traverse City").unwrap();
        assert_eq!(outcome.source, ScheduleSource::File);
        assert_eq!(outcome.message(), "Imported 1 matches from file");
        assert_eq!(cache.cached_events().unwrap(), vec!["2026mitvc"]);

        cache.delete_cached("2026mitvc").unwrap();
        assert!(cache.current().is_none());
        assert!(!cache.is_cached("2026mitvc"));
        assert!(cache.cached_events().unwrap().is_empty());
        // Deleting again is fine
        cache.delete_cached("2026mitvc").unwrap();
    }

    #[test]
    fn test_import_rejects_empty_schedule() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("matches.json");
        std::fs::write(&file, "[]").unwrap();

        let mut cache = ScheduleCache::offline(dir.path());
        assert!(cache.import_file(&file, "2026mitvc", "").is_err());
        assert!(cache.current().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_cache_file_falls_through() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("2026miket_schedule.json"), "{oops").unwrap();

        let (fetcher, calls) = FakeFetcher::new(Some(vec![entry(1, 10)]));
        let mut cache = ScheduleCache::new(dir.path(), fetcher);
        let outcome = cache.get_or_load("2026miket", "").await.unwrap();
        assert_eq!(outcome.source, ScheduleSource::Api);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_code_validation() {
        let dir = TempDir::new().unwrap();
        let mut cache = ScheduleCache::offline(dir.path());
        assert!(!cache.is_cached("../etc"));
        assert!(cache.delete_cached("a/b").is_err());
        assert!(cache.delete_cached("").is_err());
    }
}
