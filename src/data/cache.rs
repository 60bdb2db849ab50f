use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use super::environment::{load_environment, EnvironmentLoad};
use super::error::LoadError;
use super::growth::{load_growth, GrowthLoad};
use crate::config::StudyConfig;
use crate::stats::{summarize, StudySummary};

// ---------------------------------------------------------------------------
// SourceKey – identity of the data directory's contents
// ---------------------------------------------------------------------------

/// Sorted `(name, length, modified)` of every entry in the data directory.
/// Any added, removed, resized or touched file changes the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceKey(Vec<(String, u64, Option<SystemTime>)>);

impl SourceKey {
    pub fn scan(dir: &Path) -> Result<Self, LoadError> {
        if !dir.is_dir() {
            return Err(LoadError::DirectoryNotFound(dir.to_path_buf()));
        }
        let io_err = |source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let meta = entry.metadata().map_err(io_err)?;
            entries.push((
                entry.file_name().to_string_lossy().into_owned(),
                meta.len(),
                meta.modified().ok(),
            ));
        }
        entries.sort();
        Ok(Self(entries))
    }
}

// ---------------------------------------------------------------------------
// Snapshot – one consistent view of the study data
// ---------------------------------------------------------------------------

/// Everything loaded from one state of the data directory.
#[derive(Debug)]
pub struct Snapshot {
    pub environment: EnvironmentLoad,
    pub growth: GrowthLoad,
    pub summary: StudySummary,
}

impl Snapshot {
    /// Load both sources and summarize them.
    pub fn load(config: &StudyConfig) -> Result<Self, LoadError> {
        let environment = load_environment(config)?;
        let growth = load_growth(config)?;
        let summary = summarize(config, &environment.records, &growth.records);
        Ok(Self {
            environment,
            growth,
            summary,
        })
    }

    /// Human-readable problems the views should show: per-school load
    /// failures, dropped rows, ignored sheets and sample-count surprises.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for e in self.environment.failures.values() {
            out.push(format!("환경 데이터: {e}"));
        }
        for e in self.growth.failures.values() {
            out.push(format!("생육 데이터: {e}"));
        }
        for (school, report) in self.environment.reports.iter().chain(&self.growth.reports) {
            if report.dropped() > 0 {
                out.push(format!("{school}: {report}"));
            }
        }
        for sheet in &self.growth.ignored_sheets {
            out.push(format!("시트 '{sheet}' 무시됨"));
        }
        for (school, expected, actual) in self.summary.sample_mismatches() {
            out.push(format!("{school}: 개체수 {actual} (예상 {expected})"));
        }
        out
    }

    /// Names of schools missing environment or growth data.
    pub fn missing_schools(&self) -> Vec<&str> {
        self.summary
            .schools
            .iter()
            .filter(|s| {
                !self.environment.records.contains_key(&s.school)
                    || !self.growth.records.contains_key(&s.school)
            })
            .map(|s| s.school.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// DataStore – memoized snapshot with explicit invalidation
// ---------------------------------------------------------------------------

/// Result of loading one state of the data directory. Failures are shared
/// so a cached error can be handed out repeatedly.
pub type LoadOutcome = Result<Arc<Snapshot>, Arc<LoadError>>;

#[derive(Debug)]
struct CacheEntry {
    key: SourceKey,
    outcome: LoadOutcome,
}

impl CacheEntry {
    fn lookup(entry: &Option<CacheEntry>, key: &SourceKey) -> Option<LoadOutcome> {
        entry
            .as_ref()
            .filter(|e| e.key == *key)
            .map(|e| e.outcome.clone())
    }
}

/// Owns the outcome of the last load, successful or not. Readers share it
/// through an `Arc`; a reload happens under the write lock, so nobody sees a
/// half-built snapshot.
#[derive(Debug)]
pub struct DataStore {
    config: Arc<StudyConfig>,
    current: RwLock<Option<CacheEntry>>,
    loads: AtomicUsize,
}

impl DataStore {
    pub fn new(config: Arc<StudyConfig>) -> Self {
        Self {
            config,
            current: RwLock::new(None),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Current snapshot, or the error the current directory state produced.
    /// Files are only read again once the directory changes.
    pub fn snapshot(&self) -> LoadOutcome {
        let key = SourceKey::scan(&self.config.data_dir).map_err(Arc::new)?;
        {
            let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(outcome) = CacheEntry::lookup(&current, &key) {
                return outcome;
            }
        }

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have reloaded while we waited.
        if let Some(outcome) = CacheEntry::lookup(&current, &key) {
            return outcome;
        }

        let outcome: LoadOutcome = Snapshot::load(&self.config)
            .map(Arc::new)
            .map_err(Arc::new);
        let n = self.loads.fetch_add(1, Ordering::Relaxed) + 1;
        match &outcome {
            Ok(snap) => log::info!(
                "Loaded study data (load #{n}): {} samples, {} warnings",
                snap.summary.total_samples,
                snap.warnings().len()
            ),
            Err(e) => log::error!("Failed to load study data (load #{n}): {e}"),
        }
        *current = Some(CacheEntry {
            key,
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Drop the cached outcome and load again.
    pub fn reload(&self) -> LoadOutcome {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.snapshot()
    }

    /// Number of times data was actually read from disk.
    #[cfg(test)]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}
