use std::sync::Arc;

use crate::color::SchoolColors;
use crate::config::StudyConfig;
use crate::data::cache::{DataStore, LoadOutcome, Snapshot};
use crate::data::filter::SchoolSelection;
use crate::stats::Metric;

/// Top-level tabs of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    Environment,
    Growth,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Overview, Tab::Environment, Tab::Growth];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Overview => "실험 개요",
            Tab::Environment => "환경 데이터",
            Tab::Growth => "생육 결과",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub store: DataStore,

    /// Snapshot the views render from (None if loading failed outright).
    pub snapshot: Option<Arc<Snapshot>>,

    pub colors: SchoolColors,

    pub selection: SchoolSelection,

    pub tab: Tab,

    /// Metric drawn in the environment time-series chart.
    pub series_metric: Metric,

    /// Blocking error (missing data directory or workbook).
    pub fatal_error: Option<String>,

    /// Last export result, shown in the side panel.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: StudyConfig) -> Self {
        let colors = SchoolColors::new(&config);
        let mut state = Self {
            store: DataStore::new(Arc::new(config)),
            snapshot: None,
            colors,
            selection: SchoolSelection::All,
            tab: Tab::default(),
            series_metric: Metric::Temperature,
            fatal_error: None,
            status_message: None,
        };
        state.refresh();
        state
    }

    pub fn config(&self) -> &StudyConfig {
        self.store.config()
    }

    /// Pick up the current snapshot; only re-reads files that changed.
    pub fn refresh(&mut self) {
        self.apply(self.store.snapshot());
    }

    /// Discard the cache and read everything again.
    pub fn reload(&mut self) {
        self.apply(self.store.reload());
    }

    fn apply(&mut self, result: LoadOutcome) {
        match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.fatal_error = None;
            }
            Err(e) => {
                let message = e.to_string();
                // Refresh runs every few seconds; report each distinct error once.
                if self.fatal_error.as_deref() != Some(message.as_str()) {
                    log::warn!("Study data unavailable: {message}");
                }
                self.snapshot = None;
                self.fatal_error = Some(message);
            }
        }
    }
}
