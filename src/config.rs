use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

/// Number of schools taking part in the study.
pub const SCHOOL_COUNT: usize = 4;

/// Suffix appended to a school name to form its sensor-log file name.
pub const ENV_FILE_SUFFIX: &str = "_환경데이터.csv";

/// File name of the workbook holding one growth sheet per school.
pub const GROWTH_WORKBOOK: &str = "4개교_생육결과데이터.xlsx";

/// Env var overriding the data directory.
pub const DATA_DIR_VAR: &str = "EC_DASHBOARD_DATA_DIR";

/// Env var pointing at a font file with Hangul glyphs.
pub const FONT_VAR: &str = "EC_DASHBOARD_FONT";

// ---------------------------------------------------------------------------
// SchoolProfile – one row of the fixed school table
// ---------------------------------------------------------------------------

/// Static description of one participating school.
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolProfile {
    pub name: String,
    /// Target nutrient-solution EC in dS/m.
    pub target_ec: f64,
    /// Display colour token, `#rrggbb` in the default table.
    pub color: String,
    pub expected_samples: Option<usize>,
}

impl SchoolProfile {
    pub fn new(name: &str, target_ec: f64, color: &str) -> Self {
        Self {
            name: name.to_string(),
            target_ec,
            color: color.to_string(),
            expected_samples: None,
        }
    }

    #[cfg(test)]
    pub fn with_expected_samples(mut self, n: usize) -> Self {
        self.expected_samples = Some(n);
        self
    }

    /// File name of this school's sensor log.
    pub fn environment_file(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("expected {expected} schools, got {actual}")]
    SchoolCount { expected: usize, actual: usize },
    #[error("duplicate school name '{0}'")]
    DuplicateName(String),
    #[error("school '{school}' has invalid target EC {ec}")]
    InvalidEc { school: String, ec: f64 },
    #[error("schools '{first}' and '{second}' share target EC {ec}")]
    DuplicateEc { first: String, second: String, ec: f64 },
}

// ---------------------------------------------------------------------------
// StudyConfig – everything the loaders and aggregator need
// ---------------------------------------------------------------------------

/// Immutable study configuration. Passed by reference into loaders, the
/// aggregator and the UI; school order is significant (tie-breaks follow it).
#[derive(Debug, Clone)]
pub struct StudyConfig {
    schools: Vec<SchoolProfile>,
    pub data_dir: PathBuf,
    pub env_file_suffix: String,
    pub growth_workbook: String,
}

impl StudyConfig {
    /// Validate and build a configuration.
    pub fn new(schools: Vec<SchoolProfile>, data_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        validate(&schools)?;
        Ok(Self {
            schools,
            data_dir: data_dir.into(),
            env_file_suffix: ENV_FILE_SUFFIX.to_string(),
            growth_workbook: GROWTH_WORKBOOK.to_string(),
        })
    }

    /// The four schools of the polar-plant EC study.
    pub fn study_default(data_dir: impl Into<PathBuf>) -> Self {
        let schools = vec![
            SchoolProfile::new("송도고", 1.0, "#1f77b4"),
            SchoolProfile::new("하늘고", 2.0, "#2ca02c"),
            SchoolProfile::new("아라고", 4.0, "#ff7f0e"),
            SchoolProfile::new("동산고", 8.0, "#d62728"),
        ];
        // Constant table; checked by the same rules as `new` in debug builds and tests.
        debug_assert_eq!(validate(&schools), Ok(()));
        Self {
            schools,
            data_dir: data_dir.into(),
            env_file_suffix: ENV_FILE_SUFFIX.to_string(),
            growth_workbook: GROWTH_WORKBOOK.to_string(),
        }
    }

    /// Default configuration with the data directory taken from the first CLI
    /// argument, then `EC_DASHBOARD_DATA_DIR`, then `./data`.
    pub fn from_env() -> Self {
        let data_dir = std::env::args_os()
            .nth(1)
            .map(PathBuf::from)
            .or_else(|| std::env::var_os(DATA_DIR_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("data"));
        log::info!("Using data directory {}", data_dir.display());
        Self::study_default(data_dir)
    }

    pub fn schools(&self) -> &[SchoolProfile] {
        &self.schools
    }
}

/// Exactly `SCHOOL_COUNT` schools with distinct names and distinct positive
/// target ECs.
fn validate(schools: &[SchoolProfile]) -> Result<(), ConfigError> {
    if schools.len() != SCHOOL_COUNT {
        return Err(ConfigError::SchoolCount {
            expected: SCHOOL_COUNT,
            actual: schools.len(),
        });
    }

    let mut names = BTreeSet::new();
    for (i, school) in schools.iter().enumerate() {
        if !names.insert(school.name.as_str()) {
            return Err(ConfigError::DuplicateName(school.name.clone()));
        }
        if !school.target_ec.is_finite() || school.target_ec <= 0.0 {
            return Err(ConfigError::InvalidEc {
                school: school.name.clone(),
                ec: school.target_ec,
            });
        }
        if let Some(other) = schools[..i].iter().find(|s| s.target_ec == school.target_ec) {
            return Err(ConfigError::DuplicateEc {
                first: other.name.clone(),
                second: school.name.clone(),
                ec: school.target_ec,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic() -> Vec<SchoolProfile> {
        vec![
            SchoolProfile::new("A", 0.5, "#000000"),
            SchoolProfile::new("B", 1.5, "#111111"),
            SchoolProfile::new("C", 3.0, "#222222"),
            SchoolProfile::new("D", 6.0, "#333333"),
        ]
    }

    #[test]
    fn default_table_passes_validation() {
        let default = StudyConfig::study_default("data");
        assert_eq!(validate(default.schools()), Ok(()));
        let validated = StudyConfig::new(default.schools().to_vec(), "data").unwrap();
        assert_eq!(validated.schools().len(), SCHOOL_COUNT);
        assert_eq!(validated.schools()[2].name, "아라고");
        assert_eq!(validated.schools()[3].target_ec, 8.0);
    }

    #[test]
    fn rejects_wrong_school_count() {
        let mut schools = synthetic();
        schools.pop();
        assert_eq!(
            StudyConfig::new(schools, "data").unwrap_err(),
            ConfigError::SchoolCount { expected: 4, actual: 3 }
        );
    }

    #[test]
    fn rejects_duplicate_ec_and_name() {
        let mut schools = synthetic();
        schools[3].target_ec = 0.5;
        assert!(matches!(
            StudyConfig::new(schools, "data"),
            Err(ConfigError::DuplicateEc { .. })
        ));

        let mut schools = synthetic();
        schools[2].name = "A".to_string();
        assert_eq!(
            StudyConfig::new(schools, "data").unwrap_err(),
            ConfigError::DuplicateName("A".to_string())
        );
    }

    #[test]
    fn rejects_non_positive_ec() {
        let mut schools = synthetic();
        schools[1].target_ec = 0.0;
        assert!(matches!(
            StudyConfig::new(schools, "data"),
            Err(ConfigError::InvalidEc { .. })
        ));
    }

    #[test]
    fn environment_file_name() {
        let school = SchoolProfile::new("송도고", 1.0, "#1f77b4");
        assert_eq!(school.environment_file(ENV_FILE_SUFFIX), "송도고_환경데이터.csv");
    }
}
