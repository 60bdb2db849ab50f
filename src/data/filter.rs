use super::model::{BySchool, EnvironmentRecord, GrowthRecord};
use crate::config::StudyConfig;

/// Label of the "every school" entry in the selector.
pub const ALL_SCHOOLS_LABEL: &str = "전체";

// ---------------------------------------------------------------------------
// School selector
// ---------------------------------------------------------------------------

/// Which schools the current view shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SchoolSelection {
    #[default]
    All,
    School(String),
}

impl SchoolSelection {
    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_SCHOOLS_LABEL,
            Self::School(name) => name,
        }
    }

    pub fn includes(&self, school: &str) -> bool {
        match self {
            Self::All => true,
            Self::School(name) => name == school,
        }
    }
}

/// Selected schools' records in configuration order. Schools without loaded
/// records are skipped.
pub fn selected<'a, T>(
    by_school: &'a BySchool<T>,
    config: &'a StudyConfig,
    selection: &SchoolSelection,
) -> Vec<(&'a str, &'a [T])> {
    config
        .schools()
        .iter()
        .filter(|s| selection.includes(&s.name))
        .filter_map(|s| Some((s.name.as_str(), by_school.get(&s.name)?.as_slice())))
        .collect()
}

/// One table of every selected sensor reading, sorted by time. Readings with
/// equal timestamps keep configuration order.
pub fn combined_environment(
    env: &BySchool<EnvironmentRecord>,
    config: &StudyConfig,
    selection: &SchoolSelection,
) -> Vec<EnvironmentRecord> {
    let mut rows: Vec<EnvironmentRecord> = selected(env, config, selection)
        .into_iter()
        .flat_map(|(_, records)| records.iter().cloned())
        .collect();
    rows.sort_by_key(|r| r.time);
    rows
}

/// One table of every selected growth record, in configuration order.
pub fn combined_growth(
    growth: &BySchool<GrowthRecord>,
    config: &StudyConfig,
    selection: &SchoolSelection,
) -> Vec<GrowthRecord> {
    selected(growth, config, selection)
        .into_iter()
        .flat_map(|(_, records)| records.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(school: &str, hour: u32) -> EnvironmentRecord {
        EnvironmentRecord {
            time: NaiveDate::from_ymd_opt(2025, 5, 26).unwrap().and_hms_opt(hour, 0, 0).unwrap(),
            temperature: 15.0,
            humidity: 60.0,
            ph: 6.0,
            ec: 1.0,
            school: school.to_string(),
        }
    }

    fn env_map() -> BySchool<EnvironmentRecord> {
        let mut env = BySchool::new();
        env.insert("동산고".to_string(), vec![reading("동산고", 9), reading("동산고", 11)]);
        env.insert("송도고".to_string(), vec![reading("송도고", 10), reading("송도고", 9)]);
        env
    }

    #[test]
    fn combined_is_sorted_by_time_with_config_tiebreak() {
        let config = StudyConfig::study_default("unused");
        let rows = combined_environment(&env_map(), &config, &SchoolSelection::All);
        let order: Vec<(&str, u32)> = rows
            .iter()
            .map(|r| (r.school.as_str(), chrono::Timelike::hour(&r.time)))
            .collect();
        assert_eq!(
            order,
            [("송도고", 9), ("동산고", 9), ("송도고", 10), ("동산고", 11)]
        );
    }

    #[test]
    fn selection_restricts_to_one_school() {
        let config = StudyConfig::study_default("unused");
        let env = env_map();
        let only = SchoolSelection::School("동산고".to_string());
        let rows = combined_environment(&env, &config, &only);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.school == "동산고"));

        let parts = selected(&env, &config, &SchoolSelection::All);
        let names: Vec<&str> = parts.iter().map(|(s, _)| *s).collect();
        assert_eq!(names, ["송도고", "동산고"]);

        assert_eq!(only.label(), "동산고");
        assert_eq!(SchoolSelection::All.label(), ALL_SCHOOLS_LABEL);
    }
}
