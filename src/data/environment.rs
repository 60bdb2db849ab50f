use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::error::LoadError;
use super::locate::{FileLocator, MatchStrategy};
use super::model::{BySchool, EnvironmentRecord, RowReport};
use crate::config::{SchoolProfile, StudyConfig};

/// Columns every sensor log must carry (matched case-insensitively).
pub const REQUIRED_COLUMNS: [&str; 5] = ["time", "temperature", "humidity", "ph", "ec"];

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Accepted timestamp layouts, tried in order.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

// ---------------------------------------------------------------------------
// Result of one environment load
// ---------------------------------------------------------------------------

/// Sensor logs for every school that loaded, plus per-school failures.
#[derive(Debug, Default)]
pub struct EnvironmentLoad {
    pub records: BySchool<EnvironmentRecord>,
    pub reports: BTreeMap<String, RowReport>,
    pub failures: BTreeMap<String, LoadError>,
}

/// Load the sensor log of every configured school.
///
/// A missing data directory is the only hard error. A school whose file is
/// missing or unusable ends up in `failures` and the others still load.
pub fn load_environment(config: &StudyConfig) -> Result<EnvironmentLoad, LoadError> {
    if !config.data_dir.is_dir() {
        return Err(LoadError::DirectoryNotFound(config.data_dir.clone()));
    }

    let mut load = EnvironmentLoad::default();
    for school in config.schools() {
        let result = locate_school_file(config, school).and_then(|path| {
            let bytes = std::fs::read(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            parse_environment(&bytes, &school.name, &path)
        });

        match result {
            Ok((records, report)) => {
                if report.dropped() > 0 {
                    log::warn!("{}: {report}", school.name);
                } else {
                    log::info!("{}: {report}", school.name);
                }
                load.records.insert(school.name.clone(), records);
                load.reports.insert(school.name.clone(), report);
            }
            Err(LoadError::DirectoryNotFound(dir)) => return Err(LoadError::DirectoryNotFound(dir)),
            Err(e) => {
                log::warn!("Environment data unavailable: {e}");
                load.failures.insert(school.name.clone(), e);
            }
        }
    }
    Ok(load)
}

/// Exact (NFC/NFD) match on `<school><suffix>` first, then any CSV whose
/// name contains the school name.
fn locate_school_file(config: &StudyConfig, school: &SchoolProfile) -> Result<PathBuf, LoadError> {
    let expected = school.environment_file(&config.env_file_suffix);
    let exact = FileLocator::new(&config.data_dir)
        .with_strategies(&MatchStrategy::EXACT)
        .find(&expected)?;
    if let Some(path) = exact {
        return Ok(path);
    }

    let fallback = FileLocator::new(&config.data_dir)
        .with_strategies(&[MatchStrategy::Contains])
        .with_extension("csv")
        .find(&school.name)?;
    match fallback {
        Some(path) => {
            log::warn!(
                "{}: '{expected}' not found, using {}",
                school.name,
                path.display()
            );
            Ok(path)
        }
        None => Err(LoadError::FileNotFound {
            school: school.name.clone(),
            expected,
        }),
    }
}

// ---------------------------------------------------------------------------
// Row model
// ---------------------------------------------------------------------------

/// Parse one sensor log. `path` is only used in error messages.
///
/// Rows with an unparseable timestamp or a non-numeric field are dropped and
/// counted in the returned [`RowReport`]. If no row survives the whole source
/// fails with [`LoadError::NoValidRows`].
pub fn parse_environment(
    bytes: &[u8],
    school: &str,
    path: &Path,
) -> Result<(Vec<EnvironmentRecord>, RowReport), LoadError> {
    let data = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let mut idx = [0usize; 5];
    for (slot, column) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
            .ok_or_else(|| LoadError::MissingColumn {
                school: school.to_string(),
                path: path.to_path_buf(),
                column: column.to_string(),
            })?;
    }
    let [time_idx, temp_idx, hum_idx, ph_idx, ec_idx] = idx;

    let mut records = Vec::new();
    let mut report = RowReport::default();

    for result in reader.records() {
        report.total += 1;
        let Ok(row) = result else {
            report.bad_values += 1;
            continue;
        };

        let Some(time) = row.get(time_idx).and_then(parse_timestamp) else {
            report.bad_timestamps += 1;
            continue;
        };

        let number = |i: usize| row.get(i).and_then(parse_number);
        match (number(temp_idx), number(hum_idx), number(ph_idx), number(ec_idx)) {
            (Some(temperature), Some(humidity), Some(ph), Some(ec)) => {
                records.push(EnvironmentRecord {
                    time,
                    temperature,
                    humidity,
                    ph,
                    ec,
                    school: school.to_string(),
                });
                report.kept += 1;
            }
            _ => report.bad_values += 1,
        }
    }

    if report.kept == 0 {
        return Err(LoadError::NoValidRows {
            school: school.to_string(),
            path: path.to_path_buf(),
            total: report.total,
        });
    }
    Ok((records, report))
}

/// Parse a timestamp in one of the layouts sensor loggers commonly emit.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|t| t.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::locate::nfd;

    const HEADER: &str = "time,temperature,humidity,ph,ec\n";

    fn config_in(dir: &Path) -> StudyConfig {
        StudyConfig::study_default(dir)
    }

    fn write_csv(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), format!("{HEADER}{body}")).unwrap();
    }

    fn write_all(dir: &Path) {
        let config = config_in(dir);
        for school in config.schools() {
            write_csv(
                dir,
                &school.environment_file(&config.env_file_suffix),
                "2025-05-26 09:00:00,14.5,71.0,6.1,1.1\n2025-05-26 10:00:00,15.5,69.0,6.3,1.3\n",
            );
        }
    }

    #[test]
    fn parses_all_schools() {
        let tmp = tempfile::tempdir().unwrap();
        write_all(tmp.path());
        let load = load_environment(&config_in(tmp.path())).unwrap();
        assert!(load.failures.is_empty());
        assert_eq!(load.records.len(), 4);
        let rows = &load.records["하늘고"];
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.school == "하늘고"));
        assert_eq!(rows[1].temperature, 15.5);
        assert_eq!(
            rows[0].time,
            NaiveDate::from_ymd_opt(2025, 5, 26).unwrap().and_hms_opt(9, 0, 0).unwrap()
        );
    }

    #[test]
    fn dropped_plus_kept_equals_total() {
        let body = "\
2025-05-26 09:00:00,14.5,71.0,6.1,1.1
not a time,14.5,71.0,6.1,1.1
2025-05-26 11:00,15.0,70.0,6.2,1.2
,14.0,70.0,6.2,1.2
2025-05-26 12:00:00,warm,70.0,6.2,1.2
2025/05/26 13:00:00,16.0,68.0,6.0,1.0
";
        let (records, report) =
            parse_environment(format!("{HEADER}{body}").as_bytes(), "송도고", Path::new("t.csv")).unwrap();
        assert_eq!(report.total, 6);
        assert_eq!(report.kept, 3);
        assert_eq!(report.bad_timestamps, 2);
        assert_eq!(report.bad_values, 1);
        assert_eq!(report.kept + report.dropped(), report.total);
        assert_eq!(records.len(), report.kept);
    }

    #[test]
    fn tolerates_bom_and_header_case() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"Time, Temperature,Humidity,pH,EC\n2025-05-26T09:00:00,14.5,71,6.1,1.1\n");
        let (records, report) = parse_environment(&bytes, "아라고", Path::new("t.csv")).unwrap();
        assert_eq!(report.kept, 1);
        assert_eq!(records[0].ph, 6.1);
    }

    #[test]
    fn missing_column_is_reported() {
        let bytes = b"time,temperature,humidity,ec\n2025-05-26 09:00:00,14.5,71,1.1\n";
        let err = parse_environment(bytes, "아라고", Path::new("t.csv")).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column, .. } if column == "ph"));
    }

    #[test]
    fn all_rows_bad_escalates() {
        let body = "yesterday,1,2,3,4\nnever,1,2,3,4\n";
        let err = parse_environment(format!("{HEADER}{body}").as_bytes(), "동산고", Path::new("t.csv"))
            .unwrap_err();
        assert!(matches!(err, LoadError::NoValidRows { total: 2, .. }));
    }

    #[test]
    fn missing_school_file_is_partial_failure() {
        let tmp = tempfile::tempdir().unwrap();
        write_all(tmp.path());
        let config = config_in(tmp.path());
        std::fs::remove_file(tmp.path().join("아라고_환경데이터.csv")).unwrap();

        let load = load_environment(&config).unwrap();
        assert_eq!(load.records.len(), 3);
        assert!(matches!(
            load.failures.get("아라고"),
            Some(LoadError::FileNotFound { expected, .. }) if expected == "아라고_환경데이터.csv"
        ));
    }

    #[test]
    fn decomposed_names_and_fallback_are_found() {
        let tmp = tempfile::tempdir().unwrap();
        let row = "2025-05-26 09:00:00,14.5,71.0,6.1,1.1\n";
        write_csv(tmp.path(), &nfd("송도고_환경데이터.csv"), row);
        write_csv(tmp.path(), &nfd("하늘고_환경데이터.csv"), row);
        write_csv(tmp.path(), &nfd("아라고_환경데이터.csv"), row);
        write_csv(tmp.path(), "sensor_동산고_2025.csv", row);

        let load = load_environment(&config_in(tmp.path())).unwrap();
        assert!(load.failures.is_empty(), "{:?}", load.failures);
        assert_eq!(load.records["동산고"].len(), 1);
        assert_eq!(load.records["송도고"][0].school, "송도고");
    }

    #[test]
    fn missing_directory_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(&tmp.path().join("gone"));
        assert!(matches!(
            load_environment(&config),
            Err(LoadError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn timestamp_layouts() {
        assert!(parse_timestamp("2025-05-26 09:00:00.250").is_some());
        assert!(parse_timestamp("2025-05-26T09:00:00+09:00").is_some());
        assert_eq!(
            parse_timestamp("2025-05-26"),
            NaiveDate::from_ymd_opt(2025, 5, 26).unwrap().and_hms_opt(0, 0, 0)
        );
        assert!(parse_timestamp("26/05/2025").is_none());
    }
}
